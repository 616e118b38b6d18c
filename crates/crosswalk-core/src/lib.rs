//! Frame clock, encounter sequencing, and input gateway for the Crosswalk
//! dilemma simulation.
//!
//! A vehicle drives down a two-lane road and meets a chain of crosswalks.
//! At each one the player picks a lane; the pick is recorded as a decision.
//! This crate owns the engine that makes that work, independent of any
//! rendering or windowing layer.
//!
//! # Modules
//!
//! - [`clock`] -- Frame-rate independent tick scale and wall-clock time
//!   sources.
//! - [`config`] -- Configuration loading from `crosswalk-config.yaml` into
//!   strongly-typed structs.
//! - [`scenario`] -- The built-in catalog of six dilemmas.
//! - [`encounter`] -- One crosswalk and its lifecycle.
//! - [`vehicle`] -- Discrete lane plus eased lateral position.
//! - [`events`] -- Transitions emitted by the controller each frame.
//! - [`sequence`] -- The encounter sequence controller (the core state
//!   machine).
//! - [`gateway`] -- Normalizes keys, swipes, and taps into one signal.
//! - [`finish`] -- The finish line that ends a session.
//! - [`session`] -- The "advance one frame" entry point and render snapshot.
//! - [`player`] -- [`PlayerSource`] trait with idle and scripted players.
//! - [`runner`] -- Async frame loop driving a session to completion.
//! - [`export`] -- Decision log serialization and results summary.
//!
//! [`PlayerSource`]: player::PlayerSource

pub mod clock;
pub mod config;
pub mod encounter;
pub mod events;
pub mod export;
pub mod finish;
pub mod gateway;
pub mod player;
pub mod runner;
pub mod scenario;
pub mod sequence;
pub mod session;
pub mod vehicle;
