//! Built-in catalog of crosswalk dilemmas.
//!
//! Six encounters, each pairing two groups of characters, plus the split a
//! reference population produced on the same dilemma. Used whenever the
//! configuration does not list its own scenarios.

use crosswalk_types::{CharacterGroup, ReferenceSplit};

use crate::config::ScenarioConfig;

/// Build a character group from borrowed strings.
fn group(label: &str, subtitle: &str, members: &[&str]) -> CharacterGroup {
    CharacterGroup {
        label: label.to_owned(),
        subtitle: subtitle.to_owned(),
        members: members.iter().map(|m| (*m).to_owned()).collect(),
    }
}

fn scenario(
    title: &str,
    left: CharacterGroup,
    right: CharacterGroup,
    left_percent: f64,
    right_percent: f64,
) -> ScenarioConfig {
    ScenarioConfig {
        title: title.to_owned(),
        left,
        right,
        activation_delay_ms: None,
        initial_position: None,
        trigger_extent: None,
        reference: Some(ReferenceSplit {
            left_percent,
            right_percent,
        }),
    }
}

/// Return the six built-in dilemmas in play order.
pub fn default_catalog() -> Vec<ScenarioConfig> {
    vec![
        scenario(
            "Law-abiding vs jaywalking",
            group(
                "Left side",
                "Pedestrians obeying the signal",
                &["2 elderly men", "1 elderly woman", "1 adult man"],
            ),
            group(
                "Right side",
                "Pedestrians crossing on red",
                &["2 men", "1 woman", "1 child"],
            ),
            16.0,
            84.0,
        ),
        scenario(
            "Animals vs humans",
            group("Left side", "Animal lives", &["3 cats", "2 dogs"]),
            group(
                "Right side",
                "Human lives",
                &["2 large women", "2 executives", "1 homeless person"],
            ),
            92.9,
            7.1,
        ),
        scenario(
            "Girl in the vehicle vs boy on the road",
            group(
                "Left side",
                "Hit the concrete barrier",
                &["Inside the vehicle", "1 girl would be harmed"],
            ),
            group("Right side", "Crosswalk", &["1 boy would be harmed"]),
            23.0,
            77.0,
        ),
        scenario(
            "Elderly vs young",
            group(
                "Left side",
                "Elderly pedestrians",
                &["2 elderly men", "1 elderly woman"],
            ),
            group(
                "Right side",
                "Young pedestrians",
                &["1 girl", "1 boy", "1 man"],
            ),
            99.0,
            1.0,
        ),
        scenario(
            "Athletes in the vehicle vs pedestrians",
            group(
                "Left side",
                "Athletes (in the vehicle)",
                &["2 male athletes", "2 female athletes"],
            ),
            group(
                "Right side",
                "Pedestrians",
                &["1 man", "2 large women", "1 large man"],
            ),
            6.0,
            94.0,
        ),
        scenario(
            "Five vs two",
            group(
                "Left side",
                "Majority (5 people)",
                &["2 elderly women", "2 criminals", "1 boy"],
            ),
            group(
                "Right side",
                "Minority (2 people)",
                &["1 elderly woman", "1 criminal"],
            ),
            4.0,
            96.0,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_six_scenarios() {
        assert_eq!(default_catalog().len(), 6);
    }

    #[test]
    fn every_scenario_has_reference_split_summing_to_hundred() {
        for scenario in default_catalog() {
            let split = scenario.reference;
            assert!(split.is_some(), "{} has no reference", scenario.title);
            if let Some(split) = split {
                let total = split.left_percent + split.right_percent;
                assert!((total - 100.0).abs() < 1e-9, "{} sums to {total}", scenario.title);
            }
        }
    }

    #[test]
    fn every_group_has_members() {
        for scenario in default_catalog() {
            assert!(!scenario.left.members.is_empty());
            assert!(!scenario.right.members.is_empty());
        }
    }
}
