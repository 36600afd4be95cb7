//! Built-in ritual protocols and the custom ritual builder.
//!
//! The built-in catalog mirrors the four rituals shipped with the app; custom
//! rituals are assembled from per-stage settings and optionally seeded from a
//! [`Suggestion`].

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::ops::RangeInclusive;
use uuid::Uuid;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// An ordered collection of protocols
#[derive(Clone, Debug)]
pub struct Catalog {
    pub protocols: Vec<Protocol>,
}

impl Catalog {
    /// Look up a protocol by id
    pub fn get(&self, id: &str) -> Option<&Protocol> {
        self.protocols.iter().find(|p| p.id == id)
    }

    /// All protocols serving the given goal, in catalog order
    pub fn for_goal(&self, goal: Goal) -> impl Iterator<Item = &Protocol> {
        self.protocols.iter().filter(move |p| p.goal == goal)
    }

    /// Validate the catalog
    ///
    /// Returns every problem found: invalid protocols and duplicate ids.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for protocol in &self.protocols {
            if !seen.insert(protocol.id.as_str()) {
                errors.push(format!("Duplicate protocol id '{}'", protocol.id));
            }
            errors.extend(protocol.validate());
        }

        errors
    }
}

/// Builds the default catalog of built-in rituals
pub fn build_default_catalog() -> Catalog {
    let protocol = |id: &str, name: &str, description: &str, cycles, minutes: [u32; 3], goal| {
        Protocol {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            cycles,
            stages: vec![
                Stage::minutes(StageKind::Heat, minutes[0]),
                Stage::minutes(StageKind::Cold, minutes[1]),
                Stage::minutes(StageKind::Rest, minutes[2]),
            ],
            goal,
        }
    };

    Catalog {
        protocols: vec![
            protocol(
                "relax_1",
                "Gentle Unwind",
                "Short heat rounds with a brief cool-down. A soft start to the evening.",
                2,
                [10, 1, 10],
                Goal::Relax,
            ),
            protocol(
                "relax_2",
                "Deep Calm",
                "Longer heat and long rests to settle the nervous system.",
                3,
                [15, 2, 15],
                Goal::Relax,
            ),
            protocol(
                "perf_1",
                "Contrast Primer",
                "Moderate heat with firm cold exposure for alertness.",
                3,
                [12, 3, 8],
                Goal::Performance,
            ),
            protocol(
                "perf_2",
                "Peak Recovery",
                "Four full contrast rounds for post-training recovery.",
                4,
                [15, 4, 10],
                Goal::Performance,
            ),
        ],
    }
}

// ============================================================================
// Custom Rituals
// ============================================================================

/// Name used when a custom ritual is left unnamed
pub const CUSTOM_RITUAL_DEFAULT_NAME: &str = "Custom Ritual";

const CUSTOM_RITUAL_DESCRIPTION: &str = "A personalized sauna ritual.";

/// Cycle counts the custom ritual editor accepts
pub const CUSTOM_CYCLES_RANGE: RangeInclusive<u32> = 1..=10;

/// Stage lengths the custom ritual editor accepts, in minutes
pub const CUSTOM_MINUTES_RANGE: RangeInclusive<u32> = 1..=60;

fn check_range(what: &str, value: u32, range: &RangeInclusive<u32>) -> std::result::Result<(), String> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "{} {} outside {}..={}",
            what,
            value,
            range.start(),
            range.end()
        ))
    }
}

/// One stage row of the custom ritual editor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageSetting {
    pub enabled: bool,
    pub minutes: u32,
}

impl StageSetting {
    pub fn on(minutes: u32) -> Self {
        Self {
            enabled: true,
            minutes,
        }
    }
}

/// Editable custom ritual settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomRitual {
    pub name: String,
    pub cycles: u32,
    pub heat: StageSetting,
    pub cold: StageSetting,
    pub rest: StageSetting,
}

impl Default for CustomRitual {
    fn default() -> Self {
        Self {
            name: CUSTOM_RITUAL_DEFAULT_NAME.into(),
            cycles: 3,
            heat: StageSetting::on(15),
            cold: StageSetting::on(2),
            rest: StageSetting::on(10),
        }
    }
}

impl CustomRitual {
    /// Overwrite the settings with a suggestion
    ///
    /// A suggestion outside the editor ranges is rejected and the current
    /// settings are left exactly as they were. The cold length only has to
    /// be in range when cold is enabled.
    pub fn apply_suggestion(&mut self, suggestion: &Suggestion) -> Result<()> {
        let mut checks = vec![
            check_range("cycles", suggestion.cycles, &CUSTOM_CYCLES_RANGE),
            check_range("sauna minutes", suggestion.sauna_duration, &CUSTOM_MINUTES_RANGE),
            check_range("rest minutes", suggestion.rest_duration, &CUSTOM_MINUTES_RANGE),
        ];
        if suggestion.is_cold_enabled {
            checks.push(check_range(
                "cold minutes",
                suggestion.cold_duration,
                &CUSTOM_MINUTES_RANGE,
            ));
        }
        if let Some(problem) = checks.into_iter().find_map(|c| c.err()) {
            return Err(Error::Suggestion(format!("suggested {}", problem)));
        }

        self.cycles = suggestion.cycles;
        self.heat.minutes = suggestion.sauna_duration;
        self.cold = StageSetting {
            enabled: suggestion.is_cold_enabled,
            minutes: suggestion
                .cold_duration
                .clamp(*CUSTOM_MINUTES_RANGE.start(), *CUSTOM_MINUTES_RANGE.end()),
        };
        self.rest.minutes = suggestion.rest_duration;

        tracing::info!(
            "Applied suggestion: {} cycles, sauna {}m, cold {}m ({}), rest {}m",
            self.cycles,
            self.heat.minutes,
            self.cold.minutes,
            if self.cold.enabled { "on" } else { "off" },
            self.rest.minutes
        );
        Ok(())
    }

    /// Build a runnable protocol from the current settings
    ///
    /// Enabled stages appear in sauna, cold, rest order. The goal falls back
    /// to [`Goal::Relax`] when the user has not picked one.
    pub fn build(&self, goal: Option<Goal>) -> Result<Protocol> {
        let mut problems: Vec<String> = [
            ("sauna minutes", self.heat),
            ("cold minutes", self.cold),
            ("rest minutes", self.rest),
        ]
        .into_iter()
        .filter(|(_, setting)| setting.enabled)
        .filter_map(|(what, setting)| {
            check_range(what, setting.minutes, &CUSTOM_MINUTES_RANGE).err()
        })
        .collect();
        if let Err(problem) = check_range("cycles", self.cycles, &CUSTOM_CYCLES_RANGE) {
            problems.insert(0, problem);
        }
        if !problems.is_empty() {
            return Err(Error::InvalidProtocol(problems.join("; ")));
        }

        let stages: Vec<Stage> = [
            (StageKind::Heat, self.heat),
            (StageKind::Cold, self.cold),
            (StageKind::Rest, self.rest),
        ]
        .into_iter()
        .filter(|(_, setting)| setting.enabled)
        .map(|(kind, setting)| Stage::minutes(kind, setting.minutes))
        .collect();

        if stages.is_empty() {
            return Err(Error::InvalidProtocol(
                "custom ritual needs at least one enabled stage".into(),
            ));
        }

        let name = if self.name.trim().is_empty() {
            CUSTOM_RITUAL_DEFAULT_NAME.to_string()
        } else {
            self.name.trim().to_string()
        };

        let protocol = Protocol {
            id: format!("custom-{}", Uuid::new_v4().simple()),
            name,
            description: CUSTOM_RITUAL_DESCRIPTION.into(),
            cycles: self.cycles,
            stages,
            goal: goal.unwrap_or(Goal::Relax),
        };

        let errors = protocol.validate();
        if !errors.is_empty() {
            return Err(Error::InvalidProtocol(errors.join("; ")));
        }

        Ok(protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.protocols.len(), 4);
        assert!(catalog.get("relax_2").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_default_catalog_validates() {
        let errors = default_catalog().validate();
        assert!(errors.is_empty(), "Catalog errors: {:?}", errors);
    }

    #[test]
    fn test_duplicate_ids_reported() {
        let mut catalog = build_default_catalog();
        let copy = catalog.protocols[0].clone();
        catalog.protocols.push(copy);

        let errors = catalog.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("relax_1"));
    }

    #[test]
    fn test_for_goal_filters() {
        let catalog = default_catalog();
        let perf: Vec<_> = catalog.for_goal(Goal::Performance).map(|p| &p.id).collect();
        assert_eq!(perf, vec!["perf_1", "perf_2"]);
    }

    #[test]
    fn test_relax_1_matches_reference_layout() {
        let protocol = default_catalog().get("relax_1").unwrap();
        assert_eq!(protocol.cycles, 2);
        assert_eq!(protocol.stages[0], Stage::new(StageKind::Heat, 600));
        assert_eq!(protocol.stages[1], Stage::new(StageKind::Cold, 60));
        assert_eq!(protocol.stages[2], Stage::new(StageKind::Rest, 600));
    }

    #[test]
    fn test_custom_ritual_defaults_build() {
        let protocol = CustomRitual::default().build(None).unwrap();

        assert!(protocol.id.starts_with("custom-"));
        assert_eq!(protocol.name, CUSTOM_RITUAL_DEFAULT_NAME);
        assert_eq!(protocol.cycles, 3);
        assert_eq!(protocol.goal, Goal::Relax);
        assert_eq!(
            protocol.stages,
            vec![
                Stage::new(StageKind::Heat, 900),
                Stage::new(StageKind::Cold, 120),
                Stage::new(StageKind::Rest, 600),
            ]
        );
    }

    #[test]
    fn test_custom_ritual_skips_disabled_stages() {
        let mut ritual = CustomRitual {
            name: "  Evening  ".into(),
            ..CustomRitual::default()
        };
        ritual.cold.enabled = false;

        let protocol = ritual.build(Some(Goal::Performance)).unwrap();
        assert_eq!(protocol.name, "Evening");
        assert_eq!(protocol.goal, Goal::Performance);
        let kinds: Vec<_> = protocol.stages.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StageKind::Heat, StageKind::Rest]);
    }

    #[test]
    fn test_custom_ritual_without_stages_fails() {
        let mut ritual = CustomRitual::default();
        ritual.heat.enabled = false;
        ritual.cold.enabled = false;
        ritual.rest.enabled = false;

        assert!(matches!(ritual.build(None), Err(Error::InvalidProtocol(_))));
    }

    #[test]
    fn test_apply_suggestion() {
        let mut ritual = CustomRitual::default();
        ritual
            .apply_suggestion(&Suggestion {
                cycles: 2,
                sauna_duration: 8,
                cold_duration: 1,
                rest_duration: 12,
                is_cold_enabled: false,
            })
            .unwrap();

        assert_eq!(ritual.cycles, 2);
        assert_eq!(ritual.heat.minutes, 8);
        assert!(!ritual.cold.enabled);
        assert_eq!(ritual.rest.minutes, 12);
    }

    #[test]
    fn test_bad_suggestion_leaves_ritual_untouched() {
        let mut ritual = CustomRitual::default();
        let before = ritual.clone();

        let result = ritual.apply_suggestion(&Suggestion {
            cycles: 0,
            sauna_duration: 8,
            cold_duration: 1,
            rest_duration: 12,
            is_cold_enabled: true,
        });

        assert!(matches!(result, Err(Error::Suggestion(_))));
        assert_eq!(ritual, before);
    }

    #[test]
    fn test_oversized_suggestion_leaves_ritual_untouched() {
        let mut ritual = CustomRitual::default();
        let before = ritual.clone();

        let huge_stage = ritual.apply_suggestion(&Suggestion {
            cycles: 3,
            sauna_duration: 80_000_000,
            cold_duration: 1,
            rest_duration: 12,
            is_cold_enabled: true,
        });
        assert!(matches!(huge_stage, Err(Error::Suggestion(_))));

        let huge_cycles = ritual.apply_suggestion(&Suggestion {
            cycles: 5_000_000,
            sauna_duration: 8,
            cold_duration: 1,
            rest_duration: 12,
            is_cold_enabled: true,
        });
        assert!(matches!(huge_cycles, Err(Error::Suggestion(_))));

        assert_eq!(ritual, before);
        assert!(ritual.build(None).is_ok());
    }

    #[test]
    fn test_disabled_cold_length_is_not_checked() {
        let mut ritual = CustomRitual::default();
        ritual
            .apply_suggestion(&Suggestion {
                cycles: 2,
                sauna_duration: 8,
                cold_duration: 0,
                rest_duration: 10,
                is_cold_enabled: false,
            })
            .unwrap();

        assert!(!ritual.cold.enabled);
        assert_eq!(ritual.cold.minutes, 1);
    }

    #[test]
    fn test_build_rejects_out_of_range_settings() {
        let mut ritual = CustomRitual::default();
        ritual.cycles = 5_000_000;
        assert!(matches!(ritual.build(None), Err(Error::InvalidProtocol(_))));

        let mut ritual = CustomRitual::default();
        ritual.heat.minutes = 80_000_000;
        assert!(matches!(ritual.build(None), Err(Error::InvalidProtocol(_))));

        // a disabled stage may hold any length
        ritual.heat.enabled = false;
        assert!(ritual.build(None).is_ok());
    }
}
