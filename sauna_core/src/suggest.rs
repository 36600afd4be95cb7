//! Suggested custom rituals by experience level.
//!
//! Suggestions come from a [`SuggestionProvider`]. The core ships an offline
//! preset table and a provider that reads a JSON file written by an external
//! service. Either way, a failed suggestion never modifies the ritual being
//! edited: see [`suggest_into`].

use crate::catalog::CustomRitual;
use crate::{Error, ExperienceLevel, Result, Suggestion};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source of suggested ritual settings
pub trait SuggestionProvider {
    fn suggest(&self, level: ExperienceLevel) -> Result<Suggestion>;
}

/// Built-in suggestions, no network involved
#[derive(Clone, Copy, Debug, Default)]
pub struct PresetAdvisor;

impl SuggestionProvider for PresetAdvisor {
    fn suggest(&self, level: ExperienceLevel) -> Result<Suggestion> {
        let suggestion = match level {
            ExperienceLevel::Beginner => Suggestion {
                cycles: 2,
                sauna_duration: 8,
                cold_duration: 1,
                rest_duration: 10,
                is_cold_enabled: false,
            },
            ExperienceLevel::Intermediate => Suggestion {
                cycles: 3,
                sauna_duration: 12,
                cold_duration: 2,
                rest_duration: 10,
                is_cold_enabled: true,
            },
            ExperienceLevel::Advanced => Suggestion {
                cycles: 4,
                sauna_duration: 15,
                cold_duration: 3,
                rest_duration: 8,
                is_cold_enabled: true,
            },
        };
        Ok(suggestion)
    }
}

/// Suggestion file format: one suggestion per level name
///
/// ```json
/// { "Beginner": { "cycles": 2, "saunaDuration": 8, ... }, ... }
/// ```
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct SuggestionFile(HashMap<String, Suggestion>);

/// Reads suggestions produced by an external advisor
#[derive(Clone, Debug)]
pub struct FileAdvisor {
    path: PathBuf,
}

impl FileAdvisor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SuggestionProvider for FileAdvisor {
    fn suggest(&self, level: ExperienceLevel) -> Result<Suggestion> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Suggestion(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let SuggestionFile(mut by_level) = serde_json::from_str(&contents).map_err(|e| {
            Error::Suggestion(format!("cannot parse {}: {}", self.path.display(), e))
        })?;

        let key = by_level
            .keys()
            .find(|k| ExperienceLevel::parse(k) == Some(level))
            .cloned()
            .ok_or_else(|| Error::Suggestion(format!("no suggestion for {}", level)))?;

        let suggestion = by_level
            .remove(&key)
            .ok_or_else(|| Error::Suggestion(format!("no suggestion for {}", level)))?;

        tracing::info!("Loaded {} suggestion from {:?}", level, self.path);
        Ok(suggestion)
    }
}

/// Ask a provider and apply the answer to a ritual
///
/// On any failure the ritual keeps its previous settings and the error is
/// returned for display.
pub fn suggest_into(
    provider: &dyn SuggestionProvider,
    level: ExperienceLevel,
    ritual: &mut CustomRitual,
) -> Result<()> {
    let suggestion = provider.suggest(level).map_err(|e| {
        tracing::warn!("Suggestion for {} failed: {}", level, e);
        e
    })?;
    ritual.apply_suggestion(&suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    impl SuggestionProvider for FailingProvider {
        fn suggest(&self, _level: ExperienceLevel) -> Result<Suggestion> {
            Err(Error::Suggestion("service unavailable".into()))
        }
    }

    #[test]
    fn test_presets_are_applicable() {
        for level in [
            ExperienceLevel::Beginner,
            ExperienceLevel::Intermediate,
            ExperienceLevel::Advanced,
        ] {
            let mut ritual = CustomRitual::default();
            suggest_into(&PresetAdvisor, level, &mut ritual).unwrap();
            assert!(ritual.build(None).is_ok());
        }
    }

    #[test]
    fn test_failure_keeps_previous_settings() {
        let mut ritual = CustomRitual::default();
        ritual.cycles = 5;
        let before = ritual.clone();

        let result = suggest_into(&FailingProvider, ExperienceLevel::Advanced, &mut ritual);
        assert!(matches!(result, Err(Error::Suggestion(_))));
        assert_eq!(ritual, before);
    }

    #[test]
    fn test_file_advisor_reads_level() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("suggestions.json");
        std::fs::write(
            &path,
            r#"{
                "beginner": {"cycles": 1, "saunaDuration": 6, "coldDuration": 1,
                             "restDuration": 5, "isColdEnabled": false},
                "Advanced": {"cycles": 5, "saunaDuration": 18, "coldDuration": 4,
                             "restDuration": 12, "isColdEnabled": true}
            }"#,
        )
        .unwrap();

        let advisor = FileAdvisor::new(&path);
        let beginner = advisor.suggest(ExperienceLevel::Beginner).unwrap();
        assert_eq!(beginner.sauna_duration, 6);
        assert!(!beginner.is_cold_enabled);

        let advanced = advisor.suggest(ExperienceLevel::Advanced).unwrap();
        assert_eq!(advanced.cycles, 5);

        assert!(advisor.suggest(ExperienceLevel::Intermediate).is_err());
    }

    #[test]
    fn test_file_advisor_missing_or_malformed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = FileAdvisor::new(temp_dir.path().join("nope.json"));
        assert!(matches!(
            missing.suggest(ExperienceLevel::Beginner),
            Err(Error::Suggestion(_))
        ));

        let bad_path = temp_dir.path().join("bad.json");
        std::fs::write(&bad_path, "{ invalid json }").unwrap();
        let mut ritual = CustomRitual::default();
        let before = ritual.clone();
        assert!(suggest_into(&FileAdvisor::new(&bad_path), ExperienceLevel::Beginner, &mut ritual).is_err());
        assert_eq!(ritual, before);
    }

    #[test]
    fn test_file_advisor_oversized_suggestion_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("suggestions.json");
        std::fs::write(
            &path,
            r#"{"beginner": {"cycles": 5000000, "saunaDuration": 80000000,
                             "coldDuration": 1, "restDuration": 5,
                             "isColdEnabled": true}}"#,
        )
        .unwrap();

        let mut ritual = CustomRitual::default();
        let before = ritual.clone();
        let result = suggest_into(&FileAdvisor::new(&path), ExperienceLevel::Beginner, &mut ritual);
        assert!(matches!(result, Err(Error::Suggestion(_))));
        assert_eq!(ritual, before);
    }
}
