//! Core domain types for the SaunaFlow system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Stages and protocols (the ritual templates)
//! - Session logs (the record of a completed ritual)
//! - Goals, experience levels and AI-style suggestions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Stage Types
// ============================================================================

/// Kind of stage within a ritual
///
/// Serialized with the upper-case tags of the stored history format so
/// existing data keeps loading.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StageKind {
    #[serde(rename = "SAUNA")]
    Heat,
    #[serde(rename = "COLD")]
    Cold,
    #[serde(rename = "REST")]
    Rest,
}

impl StageKind {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            StageKind::Heat => "Sauna",
            StageKind::Cold => "Cold",
            StageKind::Rest => "Rest",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timed phase of a ritual
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stage {
    #[serde(rename = "type")]
    pub kind: StageKind,
    /// Duration in whole seconds (always > 0 for a valid protocol)
    pub duration: u32,
}

impl Stage {
    pub fn new(kind: StageKind, duration: u32) -> Self {
        Self { kind, duration }
    }

    /// Convenience constructor taking minutes
    pub fn minutes(kind: StageKind, minutes: u32) -> Self {
        Self::new(kind, minutes.saturating_mul(60))
    }
}

// ============================================================================
// Protocol Types
// ============================================================================

/// What the user wants out of their rituals
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Goal {
    Relax,
    Performance,
}

impl Goal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Relax => "Relax",
            Goal::Performance => "Performance",
        }
    }

    /// Parse a goal, accepting any casing
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "relax" => Some(Goal::Relax),
            "performance" | "perf" => Some(Goal::Performance),
            _ => None,
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, ordered template of stages repeated over a number of cycles
///
/// Protocols are values: adjusting one produces a new protocol.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Protocol {
    pub id: String,
    pub name: String,
    pub description: String,
    pub cycles: u32,
    pub stages: Vec<Stage>,
    pub goal: Goal,
}

impl Protocol {
    /// Sum of all stage durations in one cycle, in seconds
    pub fn cycle_duration(&self) -> u32 {
        self.stages
            .iter()
            .fold(0u32, |total, s| total.saturating_add(s.duration))
    }

    /// Planned duration of the whole ritual, in seconds
    pub fn total_duration(&self) -> u32 {
        self.cycle_duration().saturating_mul(self.cycles)
    }

    /// Validate the protocol invariants
    ///
    /// Returns every violation found; an empty list means the protocol can
    /// be run.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.cycles == 0 {
            errors.push(format!("Protocol '{}' has zero cycles", self.id));
        }

        if self.stages.is_empty() {
            errors.push(format!("Protocol '{}' has no stages", self.id));
        }

        for (idx, stage) in self.stages.iter().enumerate() {
            if stage.duration == 0 {
                errors.push(format!(
                    "Protocol '{}' stage {} ({}) has zero duration",
                    self.id, idx, stage.kind
                ));
            }
        }

        let cycle: u64 = self.stages.iter().map(|s| u64::from(s.duration)).sum();
        if cycle.saturating_mul(u64::from(self.cycles)) > u64::from(u32::MAX) {
            errors.push(format!(
                "Protocol '{}' is too long to time ({} cycles of {}s)",
                self.id, self.cycles, cycle
            ));
        }

        errors
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// The record of a fully completed ritual
///
/// Field names follow the camelCase layout of the persisted history.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionLog {
    pub protocol_name: String,
    /// Seconds actually spent in stages (skipped time is not credited)
    pub total_time: u32,
    pub cycles_completed: u32,
    pub date: DateTime<Utc>,
    pub goal: Option<Goal>,
}

// ============================================================================
// Suggestion Types
// ============================================================================

/// Self-reported sauna experience, used to ask for a suggested ritual
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "Beginner",
            ExperienceLevel::Intermediate => "Intermediate",
            ExperienceLevel::Advanced => "Advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(ExperienceLevel::Beginner),
            "intermediate" => Some(ExperienceLevel::Intermediate),
            "advanced" => Some(ExperienceLevel::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A suggested custom ritual (durations in minutes)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub cycles: u32,
    pub sauna_duration: u32,
    pub cold_duration: u32,
    pub rest_duration: u32,
    pub is_cold_enabled: bool,
}

// ============================================================================
// Profile Type
// ============================================================================

/// What the persistence port knows about the user
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Profile {
    pub health_check_accepted: bool,
    pub user_name: Option<String>,
    pub goal: Option<Goal>,
}

impl Profile {
    /// Onboarding is complete once both a name and a goal are stored
    pub fn is_onboarded(&self) -> bool {
        self.user_name.is_some() && self.goal.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_protocol() -> Protocol {
        Protocol {
            id: "sample".into(),
            name: "Sample".into(),
            description: "".into(),
            cycles: 2,
            stages: vec![
                Stage::minutes(StageKind::Heat, 10),
                Stage::minutes(StageKind::Cold, 1),
                Stage::minutes(StageKind::Rest, 10),
            ],
            goal: Goal::Relax,
        }
    }

    #[test]
    fn test_protocol_durations() {
        let protocol = sample_protocol();
        assert_eq!(protocol.cycle_duration(), 21 * 60);
        assert_eq!(protocol.total_duration(), 42 * 60);
    }

    #[test]
    fn test_validate_reports_all_violations() {
        let protocol = Protocol {
            cycles: 0,
            stages: vec![Stage::new(StageKind::Heat, 0)],
            ..sample_protocol()
        };

        let errors = protocol.validate();
        assert_eq!(errors.len(), 2);
        assert!(sample_protocol().validate().is_empty());
    }

    #[test]
    fn test_oversized_schedule_is_rejected_not_overflowed() {
        let protocol = Protocol {
            cycles: 5_000_000,
            stages: vec![Stage::minutes(StageKind::Heat, 80_000_000)],
            ..sample_protocol()
        };

        assert_eq!(protocol.stages[0].duration, u32::MAX);
        assert_eq!(protocol.total_duration(), u32::MAX);
        let errors = protocol.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("too long"));
    }

    #[test]
    fn test_stage_serializes_with_legacy_tags() {
        let json = serde_json::to_string(&Stage::new(StageKind::Heat, 600)).unwrap();
        assert_eq!(json, r#"{"type":"SAUNA","duration":600}"#);
    }

    #[test]
    fn test_session_log_roundtrip() {
        let log = SessionLog {
            protocol_name: "Deep Calm".into(),
            total_time: 5820,
            cycles_completed: 3,
            date: DateTime::parse_from_rfc3339("2024-01-15T10:30:00.123Z")
                .unwrap()
                .with_timezone(&Utc),
            goal: Some(Goal::Relax),
        };

        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains("\"protocolName\":\"Deep Calm\""));
        assert!(json.contains("\"totalTime\":5820"));

        let parsed: SessionLog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, log);
    }

    #[test]
    fn test_session_log_reads_browser_format() {
        let json = r#"{"protocolName":"protocol_relax_1_name","totalTime":1260,
            "cyclesCompleted":2,"date":"2024-03-02T18:04:11.512Z","goal":null}"#;

        let log: SessionLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.total_time, 1260);
        assert_eq!(log.goal, None);
        assert_eq!(log.date.timestamp_subsec_millis(), 512);
    }

    #[test]
    fn test_goal_and_level_parsing() {
        assert_eq!(Goal::parse("RELAX"), Some(Goal::Relax));
        assert_eq!(Goal::parse("performance"), Some(Goal::Performance));
        assert_eq!(Goal::parse("sleep"), None);
        assert_eq!(
            ExperienceLevel::parse("advanced"),
            Some(ExperienceLevel::Advanced)
        );
    }
}
