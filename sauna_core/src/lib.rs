#![forbid(unsafe_code)]

//! Core domain model and business logic for SaunaFlow.
//!
//! This crate provides:
//! - Domain types (stages, protocols, session logs, profile)
//! - The built-in protocol catalog and custom ritual builder
//! - Temperature-based duration adjustment
//! - The session timer state machine
//! - Streaks, aggregates and achievements
//! - Persistence (key-value store, history, CSV export)
//! - The navigation flow tying it together

pub mod types;
pub mod error;
pub mod catalog;
pub mod adjust;
pub mod session;
pub mod stats;
pub mod achievements;
pub mod content;
pub mod clock;
pub mod store;
pub mod history;
pub mod export;
pub mod suggest;
pub mod config;
pub mod logging;
pub mod app;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{default_catalog, Catalog, CustomRitual, StageSetting};
pub use adjust::{adjust_protocol, has_changes};
pub use session::{Advance, SessionTimer, Tick, TimerStatus};
pub use stats::{compute_aggregates, compute_streak, recent_sessions, Aggregates};
pub use achievements::{evaluate_achievements, Achievement, AchievementStatus, ACHIEVEMENTS};
pub use clock::{Clock, FixedClock, SystemClock};
pub use store::{FileStore, KeyValueStore, MemoryStore, SessionSink};
pub use history::{append_session, load_history};
pub use suggest::{FileAdvisor, PresetAdvisor, SuggestionProvider};
pub use config::Config;
pub use app::{AppFlow, Screen};
