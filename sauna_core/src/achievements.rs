//! Achievements unlocked by the session history.
//!
//! An achievement is a pure predicate over `(history, streak)`. "Unlocked" is
//! never stored; it is recomputed every time the dashboard asks.

use crate::stats::compute_aggregates;
use crate::{Goal, SessionLog};

/// A named milestone and the rule that unlocks it
#[derive(Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub predicate: fn(&[SessionLog], u32) -> bool,
}

impl Achievement {
    pub fn is_unlocked(&self, history: &[SessionLog], streak: u32) -> bool {
        (self.predicate)(history, streak)
    }
}

impl std::fmt::Debug for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Achievement").field("id", &self.id).finish()
    }
}

/// An achievement paired with its live unlock state
#[derive(Clone, Copy, Debug)]
pub struct AchievementStatus {
    pub achievement: &'static Achievement,
    pub unlocked: bool,
}

fn goal_count(history: &[SessionLog], goal: Goal) -> usize {
    history.iter().filter(|log| log.goal == Some(goal)).count()
}

/// Every achievement, in display order
pub static ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first_session",
        title: "First Steam",
        description: "Complete your first ritual.",
        predicate: |history, _| !history.is_empty(),
    },
    Achievement {
        id: "ten_sessions",
        title: "Regular",
        description: "Complete 10 rituals.",
        predicate: |history, _| history.len() >= 10,
    },
    Achievement {
        id: "fifty_sessions",
        title: "Devotee",
        description: "Complete 50 rituals.",
        predicate: |history, _| history.len() >= 50,
    },
    Achievement {
        id: "streak_3",
        title: "Warming Up",
        description: "Keep a 3-day streak.",
        predicate: |_, streak| streak >= 3,
    },
    Achievement {
        id: "streak_7",
        title: "Week of Heat",
        description: "Keep a 7-day streak.",
        predicate: |_, streak| streak >= 7,
    },
    Achievement {
        id: "hour_of_heat",
        title: "Hour of Heat",
        description: "Spend 60 minutes in rituals.",
        predicate: |history, _| compute_aggregates(history).total_minutes >= 60.0,
    },
    Achievement {
        id: "ten_hours",
        title: "Seasoned",
        description: "Spend 10 hours in rituals.",
        predicate: |history, _| compute_aggregates(history).total_minutes >= 600.0,
    },
    Achievement {
        id: "marathon",
        title: "Marathon",
        description: "Finish a single ritual lasting an hour or more.",
        predicate: |history, _| history.iter().any(|log| log.total_time >= 3600),
    },
    Achievement {
        id: "four_cycles",
        title: "Full Circle",
        description: "Finish a ritual with four or more cycles.",
        predicate: |history, _| history.iter().any(|log| log.cycles_completed >= 4),
    },
    Achievement {
        id: "calm_mind",
        title: "Calm Mind",
        description: "Complete 5 relaxation rituals.",
        predicate: |history, _| goal_count(history, Goal::Relax) >= 5,
    },
    Achievement {
        id: "peak_form",
        title: "Peak Form",
        description: "Complete 5 performance rituals.",
        predicate: |history, _| goal_count(history, Goal::Performance) >= 5,
    },
];

/// Evaluate every achievement against the current history and streak
pub fn evaluate_achievements(history: &[SessionLog], streak: u32) -> Vec<AchievementStatus> {
    ACHIEVEMENTS
        .iter()
        .map(|achievement| AchievementStatus {
            achievement,
            unlocked: achievement.is_unlocked(history, streak),
        })
        .collect()
}
