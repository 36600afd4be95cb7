//! Temperature-based duration adjustment.
//!
//! Hotter saunas and colder plunges are more intense, so stage durations are
//! rescaled around a baseline of 85 °C sauna and 10 °C water:
//! - Sauna: -12% per 5 °C hotter, +6% per 5 °C cooler
//! - Cold: -20% per 2 °C colder, +10% per 2 °C warmer
//! - Rest: unchanged
//!
//! Modifiers are clamped to 50%..150% and results are rounded half away from
//! zero, with a floor of one second.

use crate::{Protocol, Stage, StageKind};
use std::ops::RangeInclusive;

/// Sauna temperature the built-in durations are tuned for (°C)
pub const BASE_HEAT_TEMP: i32 = 85;

/// Water temperature the built-in durations are tuned for (°C)
pub const BASE_COLD_TEMP: i32 = 10;

/// Sauna temperatures a caller should accept from the user (°C)
pub const HEAT_TEMP_RANGE: RangeInclusive<i32> = 60..=110;

/// Water temperatures a caller should accept from the user (°C)
pub const COLD_TEMP_RANGE: RangeInclusive<i32> = 1..=20;

const MIN_MODIFIER: f64 = 0.5;
const MAX_MODIFIER: f64 = 1.5;

/// Duration multiplier for sauna stages at the given temperature
pub fn heat_modifier(heat_temp: i32) -> f64 {
    let delta = f64::from(heat_temp) - f64::from(BASE_HEAT_TEMP);
    let modifier = if delta > 0.0 {
        1.0 - (delta / 5.0) * 0.12
    } else {
        1.0 - (delta / 5.0) * 0.06
    };
    modifier.clamp(MIN_MODIFIER, MAX_MODIFIER)
}

/// Duration multiplier for cold stages at the given temperature
pub fn cold_modifier(cold_temp: i32) -> f64 {
    let delta = f64::from(cold_temp) - f64::from(BASE_COLD_TEMP);
    let modifier = if delta < 0.0 {
        1.0 - (delta.abs() / 2.0) * 0.20
    } else {
        1.0 + (delta / 2.0) * 0.10
    };
    modifier.clamp(MIN_MODIFIER, MAX_MODIFIER)
}

fn scale(duration: u32, modifier: f64) -> u32 {
    let scaled = (f64::from(duration) * modifier).round();
    // modifier is clamped to 0.5..=1.5, so the product fits comfortably in u32
    (scaled as u32).max(1)
}

/// Rescale a protocol's stage durations for the given temperatures
///
/// Pure and total: any temperature is accepted and the input protocol is
/// left untouched. Identity, name, cycles, goal and stage order carry over.
pub fn adjust_protocol(protocol: &Protocol, heat_temp: i32, cold_temp: i32) -> Protocol {
    let heat = heat_modifier(heat_temp);
    let cold = cold_modifier(cold_temp);

    let stages = protocol
        .stages
        .iter()
        .map(|stage| match stage.kind {
            StageKind::Heat => Stage::new(stage.kind, scale(stage.duration, heat)),
            StageKind::Cold => Stage::new(stage.kind, scale(stage.duration, cold)),
            StageKind::Rest => *stage,
        })
        .collect();

    tracing::debug!(
        "Adjusted '{}' for sauna {}°C (x{:.2}) and water {}°C (x{:.2})",
        protocol.id,
        heat_temp,
        heat,
        cold_temp,
        cold
    );

    Protocol {
        stages,
        ..protocol.clone()
    }
}

/// Whether an adjusted protocol differs from the original in any stage
pub fn has_changes(original: &Protocol, adjusted: &Protocol) -> bool {
    original.stages != adjusted.stages
}
