//! Stage microcopy and tips.
//!
//! Lines are picked with a caller-supplied RNG so the display can be made
//! reproducible; picking content never touches timer state.

use crate::StageKind;
use rand::seq::SliceRandom;
use rand::Rng;

/// Text pools for one stage kind
#[derive(Debug)]
pub struct StageContent {
    pub microcopy: &'static [&'static str],
    pub tips: &'static [&'static str],
}

static HEAT: StageContent = StageContent {
    microcopy: &[
        "Let the heat soak in.",
        "Breathe slow and steady.",
        "Relax your shoulders.",
        "Feel the warmth reach your core.",
        "Stay present. Nothing else to do.",
    ],
    tips: &[
        "Sit on a higher bench for more heat, a lower one for less.",
        "Leave early if you feel dizzy. Comfort beats the clock.",
        "Breathe through your nose to keep your airways comfortable.",
    ],
};

static COLD: StageContent = StageContent {
    microcopy: &[
        "Long exhale. Stay calm.",
        "The first seconds are the hardest.",
        "Control your breath.",
        "You are stronger than the cold.",
        "Almost there. Keep breathing.",
    ],
    tips: &[
        "Enter the water steadily rather than in one jump.",
        "Keep your hands out of the water if they ache.",
        "Focus on slow exhales to calm the gasp reflex.",
    ],
};

static REST: StageContent = StageContent {
    microcopy: &[
        "Let your body settle.",
        "Notice your heartbeat slowing.",
        "Sip some water.",
        "Enjoy the stillness.",
        "Warm up naturally, no rush.",
    ],
    tips: &[
        "Drink water between rounds to stay hydrated.",
        "Rest somewhere with fresh air if you can.",
        "Let your body rewarm on its own before the next round.",
    ],
};

/// Text pools for a stage kind
pub fn stage_content(kind: StageKind) -> &'static StageContent {
    match kind {
        StageKind::Heat => &HEAT,
        StageKind::Cold => &COLD,
        StageKind::Rest => &REST,
    }
}

/// Pick an encouraging line for the stage
pub fn pick_microcopy<R: Rng + ?Sized>(kind: StageKind, rng: &mut R) -> &'static str {
    stage_content(kind)
        .microcopy
        .choose(rng)
        .copied()
        .unwrap_or_default()
}

/// Pick a practical tip for the stage
pub fn pick_tip<R: Rng + ?Sized>(kind: StageKind, rng: &mut R) -> &'static str {
    stage_content(kind)
        .tips
        .choose(rng)
        .copied()
        .unwrap_or_default()
}
