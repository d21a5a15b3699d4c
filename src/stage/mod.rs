//! # Animation Stages
//!
//! The animation lifecycle is an ordered sequence of stages, each with
//! behavior attached: a velocity cap, an expected duration for progress
//! estimation, and whether live settings changes are allowed. The engine
//! and policy match on stages exhaustively; there are no open-ended
//! lookups.

pub mod policy;

pub use policy::{PolicyInput, StagePolicy};

/// One phase of the animation lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Idle before the run is triggered; all settings changes allowed
    PreStart,
    /// Particles pushed outward from the burst centers in discrete waves
    Burst,
    /// Noise-dominated wandering with a light pull toward targets
    Chaos,
    /// Strengthening attraction toward targets
    Converging,
    /// Strongest, most heavily damped attraction; the image locks in
    Formation,
    /// Idle breathing oscillation around the formed image
    FinalBreathing,
}

impl Stage {
    /// Per-stage velocity magnitude cap in scene units per second
    pub fn velocity_cap(self) -> f32 {
        match self {
            Stage::PreStart => 0.0,
            Stage::Burst => 1.2,
            Stage::Chaos => 0.8,
            Stage::Converging => 0.6,
            Stage::Formation => 0.3,
            Stage::FinalBreathing => 0.05,
        }
    }

    /// Expected duration in seconds, used for the coarse progress estimate
    pub fn expected_duration(self) -> f64 {
        match self {
            Stage::PreStart => 0.0,
            Stage::Burst => 2.0,
            Stage::Chaos => 3.0,
            Stage::Converging => 6.0,
            Stage::Formation => 2.0,
            Stage::FinalBreathing => 10.0,
        }
    }

    /// Whether settings changes beyond the safe subset are accepted
    ///
    /// Only PRE_START allows unconditional changes; everywhere else the
    /// engine applies the safe subset and ignores the rest.
    pub fn allows_all_settings(self) -> bool {
        matches!(self, Stage::PreStart)
    }

    /// The stage this one advances to when its transition fires
    pub fn next(self) -> Stage {
        match self {
            Stage::PreStart => Stage::Burst,
            Stage::Burst => Stage::Chaos,
            Stage::Chaos => Stage::Converging,
            Stage::Converging => Stage::Formation,
            Stage::Formation => Stage::FinalBreathing,
            // loop mode only; the policy gates this
            Stage::FinalBreathing => Stage::PreStart,
        }
    }

    /// Short display name for HUD and logs
    pub fn name(self) -> &'static str {
        match self {
            Stage::PreStart => "pre-start",
            Stage::Burst => "burst",
            Stage::Chaos => "chaos",
            Stage::Converging => "converging",
            Stage::Formation => "formation",
            Stage::FinalBreathing => "final-breathing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_in_order_and_cycle() {
        let mut stage = Stage::PreStart;
        let expected = [
            Stage::Burst,
            Stage::Chaos,
            Stage::Converging,
            Stage::Formation,
            Stage::FinalBreathing,
            Stage::PreStart,
        ];
        for want in expected {
            stage = stage.next();
            assert_eq!(stage, want);
        }
    }

    #[test]
    fn velocity_caps_tighten_toward_formation() {
        assert!(Stage::Burst.velocity_cap() > Stage::Chaos.velocity_cap());
        assert!(Stage::Chaos.velocity_cap() > Stage::Converging.velocity_cap());
        assert!(Stage::Converging.velocity_cap() > Stage::Formation.velocity_cap());
        assert!(Stage::Formation.velocity_cap() > Stage::FinalBreathing.velocity_cap());
    }

    #[test]
    fn only_pre_start_allows_all_settings() {
        assert!(Stage::PreStart.allows_all_settings());
        assert!(!Stage::Burst.allows_all_settings());
        assert!(!Stage::FinalBreathing.allows_all_settings());
    }
}
