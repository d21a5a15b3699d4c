//! # Stage Transition Policy
//!
//! The finite state machine that decides, once per frame, whether the
//! animation advances to its next stage. Every automatic transition pairs
//! a primary metric-based condition with a hard fallback timeout, so the
//! machine can never stall on an adversarial metric stream. At most one
//! transition fires per evaluation.
//!
//! The policy carries its own mutable counters (stable-frame count,
//! last-seen recognition) and must not be shared across concurrent runs
//! without isolation.

use log::debug;

use crate::settings::Settings;
use crate::stage::Stage;

/// BURST fallback: advance after this many seconds even with waves pending
const BURST_FALLBACK_SECS: f64 = 2.0;

/// FORMATION fallback: advance after this many seconds without stability
const FORMATION_FALLBACK_SECS: f64 = 2.0;

/// Recognition level that ends CONVERGING early
const RECOGNITION_FORMED: f32 = 0.8;

/// Allowed per-frame recognition dip still counted as "non-decreasing"
const STABILITY_TOLERANCE: f32 = 1e-4;

/// Per-frame measurements the policy consumes
#[derive(Clone, Copy, Debug)]
pub struct PolicyInput {
    /// Caller-clock time in seconds
    pub now: f64,
    /// Recognition score in [0, 1]; NaN degrades to "not yet met"
    pub recognition: f32,
    /// Mean squared particle speed
    pub chaos_energy: f32,
    /// Burst waves delivered so far this run
    pub waves_emitted: u32,
    /// Current particle count, for the metrics record
    pub particle_count: usize,
}

/// Per-frame stage transition decider
pub struct StagePolicy {
    stage: Stage,
    stage_started_at: f64,
    stable_frames: u32,
    last_recognition: f32,
    settings: Settings,
}

impl StagePolicy {
    /// Creates a policy in PRE_START with its clock at `now`
    pub fn new(settings: Settings, now: f64) -> Self {
        Self {
            stage: Stage::PreStart,
            stage_started_at: now,
            stable_frames: 0,
            last_recognition: 0.0,
            settings,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Seconds spent in the current stage as of `now`
    pub fn stage_elapsed(&self, now: f64) -> f64 {
        (now - self.stage_started_at).max(0.0)
    }

    /// Coarse progress estimate: elapsed over expected duration, saturating
    pub fn stage_progress(&self, now: f64) -> f32 {
        let expected = self.stage.expected_duration();
        if expected <= 0.0 {
            return 0.0;
        }
        (self.stage_elapsed(now) / expected).min(1.0) as f32
    }

    /// Replaces the settings the policy consults (thresholds, loop mode)
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Manual PRE_START -> BURST trigger; ignored in any other stage
    pub fn trigger_start(&mut self, now: f64) -> bool {
        if self.stage == Stage::PreStart {
            self.enter(Stage::Burst, now);
            true
        } else {
            false
        }
    }

    /// Resets the machine to PRE_START, clearing all counters
    pub fn reset(&mut self, now: f64) {
        self.stage = Stage::PreStart;
        self.stage_started_at = now;
        self.stable_frames = 0;
        self.last_recognition = 0.0;
    }

    /// Evaluates the transition rule for the current stage
    ///
    /// Returns the newly entered stage when a transition fires. Fallback
    /// timeouts always win once exceeded; primary conditions are written
    /// so NaN metrics fall through to the fallback branch.
    pub fn evaluate(&mut self, input: &PolicyInput) -> Option<Stage> {
        let elapsed = self.stage_elapsed(input.now);
        let next = match self.stage {
            // manual trigger only
            Stage::PreStart => None,

            Stage::Burst => {
                let waves_done = input.waves_emitted >= self.settings.burst_wave_count;
                (waves_done || elapsed >= BURST_FALLBACK_SECS).then(|| Stage::Chaos)
            }

            Stage::Chaos => {
                let settled = input.chaos_energy < self.settings.chaos_energy_threshold;
                (settled || elapsed >= self.settings.chaos_min_duration)
                    .then(|| Stage::Converging)
            }

            Stage::Converging => {
                let formed = input.recognition >= RECOGNITION_FORMED;
                (formed || elapsed >= self.settings.converge_max_duration)
                    .then(|| Stage::Formation)
            }

            Stage::Formation => {
                if input.recognition >= self.last_recognition - STABILITY_TOLERANCE {
                    self.stable_frames += 1;
                } else {
                    self.stable_frames = 0;
                }
                let stable = self.stable_frames >= self.settings.stable_frame_threshold;
                (stable || elapsed >= FORMATION_FALLBACK_SECS).then(|| Stage::FinalBreathing)
            }

            Stage::FinalBreathing => (self.settings.loop_mode
                && elapsed >= self.settings.breathing_pause)
                .then(|| Stage::PreStart),
        };

        if input.recognition.is_finite() {
            self.last_recognition = input.recognition;
        }

        if let Some(stage) = next {
            self.enter(stage, input.now);
        }
        next
    }

    fn enter(&mut self, stage: Stage, now: f64) {
        debug!(
            "stage transition: {} -> {} after {:.2}s",
            self.stage.name(),
            stage.name(),
            self.stage_elapsed(now)
        );
        self.stage = stage;
        self.stage_started_at = now;
        self.stable_frames = 0;
    }
}
