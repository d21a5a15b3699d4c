//! # Run Configuration
//!
//! Settings for one animation run, configured through a builder with
//! sensible defaults. Particle count is derived from a coarse density tier
//! rather than set directly, and the overall pace is scaled by a speed
//! profile multiplier.
//!
//! ## Example
//!
//! ```
//! use stipple::settings::{Settings, DensityTier, SpeedProfile};
//!
//! let settings = Settings::new()
//!     .with_density(DensityTier::Medium)
//!     .with_speed(SpeedProfile::Fast)
//!     .with_breathing_amplitude(0.02)
//!     .build()
//!     .unwrap();
//! assert_eq!(settings.particle_count(), 9_000);
//! ```

use crate::error::{EngineError, Result};

/// Coarse particle-density tiers exposed to users
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DensityTier {
    Low,
    Medium,
    High,
}

impl DensityTier {
    /// Particle count for this tier
    pub fn particle_count(self) -> usize {
        match self {
            DensityTier::Low => 3_000,
            DensityTier::Medium => 9_000,
            DensityTier::High => 15_000,
        }
    }
}

/// Overall animation pace
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedProfile {
    Slow,
    Normal,
    Fast,
}

impl SpeedProfile {
    /// Time-step multiplier for this profile
    pub fn multiplier(self) -> f32 {
        match self {
            SpeedProfile::Slow => 0.7,
            SpeedProfile::Normal => 1.0,
            SpeedProfile::Fast => 1.4,
        }
    }
}

/// Validated configuration for one animation run
///
/// Constant for the lifetime of a run except for the safe subset the engine
/// accepts mid-run (HUD flag, locale, watermark path, breathing amplitude).
#[derive(Clone, Debug)]
pub struct Settings {
    pub density: DensityTier,
    pub speed: SpeedProfile,
    /// Discrete outward emission events during BURST
    pub burst_wave_count: u32,
    /// Chaos energy below this ends CHAOS early
    pub chaos_energy_threshold: f32,
    /// CHAOS fallback duration in seconds
    pub chaos_min_duration: f64,
    /// CONVERGING fallback duration in seconds
    pub converge_max_duration: f64,
    /// Consecutive non-decreasing recognition frames required to leave FORMATION
    pub stable_frame_threshold: u32,
    /// Final-idle oscillation amplitude, validated to [0.0, 0.03]
    pub breathing_amplitude: f32,
    /// Restart from PRE_START after the final breathing pause
    pub loop_mode: bool,
    /// Pause in FINAL_BREATHING before looping, seconds
    pub breathing_pause: f64,
    /// Pass-through fields for the HUD / presentation collaborators
    pub hud_enabled: bool,
    pub locale: String,
    pub watermark_path: Option<String>,
}

impl Settings {
    /// Creates a settings builder with defaults
    pub fn new() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Particle count derived from the density tier
    pub fn particle_count(&self) -> usize {
        self.density.particle_count()
    }

    /// Time-step multiplier derived from the speed profile
    pub fn speed_multiplier(&self) -> f32 {
        self.speed.multiplier()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            density: DensityTier::Medium,
            speed: SpeedProfile::Normal,
            burst_wave_count: 3,
            chaos_energy_threshold: 0.05,
            chaos_min_duration: 3.0,
            converge_max_duration: 8.0,
            stable_frame_threshold: 30,
            breathing_amplitude: 0.015,
            loop_mode: false,
            breathing_pause: 6.0,
            hud_enabled: false,
            locale: "en".to_string(),
            watermark_path: None,
        }
    }
}

/// Builder for [`Settings`]
#[derive(Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Sets the particle density tier
    pub fn with_density(mut self, density: DensityTier) -> Self {
        self.settings.density = density;
        self
    }

    /// Sets the speed profile
    pub fn with_speed(mut self, speed: SpeedProfile) -> Self {
        self.settings.speed = speed;
        self
    }

    /// Sets the number of burst waves
    pub fn with_burst_waves(mut self, count: u32) -> Self {
        self.settings.burst_wave_count = count;
        self
    }

    /// Sets the chaos energy threshold
    pub fn with_chaos_threshold(mut self, threshold: f32) -> Self {
        self.settings.chaos_energy_threshold = threshold;
        self
    }

    /// Sets the minimum chaos duration in seconds
    pub fn with_chaos_min_duration(mut self, seconds: f64) -> Self {
        self.settings.chaos_min_duration = seconds;
        self
    }

    /// Sets the convergence fallback duration in seconds
    pub fn with_converge_max_duration(mut self, seconds: f64) -> Self {
        self.settings.converge_max_duration = seconds;
        self
    }

    /// Sets the stable-frame threshold for leaving FORMATION
    pub fn with_stable_frames(mut self, frames: u32) -> Self {
        self.settings.stable_frame_threshold = frames;
        self
    }

    /// Sets the final-idle breathing amplitude (validated on build)
    pub fn with_breathing_amplitude(mut self, amplitude: f32) -> Self {
        self.settings.breathing_amplitude = amplitude;
        self
    }

    /// Enables loop mode (restart after final breathing)
    pub fn with_loop_mode(mut self, enabled: bool) -> Self {
        self.settings.loop_mode = enabled;
        self
    }

    /// Sets the final breathing pause before looping, seconds
    pub fn with_breathing_pause(mut self, seconds: f64) -> Self {
        self.settings.breathing_pause = seconds;
        self
    }

    /// Enables the HUD pass-through flag
    pub fn with_hud(mut self, enabled: bool) -> Self {
        self.settings.hud_enabled = enabled;
        self
    }

    /// Sets the locale pass-through field
    pub fn with_locale(mut self, locale: &str) -> Self {
        self.settings.locale = locale.to_string();
        self
    }

    /// Sets the watermark path pass-through field
    pub fn with_watermark(mut self, path: Option<String>) -> Self {
        self.settings.watermark_path = path;
        self
    }

    /// Validates and builds the settings
    pub fn build(self) -> Result<Settings> {
        let s = self.settings;
        if !(0.0..=0.03).contains(&s.breathing_amplitude) {
            return Err(EngineError::InvalidArgument(format!(
                "breathing amplitude {} outside [0.0, 0.03]",
                s.breathing_amplitude
            )));
        }
        if s.chaos_min_duration < 0.0 || s.converge_max_duration < 0.0 || s.breathing_pause < 0.0 {
            return Err(EngineError::InvalidArgument(
                "durations must be non-negative".to_string(),
            ));
        }
        Ok(s)
    }
}
