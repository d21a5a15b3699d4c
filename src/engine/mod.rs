//! # Simulation Engine
//!
//! The orchestrator: owns the particle store, the stage transition policy,
//! and the breathing oscillator. Each `step()` applies the current stage's
//! force rule, integrates with a fixed time step, clamps bounds, recomputes
//! the recognition and chaos metrics, asks the policy for a transition, and
//! runs any stage-entry side effects.
//!
//! The engine is single-threaded and synchronous: the caller owns the frame
//! loop and invokes `step()` once per tick, passing its own clock. Pausing
//! toggles a boolean gate checked at the top of `step()` - nothing on the
//! hot path blocks.
//!
//! ## Example
//!
//! ```
//! use stipple::engine::SimulationEngine;
//! use stipple::particles::PixelGrid;
//! use stipple::settings::{Settings, DensityTier};
//!
//! let settings = Settings::new().with_density(DensityTier::Low).build().unwrap();
//! let grid = PixelGrid::new(16, 16, vec![[200, 200, 200]; 256]).unwrap();
//!
//! let mut engine = SimulationEngine::new(settings);
//! engine.init(&grid, 0.0).unwrap();
//! engine.start(0.0).unwrap();
//! let metrics = engine.step(1.0 / 60.0).unwrap();
//! assert_eq!(metrics.particle_count, 3_000);
//! ```

pub mod forces;

use cgmath::Vector2;
use log::{debug, info};

use crate::error::{EngineError, Result};
use crate::oscillator::BreathingOscillator;
use crate::particles::{
    chaos_energy, init, recognition_score, ParticleSnapshot, ParticleStore, PixelGrid,
};
use crate::performance::{FrameMetrics, FrameMonitor};
use crate::settings::Settings;
use crate::stage::{PolicyInput, Stage, StagePolicy};
use forces::{stage_profile, PhysicsParams};

/// Radius of the burst seeding disc around each center
const BURST_SEED_RADIUS: f32 = 0.05;

/// Oscillator frequency for the final idle, Hz
const CALM_FREQUENCY: f32 = 0.25;

/// Proportional rate for breathing amplitude self-adjustment
const BREATHING_ADJUST_RATE: f32 = 0.02;

/// Engine lifecycle, advanced by the control calls
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    Running,
    Paused,
    Stopped,
}

/// Orchestrates one particle animation run
pub struct SimulationEngine {
    settings: Settings,
    physics: PhysicsParams,
    lifecycle: Lifecycle,
    store: Option<ParticleStore>,
    policy: StagePolicy,
    oscillator: BreathingOscillator,
    monitor: FrameMonitor,
    burst_centers: Vec<Vector2<f32>>,
    waves_emitted: u32,
    run_started_at: f64,
    last_metrics: FrameMetrics,
}

impl SimulationEngine {
    /// Creates an uninitialized engine; `init` must be called before `step`
    pub fn new(settings: Settings) -> Self {
        let physics = PhysicsParams::new(settings.speed_multiplier());
        let policy = StagePolicy::new(settings.clone(), 0.0);
        Self {
            physics,
            policy,
            lifecycle: Lifecycle::Uninitialized,
            store: None,
            oscillator: BreathingOscillator::new(
                CALM_FREQUENCY,
                settings.breathing_amplitude,
                0.0,
                0.0,
            ),
            monitor: FrameMonitor::new(),
            burst_centers: vec![Vector2::new(0.5, 0.5)],
            waves_emitted: 0,
            run_started_at: 0.0,
            last_metrics: FrameMetrics::default(),
            settings,
        }
    }

    /// Allocates particles from the current settings, derives targets from
    /// the image, and seeds burst positions
    ///
    /// Re-initializing reallocates everything; the particle count is fixed
    /// between calls.
    pub fn init(&mut self, grid: &PixelGrid, now: f64) -> Result<()> {
        let count = self.settings.particle_count();
        let mut store = ParticleStore::allocate(count)?;
        init::map_image_to_targets(grid, &mut store);
        init::seed_burst_positions(&mut store, &self.burst_centers, BURST_SEED_RADIUS);
        store.check_consistency()?;

        self.store = Some(store);
        self.policy.reset(now);
        self.policy.update_settings(self.settings.clone());
        self.oscillator = BreathingOscillator::new(
            CALM_FREQUENCY,
            self.settings.breathing_amplitude,
            0.0,
            0.0,
        );
        self.monitor.reset();
        self.waves_emitted = 0;
        self.run_started_at = now;
        self.last_metrics = FrameMetrics {
            particle_count: count,
            active_count: count,
            ..FrameMetrics::default()
        };
        self.lifecycle = Lifecycle::Initialized;
        info!(
            "engine initialized: {} particles from {}x{} image",
            count,
            grid.width(),
            grid.height()
        );
        Ok(())
    }

    /// Replaces the burst centers used when BURST is (re-)entered
    ///
    /// An empty list falls back to the scene center.
    pub fn set_burst_centers(&mut self, centers: Vec<Vector2<f32>>) {
        self.burst_centers = if centers.is_empty() {
            vec![Vector2::new(0.5, 0.5)]
        } else {
            centers
        };
    }

    /// Triggers PRE_START -> BURST and begins running
    ///
    /// A stopped run stays stopped until re-initialized.
    pub fn start(&mut self, now: f64) -> Result<()> {
        if self.store.is_none() || self.lifecycle == Lifecycle::Stopped {
            return Err(EngineError::NotInitialized("start"));
        }
        if self.policy.trigger_start(now) {
            self.enter_stage(Stage::Burst, now);
        }
        self.lifecycle = Lifecycle::Running;
        Ok(())
    }

    /// Pauses stepping; `step` becomes a no-op until `resume`
    pub fn pause(&mut self) {
        if self.lifecycle == Lifecycle::Running {
            self.lifecycle = Lifecycle::Paused;
        }
    }

    /// Resumes a paused run
    pub fn resume(&mut self) {
        if self.lifecycle == Lifecycle::Paused {
            self.lifecycle = Lifecycle::Running;
        }
    }

    /// Stops the run unconditionally and immediately
    pub fn stop(&mut self) {
        self.lifecycle = Lifecycle::Stopped;
    }

    /// Stop, re-initialize from the image, and start again
    pub fn restart(&mut self, grid: &PixelGrid, now: f64) -> Result<()> {
        self.stop();
        self.init(grid, now)?;
        self.start(now)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn stage(&self) -> Stage {
        self.policy.stage()
    }

    /// Advances one frame at caller-clock time `now`
    ///
    /// Fails with `NotInitialized` before `init`; a no-op (returning the
    /// last metrics) while paused or stopped.
    pub fn step(&mut self, now: f64) -> Result<FrameMetrics> {
        if self.store.is_none() {
            return Err(EngineError::NotInitialized("step"));
        }
        // pause gate: nothing below runs while paused or stopped
        if matches!(self.lifecycle, Lifecycle::Paused | Lifecycle::Stopped) {
            return Ok(self.last_metrics.clone());
        }

        self.monitor.begin_frame();
        let stage = self.policy.stage();
        let dt = self.physics.time_step;

        self.advance_stage_physics(stage, now, dt);

        // metrics feed both the policy and the HUD record
        let (recognition, energy, count, active) = {
            let store = self.store.as_ref().expect("checked above");
            (
                recognition_score(store.positions(), store.targets()),
                chaos_energy(store.velocities()),
                store.len(),
                store.active_count(),
            )
        };

        let input = PolicyInput {
            now,
            recognition,
            chaos_energy: energy,
            waves_emitted: self.waves_emitted,
            particle_count: count,
        };
        if let Some(next) = self.policy.evaluate(&input) {
            self.enter_stage(next, now);
        }

        self.monitor.end_frame();
        self.last_metrics = FrameMetrics {
            fps: self.monitor.rolling_fps(),
            instant_fps: self.monitor.instant_fps(),
            frame_compute_ms: self.monitor.last_compute_ms(),
            particle_count: count,
            active_count: active,
            stage: self.policy.stage(),
            recognition,
            chaos_energy: energy,
            stage_elapsed: self.policy.stage_elapsed(now),
            total_elapsed: (now - self.run_started_at).max(0.0),
            stage_progress: self.policy.stage_progress(now),
        };
        Ok(self.last_metrics.clone())
    }

    /// Applies the stage force rule and integrates one fixed step
    fn advance_stage_physics(&mut self, stage: Stage, now: f64, dt: f32) {
        let profile = stage_profile(stage);

        match stage {
            Stage::PreStart => return,

            Stage::Burst => {
                self.emit_due_waves(now);
                let progress = self.policy.stage_progress(now);
                let store = self.store.as_mut().expect("store present while stepping");
                forces::apply_burst(
                    store,
                    &self.burst_centers,
                    self.physics.burst_strength,
                    progress,
                    dt,
                );
                forces::apply_noise(store, self.physics.noise * profile.noise_scale, dt);
            }

            Stage::Chaos | Stage::Converging | Stage::Formation => {
                let store = self.store.as_mut().expect("store present while stepping");
                forces::apply_noise(store, self.physics.noise * profile.noise_scale, dt);
                forces::apply_target_attraction(
                    store,
                    self.physics.attraction * profile.attraction_scale,
                    dt,
                );
            }

            Stage::FinalBreathing => {
                // position-driven: offsets are scaled from the formed target
                // positions, not the current ones, so successive frames do
                // not compound the scaling
                let center = Vector2::new(0.5, 0.5);
                let store = self.store.as_mut().expect("store present while stepping");
                let breathed = self
                    .oscillator
                    .radial_breathing(now, center, store.targets());
                store.positions_mut().copy_from_slice(&breathed);
                store.apply_damping(profile.damping);
                store.clamp_velocities(stage.velocity_cap());
                store.clamp_positions();
                self.oscillator.auto_adjust_amplitude(
                    self.settings.breathing_amplitude / std::f32::consts::SQRT_2,
                    BREATHING_ADJUST_RATE,
                );
                return;
            }
        }

        let store = self.store.as_mut().expect("store present while stepping");
        store.apply_damping(profile.damping);
        store.clamp_velocities(stage.velocity_cap());
        // integrate positions and project back into the unit square
        let n = store.len();
        for i in 0..n {
            let v = store.velocities()[i];
            store.positions_mut()[i] += v * dt;
        }
        store.clamp_positions();
    }

    /// Delivers burst waves at evenly spaced times across the stage
    fn emit_due_waves(&mut self, now: f64) {
        let total = self.settings.burst_wave_count;
        if total == 0 || self.waves_emitted >= total {
            return;
        }
        let interval = Stage::Burst.expected_duration() / total as f64;
        let elapsed = self.policy.stage_elapsed(now);
        while self.waves_emitted < total && elapsed >= self.waves_emitted as f64 * interval {
            let store = self.store.as_mut().expect("store present while stepping");
            forces::apply_wave_kick(store, &self.burst_centers, self.physics.wave_kick);
            self.waves_emitted += 1;
            debug!("burst wave {}/{} emitted", self.waves_emitted, total);
        }
    }

    /// Stage-entry side effects, run once per transition
    fn enter_stage(&mut self, stage: Stage, now: f64) {
        match stage {
            Stage::Burst => {
                if let Some(store) = self.store.as_mut() {
                    init::seed_burst_positions(store, &self.burst_centers, BURST_SEED_RADIUS);
                }
                self.waves_emitted = 0;
            }
            Stage::FinalBreathing => {
                // calmer signal for the idle effect
                self.oscillator
                    .configure(CALM_FREQUENCY, self.settings.breathing_amplitude);
                self.oscillator.reset(now);
            }
            Stage::PreStart => {
                // reachable only through loop mode; roll straight into the
                // next cycle
                if self.settings.loop_mode && self.policy.trigger_start(now) {
                    info!("loop mode: restarting animation cycle");
                    self.enter_stage(Stage::Burst, now);
                }
            }
            Stage::Chaos | Stage::Converging | Stage::Formation => {}
        }
    }

    /// Applies a settings change, honoring the per-stage rules
    ///
    /// PRE_START accepts everything (a density change takes effect at the
    /// next `init`). Mid-run only the safe subset is applied: HUD flag,
    /// locale, watermark path, breathing amplitude. The rest is silently
    /// ignored.
    pub fn apply_settings(&mut self, new: Settings) {
        if self.stage().allows_all_settings() {
            self.physics = PhysicsParams::new(new.speed_multiplier());
            self.policy.update_settings(new.clone());
            self.oscillator.set_amplitude(new.breathing_amplitude);
            self.settings = new;
            return;
        }

        debug!(
            "mid-run settings change in {}: applying safe subset only",
            self.stage().name()
        );
        self.settings.hud_enabled = new.hud_enabled;
        self.settings.locale = new.locale;
        self.settings.watermark_path = new.watermark_path;
        self.settings.breathing_amplitude = new.breathing_amplitude;
        self.oscillator.set_amplitude(new.breathing_amplitude);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The metrics record from the most recent frame
    pub fn metrics(&self) -> Result<&FrameMetrics> {
        if self.store.is_none() {
            return Err(EngineError::NotInitialized("metrics"));
        }
        Ok(&self.last_metrics)
    }

    /// Deep-copy particle snapshot for rendering or testing
    pub fn snapshot(&self, limit: Option<usize>) -> Result<ParticleSnapshot> {
        match &self.store {
            Some(store) => Ok(store.snapshot(limit)),
            None => Err(EngineError::NotInitialized("snapshot")),
        }
    }

    /// Writes per-particle colors produced by the external color-mapping
    /// collaborator; irrelevant to simulation invariants
    pub fn set_colors(&mut self, colors: &[[u8; 4]]) -> Result<()> {
        match &mut self.store {
            Some(store) => store.set_colors(colors),
            None => Err(EngineError::NotInitialized("set_colors")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DensityTier;

    const DT: f64 = 1.0 / 60.0;

    fn test_grid() -> PixelGrid {
        PixelGrid::new(32, 32, vec![[180, 90, 40]; 1024]).unwrap()
    }

    fn small_settings() -> Settings {
        Settings::new().with_density(DensityTier::Low).build().unwrap()
    }

    fn running_engine() -> SimulationEngine {
        let mut engine = SimulationEngine::new(small_settings());
        engine.init(&test_grid(), 0.0).unwrap();
        engine.start(0.0).unwrap();
        engine
    }

    /// Drives the engine until it reports `stage`, returning the time
    fn run_until_stage(engine: &mut SimulationEngine, stage: Stage, mut now: f64) -> f64 {
        for _ in 0..20_000 {
            now += DT;
            engine.step(now).unwrap();
            if engine.stage() == stage {
                return now;
            }
        }
        panic!("never reached stage {:?}", stage);
    }

    #[test]
    fn step_before_init_fails() {
        let mut engine = SimulationEngine::new(small_settings());
        assert!(matches!(
            engine.step(0.0),
            Err(EngineError::NotInitialized(_))
        ));
        assert!(engine.metrics().is_err());
        assert!(engine.snapshot(None).is_err());
    }

    #[test]
    fn positions_stay_in_bounds_across_all_stages() {
        let mut engine = running_engine();
        let mut now = 0.0;
        // long enough to walk burst -> chaos -> converging -> formation
        for _ in 0..1_200 {
            now += DT;
            engine.step(now).unwrap();
            let snap = engine.snapshot(Some(200)).unwrap();
            for p in &snap.position {
                assert!((0.0..=1.0).contains(&p.x), "x = {} in {:?}", p.x, engine.stage());
                assert!((0.0..=1.0).contains(&p.y), "y = {} in {:?}", p.y, engine.stage());
            }
        }
    }

    #[test]
    fn population_is_stable_across_steps() {
        let mut engine = running_engine();
        let before = engine.snapshot(None).unwrap().total_count;
        let mut now = 0.0;
        for _ in 0..300 {
            now += DT;
            engine.step(now).unwrap();
        }
        let snap = engine.snapshot(None).unwrap();
        assert_eq!(snap.total_count, before);
        assert_eq!(snap.active_count, before);
    }

    #[test]
    fn burst_scenario_reaches_chaos_within_fallback() {
        let settings = Settings::new()
            .with_density(DensityTier::Medium)
            .build()
            .unwrap();
        let mut engine = SimulationEngine::new(settings);
        engine.init(&test_grid(), 0.0).unwrap();
        engine.start(0.0).unwrap();

        let mut now = 0.0;
        for _ in 0..50 {
            now += DT;
            let metrics = engine.step(now).unwrap();
            assert!(metrics.chaos_energy >= 0.0);
            assert!(matches!(metrics.stage, Stage::Burst | Stage::Chaos));
        }
        let snap = engine.snapshot(Some(500)).unwrap();
        assert_eq!(snap.total_count, 9_000);
        for p in &snap.position {
            assert!((0.0..=1.0).contains(&p.x));
            assert!((0.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn engine_walks_the_full_stage_sequence() {
        let mut engine = running_engine();
        let now = run_until_stage(&mut engine, Stage::FinalBreathing, 0.0);
        assert!(now < 60.0, "took {}s to reach final breathing", now);
    }

    #[test]
    fn recognition_rises_through_convergence() {
        let mut engine = running_engine();
        let now = run_until_stage(&mut engine, Stage::Converging, 0.0);
        let early = engine.metrics().unwrap().recognition;
        run_until_stage(&mut engine, Stage::FinalBreathing, now);
        let formed = engine.metrics().unwrap().recognition;
        assert!(formed > early, "{} vs {}", formed, early);
        assert!(formed > 0.75, "image never formed: {}", formed);
    }

    #[test]
    fn formation_recognition_is_near_monotonic() {
        let mut engine = running_engine();
        let mut now = run_until_stage(&mut engine, Stage::Formation, 0.0);
        let mut last = engine.metrics().unwrap().recognition;
        while engine.stage() == Stage::Formation {
            now += DT;
            let metrics = engine.step(now).unwrap();
            if metrics.stage != Stage::Formation {
                break;
            }
            assert!(
                metrics.recognition >= last * 0.99,
                "recognition dipped {} -> {}",
                last,
                metrics.recognition
            );
            last = metrics.recognition;
        }
    }

    #[test]
    fn velocities_respect_the_stage_cap() {
        let mut engine = running_engine();
        let mut now = 0.0;
        for _ in 0..600 {
            // the cap in force during this step belongs to the stage the
            // physics ran in, not the stage a transition may land in
            let cap = engine.stage().velocity_cap();
            now += DT;
            engine.step(now).unwrap();
            if cap == 0.0 {
                continue;
            }
            let snap = engine.snapshot(Some(100)).unwrap();
            for v in &snap.velocity {
                let speed = (v.x * v.x + v.y * v.y).sqrt();
                assert!(speed <= cap + 1e-4, "speed {} over cap {}", speed, cap);
            }
        }
    }

    #[test]
    fn pause_makes_step_a_noop() {
        let mut engine = running_engine();
        let mut now = 0.0;
        for _ in 0..30 {
            now += DT;
            engine.step(now).unwrap();
        }
        let before = engine.snapshot(None).unwrap();
        engine.pause();
        assert_eq!(engine.lifecycle(), Lifecycle::Paused);
        engine.step(now + 100.0).unwrap();
        let after = engine.snapshot(None).unwrap();
        assert_eq!(before.position, after.position);

        engine.resume();
        engine.step(now + 100.0 + DT).unwrap();
        let moved = engine.snapshot(None).unwrap();
        assert_ne!(before.position, moved.position);
    }

    #[test]
    fn stop_is_terminal_for_stepping() {
        let mut engine = running_engine();
        engine.step(DT).unwrap();
        engine.stop();
        let before = engine.snapshot(None).unwrap();
        engine.step(10.0).unwrap();
        let after = engine.snapshot(None).unwrap();
        assert_eq!(before.position, after.position);
        // resume does not revive a stopped run
        engine.resume();
        assert_eq!(engine.lifecycle(), Lifecycle::Stopped);
    }

    #[test]
    fn restart_reseeds_and_runs() {
        let mut engine = running_engine();
        let mut now = 0.0;
        for _ in 0..100 {
            now += DT;
            engine.step(now).unwrap();
        }
        engine.restart(&test_grid(), now).unwrap();
        assert_eq!(engine.lifecycle(), Lifecycle::Running);
        assert_eq!(engine.stage(), Stage::Burst);
        let metrics = engine.step(now + DT).unwrap();
        assert_eq!(metrics.particle_count, 3_000);
    }

    #[test]
    fn mid_run_settings_apply_only_the_safe_subset() {
        let mut engine = running_engine();
        engine.step(DT).unwrap();
        assert_ne!(engine.stage(), Stage::PreStart);

        let new = Settings::new()
            .with_density(DensityTier::High)
            .with_hud(true)
            .with_locale("de")
            .with_breathing_amplitude(0.01)
            .build()
            .unwrap();
        engine.apply_settings(new);

        let current = engine.settings();
        // safe subset applied
        assert!(current.hud_enabled);
        assert_eq!(current.locale, "de");
        assert_eq!(current.breathing_amplitude, 0.01);
        // density change ignored mid-run
        assert_eq!(current.particle_count(), 3_000);
    }

    #[test]
    fn pre_start_accepts_all_settings() {
        let mut engine = SimulationEngine::new(small_settings());
        engine.init(&test_grid(), 0.0).unwrap();
        let new = Settings::new()
            .with_density(DensityTier::High)
            .build()
            .unwrap();
        engine.apply_settings(new);
        assert_eq!(engine.settings().particle_count(), 15_000);
    }

    #[test]
    fn final_breathing_keeps_the_image_recognizable() {
        let mut engine = running_engine();
        let mut now = run_until_stage(&mut engine, Stage::FinalBreathing, 0.0);
        let entering = engine.metrics().unwrap().recognition;
        for _ in 0..300 {
            now += DT;
            engine.step(now).unwrap();
        }
        let idling = engine.metrics().unwrap().recognition;
        assert!(
            idling > entering - 0.05,
            "breathing destroyed the image: {} -> {}",
            entering,
            idling
        );
    }

    #[test]
    fn loop_mode_cycles_back_to_burst() {
        let settings = Settings::new()
            .with_density(DensityTier::Low)
            .with_loop_mode(true)
            .with_breathing_pause(1.0)
            .build()
            .unwrap();
        let mut engine = SimulationEngine::new(settings);
        engine.init(&test_grid(), 0.0).unwrap();
        engine.start(0.0).unwrap();

        let now = run_until_stage(&mut engine, Stage::FinalBreathing, 0.0);
        // after the pause the cycle restarts through Burst
        let again = run_until_stage(&mut engine, Stage::Burst, now);
        assert!(again > now);
    }

    #[test]
    fn colors_pass_through_to_the_snapshot() {
        let mut engine = running_engine();
        let colors = vec![[10, 20, 30, 255]; 3_000];
        engine.set_colors(&colors).unwrap();
        let snap = engine.snapshot(Some(2)).unwrap();
        assert_eq!(snap.color[0], [10, 20, 30, 255]);

        // wrong length is rejected
        assert!(engine.set_colors(&[[0, 0, 0, 0]]).is_err());
    }

    #[test]
    fn snapshot_is_isolated_from_subsequent_steps() {
        let mut engine = running_engine();
        engine.step(DT).unwrap();
        let held = engine.snapshot(None).unwrap();
        for i in 2..30 {
            engine.step(i as f64 * DT).unwrap();
        }
        // the store moved on; the old snapshot did not follow it
        let fresh = engine.snapshot(None).unwrap();
        assert_ne!(held.position, fresh.position);
    }
}
