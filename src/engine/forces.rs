//! # Per-Stage Force Rules
//!
//! Each animation stage applies a distinct attraction/noise/damping
//! profile. The rules here mutate velocities in place; the engine owns
//! integration order, velocity capping, and bounds clamping.
//!
//! Zero-length direction vectors contribute no force rather than dividing
//! by zero.

use cgmath::{InnerSpace, Vector2};
use rand::Rng;

use crate::particles::ParticleStore;
use crate::stage::Stage;

/// Distances below this are treated as "already there" - no force
const MIN_DISTANCE: f32 = 0.001;

/// Physics constants for one run, derived from settings at initialization
#[derive(Clone, Copy, Debug)]
pub struct PhysicsParams {
    /// Base attraction strength toward targets, scene units per s^2
    pub attraction: f32,
    /// Base noise acceleration magnitude
    pub noise: f32,
    /// Outward burst acceleration at zero stage progress
    pub burst_strength: f32,
    /// Velocity impulse per burst wave
    pub wave_kick: f32,
    /// Fixed integration step in seconds, already speed-multiplied
    pub time_step: f32,
}

impl PhysicsParams {
    /// Derives run constants from the speed multiplier
    pub fn new(speed_multiplier: f32) -> Self {
        Self {
            attraction: 4.0,
            noise: 1.5,
            burst_strength: 3.0,
            wave_kick: 0.6,
            time_step: (1.0 / 60.0) * speed_multiplier,
        }
    }
}

/// Attraction/noise/damping scaling for one stage
#[derive(Clone, Copy, Debug)]
pub struct StageProfile {
    pub attraction_scale: f32,
    pub noise_scale: f32,
    /// Per-frame velocity damping factor
    pub damping: f32,
}

/// The force profile applied while in `stage`
pub fn stage_profile(stage: Stage) -> StageProfile {
    match stage {
        Stage::PreStart => StageProfile {
            attraction_scale: 0.0,
            noise_scale: 0.0,
            damping: 1.0,
        },
        Stage::Burst => StageProfile {
            attraction_scale: 0.0,
            noise_scale: 0.3,
            damping: 0.995,
        },
        Stage::Chaos => StageProfile {
            attraction_scale: 0.3,
            noise_scale: 1.0,
            damping: 0.98,
        },
        Stage::Converging => StageProfile {
            attraction_scale: 1.0,
            noise_scale: 0.25,
            damping: 0.95,
        },
        // strongest, most heavily damped pull - the image locks in here
        Stage::Formation => StageProfile {
            attraction_scale: 3.0,
            noise_scale: 0.0,
            damping: 0.85,
        },
        Stage::FinalBreathing => StageProfile {
            attraction_scale: 0.0,
            noise_scale: 0.0,
            damping: 0.8,
        },
    }
}

/// Outward push from the nearest burst center, decaying with stage progress
pub fn apply_burst(
    store: &mut ParticleStore,
    centers: &[Vector2<f32>],
    strength: f32,
    progress: f32,
    dt: f32,
) {
    if centers.is_empty() {
        return;
    }
    let accel = strength * (1.0 - progress).max(0.0);
    if accel <= 0.0 {
        return;
    }
    let n = store.len();
    for i in 0..n {
        let p = store.positions()[i];
        let away = p - nearest_center(p, centers);
        let dist = away.magnitude();
        if dist > MIN_DISTANCE {
            store.velocities_mut()[i] += away / dist * accel * dt;
        }
    }
}

/// One discrete burst wave: an outward velocity impulse from the nearest
/// center, with per-particle random magnitude
pub fn apply_wave_kick(store: &mut ParticleStore, centers: &[Vector2<f32>], kick: f32) {
    if centers.is_empty() {
        return;
    }
    let mut rng = rand::rng();
    let n = store.len();
    for i in 0..n {
        let p = store.positions()[i];
        let away = p - nearest_center(p, centers);
        let dist = away.magnitude();
        let strength = kick * (0.5 + rng.random::<f32>());
        let dir = if dist > MIN_DISTANCE {
            away / dist
        } else {
            // particle sitting on a center: kick in a random direction
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            Vector2::new(angle.cos(), angle.sin())
        };
        store.velocities_mut()[i] += dir * strength;
    }
}

/// Pull toward each particle's assigned target
pub fn apply_target_attraction(store: &mut ParticleStore, attraction: f32, dt: f32) {
    if attraction <= 0.0 {
        return;
    }
    let n = store.len();
    for i in 0..n {
        let toward = store.targets()[i] - store.positions()[i];
        let dist = toward.magnitude();
        if dist > MIN_DISTANCE {
            store.velocities_mut()[i] += toward * attraction * dt;
        }
    }
}

/// Uniform random acceleration, the chaotic wander component
pub fn apply_noise(store: &mut ParticleStore, noise: f32, dt: f32) {
    if noise <= 0.0 {
        return;
    }
    let mut rng = rand::rng();
    for v in store.velocities_mut() {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let magnitude = rng.random::<f32>() * noise;
        *v += Vector2::new(angle.cos(), angle.sin()) * magnitude * dt;
    }
}

fn nearest_center(p: Vector2<f32>, centers: &[Vector2<f32>]) -> Vector2<f32> {
    let mut best = centers[0];
    let mut best_d2 = (p - best).magnitude2();
    for c in &centers[1..] {
        let d2 = (p - c).magnitude2();
        if d2 < best_d2 {
            best = *c;
            best_d2 = d2;
        }
    }
    best
}
