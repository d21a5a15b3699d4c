//! # Particle Store
//!
//! Owns all per-particle memory as flat, contiguous arrays: position,
//! velocity, target position, color, and active flags. Positions live in
//! normalized scene coordinates and are clamped back into the unit square
//! after every mutation. The store is exclusively owned and mutated in
//! place by the engine; external consumers only ever see deep-copy
//! snapshots.

use cgmath::{InnerSpace, Vector2, Zero};

use crate::error::{EngineError, Result};

/// Flat per-particle arrays for one running animation
///
/// The particle count is fixed for the lifetime of one initialized run;
/// changing density requires a full reallocation and target re-derivation.
pub struct ParticleStore {
    position: Vec<Vector2<f32>>,
    velocity: Vec<Vector2<f32>>,
    target: Vec<Vector2<f32>>,
    color: Vec<[u8; 4]>,
    active: Vec<bool>,
    /// Reserved for partial-dissolve behavior; currently always zero
    stage_mask: Vec<u8>,
}

/// Deep-copy view of particle state handed to renderers, HUDs, and tests
///
/// Never a live alias into the store, so a rendering thread can hold one
/// across the next `step()` without racing.
#[derive(Clone, Debug)]
pub struct ParticleSnapshot {
    pub position: Vec<Vector2<f32>>,
    pub velocity: Vec<Vector2<f32>>,
    pub target: Vec<Vector2<f32>>,
    pub color: Vec<[u8; 4]>,
    pub total_count: usize,
    pub active_count: usize,
}

impl ParticleStore {
    /// Allocates a store of `count` particles, all at the scene center
    ///
    /// Velocities and targets start zeroed; every particle is active.
    /// A non-positive count is an [`EngineError::InvalidArgument`].
    pub fn allocate(count: usize) -> Result<Self> {
        if count == 0 {
            return Err(EngineError::InvalidArgument(
                "particle count must be positive".to_string(),
            ));
        }
        Ok(Self {
            position: vec![Vector2::new(0.5, 0.5); count],
            velocity: vec![Vector2::zero(); count],
            target: vec![Vector2::zero(); count],
            color: vec![[255, 255, 255, 255]; count],
            active: vec![true; count],
            stage_mask: vec![0; count],
        })
    }

    /// Number of particles in the store
    pub fn len(&self) -> usize {
        self.position.len()
    }

    /// Always false for a successfully allocated store
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Number of active particles
    ///
    /// In the current contract no particle is ever deactivated, so this
    /// equals `len()` for the lifetime of a run.
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }

    pub fn positions(&self) -> &[Vector2<f32>] {
        &self.position
    }

    pub fn positions_mut(&mut self) -> &mut [Vector2<f32>] {
        &mut self.position
    }

    pub fn velocities(&self) -> &[Vector2<f32>] {
        &self.velocity
    }

    pub fn velocities_mut(&mut self) -> &mut [Vector2<f32>] {
        &mut self.velocity
    }

    pub fn targets(&self) -> &[Vector2<f32>] {
        &self.target
    }

    pub fn targets_mut(&mut self) -> &mut [Vector2<f32>] {
        &mut self.target
    }

    /// Writes colors produced by the external color-mapping collaborator
    ///
    /// The slice length must match the particle count.
    pub fn set_colors(&mut self, colors: &[[u8; 4]]) -> Result<()> {
        if colors.len() != self.color.len() {
            return Err(EngineError::InvalidArgument(format!(
                "color count {} does not match particle count {}",
                colors.len(),
                self.color.len()
            )));
        }
        self.color.copy_from_slice(colors);
        Ok(())
    }

    /// Projects every position back into the unit square, in place
    pub fn clamp_positions(&mut self) {
        for p in &mut self.position {
            p.x = p.x.clamp(0.0, 1.0);
            p.y = p.y.clamp(0.0, 1.0);
        }
    }

    /// Caps every velocity magnitude at `max_v`, preserving direction
    ///
    /// Vectors at or under the cap are left numerically untouched;
    /// over-cap vectors are rescaled by `max_v / |v|`.
    pub fn clamp_velocities(&mut self, max_v: f32) {
        for v in &mut self.velocity {
            let speed = v.magnitude();
            if speed > max_v {
                *v *= max_v / speed;
            }
        }
    }

    /// Multiplies every velocity by a uniform damping factor
    pub fn apply_damping(&mut self, factor: f32) {
        for v in &mut self.velocity {
            *v *= factor;
        }
    }

    /// Returns a deep-copy snapshot, optionally truncated to `limit` particles
    pub fn snapshot(&self, limit: Option<usize>) -> ParticleSnapshot {
        let take = limit.unwrap_or(self.len()).min(self.len());
        ParticleSnapshot {
            position: self.position[..take].to_vec(),
            velocity: self.velocity[..take].to_vec(),
            target: self.target[..take].to_vec(),
            color: self.color[..take].to_vec(),
            total_count: self.len(),
            active_count: self.active_count(),
        }
    }

    /// Verifies that every array still has the same length
    ///
    /// A mismatch is an internal programming fault, never reachable from
    /// external input.
    pub fn check_consistency(&self) -> Result<()> {
        let n = self.position.len();
        if self.velocity.len() != n
            || self.target.len() != n
            || self.color.len() != n
            || self.active.len() != n
            || self.stage_mask.len() != n
        {
            return Err(EngineError::Consistency(format!(
                "array shapes diverged: pos={} vel={} tgt={} col={} act={} mask={}",
                n,
                self.velocity.len(),
                self.target.len(),
                self.color.len(),
                self.active.len(),
                self.stage_mask.len()
            )));
        }
        Ok(())
    }
}
