//! # Batch Metric Functions
//!
//! Pure computations over the particle arrays. Chaos energy and the
//! recognition score are the two signals the stage policy consumes;
//! speed statistics feed the per-frame metrics record.
//!
//! All functions degrade gracefully: an empty particle set yields zero,
//! never an error or NaN.

use cgmath::{InnerSpace, Vector2};

/// Perceptual exponent applied to the averaged proximity, emphasizing
/// gains late in convergence
const RECOGNITION_EXPONENT: f32 = 0.7;

/// Scene diagonal of the unit square
const SCENE_DIAGONAL: f32 = std::f32::consts::SQRT_2;

/// Mean squared speed over all particles
///
/// A relative progress signal for the CHAOS stage, not a physical
/// quantity. Returns 0.0 for an empty set.
pub fn chaos_energy(velocities: &[Vector2<f32>]) -> f32 {
    if velocities.is_empty() {
        return 0.0;
    }
    let total: f32 = velocities.iter().map(|v| v.magnitude2()).sum();
    total / velocities.len() as f32
}

/// Aggregate proximity of positions to their assigned targets, in [0, 1]
///
/// Per-particle Euclidean distance is normalized by the scene diagonal,
/// inverted to a proximity, averaged, then raised to a perceptual
/// exponent. 1.0 means every particle sits exactly on its target; 0.0
/// means maximal diagonal separation (or an empty set).
pub fn recognition_score(positions: &[Vector2<f32>], targets: &[Vector2<f32>]) -> f32 {
    if positions.is_empty() || positions.len() != targets.len() {
        return 0.0;
    }
    let total: f32 = positions
        .iter()
        .zip(targets)
        .map(|(p, t)| 1.0 - (p - t).magnitude() / SCENE_DIAGONAL)
        .sum();
    let mean = (total / positions.len() as f32).clamp(0.0, 1.0);
    mean.powf(RECOGNITION_EXPONENT).clamp(0.0, 1.0)
}

/// Velocity-magnitude statistics for the per-frame metrics record
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeedStats {
    pub mean: f32,
    pub max: f32,
    pub rms: f32,
}

/// Computes mean, max, and RMS speed; all zero for an empty set
pub fn speed_stats(velocities: &[Vector2<f32>]) -> SpeedStats {
    if velocities.is_empty() {
        return SpeedStats::default();
    }
    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    let mut max = 0.0f32;
    for v in velocities {
        let speed = v.magnitude();
        sum += speed;
        sum_sq += speed * speed;
        max = max.max(speed);
    }
    let n = velocities.len() as f32;
    SpeedStats {
        mean: sum / n,
        max,
        rms: (sum_sq / n).sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chaos_energy_of_empty_set_is_zero() {
        assert_eq!(chaos_energy(&[]), 0.0);
    }

    #[test]
    fn chaos_energy_is_mean_squared_speed() {
        let velocities = vec![Vector2::new(3.0, 4.0), Vector2::new(0.0, 0.0)];
        // speeds 5 and 0, mean of squares = 12.5
        assert!((chaos_energy(&velocities) - 12.5).abs() < 1e-6);
    }

    #[test]
    fn recognition_is_one_at_targets() {
        let positions = vec![Vector2::new(0.2, 0.8), Vector2::new(0.9, 0.1)];
        let targets = positions.clone();
        assert!((recognition_score(&positions, &targets) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn recognition_is_zero_at_maximal_separation() {
        let positions = vec![Vector2::new(0.0, 0.0)];
        let targets = vec![Vector2::new(1.0, 1.0)];
        assert!(recognition_score(&positions, &targets) < 1e-6);
    }

    #[test]
    fn recognition_of_empty_set_is_zero() {
        assert_eq!(recognition_score(&[], &[]), 0.0);
    }

    #[test]
    fn recognition_never_nan_for_finite_inputs() {
        let positions = vec![Vector2::new(0.0, 1.0), Vector2::new(1.0, 0.0)];
        let targets = vec![Vector2::new(1.0, 0.0), Vector2::new(0.5, 0.5)];
        let score = recognition_score(&positions, &targets);
        assert!(score.is_finite());
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn recognition_curve_emphasizes_late_gains() {
        // halfway proximity reads better than linear under the 0.7 exponent
        let positions = vec![Vector2::new(0.5, 0.5)];
        let targets = vec![Vector2::new(1.0, 1.0)];
        let score = recognition_score(&positions, &targets);
        let linear = 1.0 - (0.5f32 * 0.5 * 2.0).sqrt() / SCENE_DIAGONAL;
        assert!(score > linear);
    }

    #[test]
    fn speed_stats_match_hand_computation() {
        let velocities = vec![Vector2::new(3.0, 4.0), Vector2::new(0.0, 1.0)];
        let stats = speed_stats(&velocities);
        assert!((stats.mean - 3.0).abs() < 1e-6);
        assert!((stats.max - 5.0).abs() < 1e-6);
        assert!((stats.rms - (13.0f32).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn speed_stats_of_empty_set_are_zero() {
        let stats = speed_stats(&[]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.max, 0.0);
        assert_eq!(stats.rms, 0.0);
    }
}
