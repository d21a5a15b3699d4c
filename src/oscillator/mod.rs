//! # Breathing Oscillator
//!
//! A stateful periodic-signal generator used two ways: as the final idle
//! effect (a small radial "breathing" of particle positions around a
//! center) and as a self-regulating amplitude controller via RMS tracking
//! over a rolling window of recent samples.
//!
//! The instantaneous signal is `amplitude * exp(-decay * t) *
//! sin(2pi * frequency * t + phase)`, so its magnitude never exceeds the
//! configured amplitude for any elapsed time.

use std::collections::VecDeque;

use cgmath::Vector2;
use rand::Rng;

/// Lowest accepted frequency in Hz
const MIN_FREQUENCY: f32 = 0.1;

/// Per-particle time jitter applied in batch evaluation, seconds
const BATCH_JITTER: f32 = 0.1;

/// Number of recent samples retained for RMS computation
const RMS_WINDOW: usize = 120;

/// Configurable breathing-signal generator with RMS self-adjustment
pub struct BreathingOscillator {
    frequency: f32,
    amplitude: f32,
    phase: f32,
    decay: f32,
    /// Time base subtracted from every evaluation, set by `reset`
    time_offset: f64,
    /// Most-recent oscillation samples feeding RMS tracking
    samples: VecDeque<f32>,
}

impl BreathingOscillator {
    /// Creates an oscillator; frequency is floored, amplitude clamped to
    /// [0, 1], decay clamped non-negative
    pub fn new(frequency: f32, amplitude: f32, phase: f32, decay: f32) -> Self {
        Self {
            frequency: frequency.max(MIN_FREQUENCY),
            amplitude: amplitude.clamp(0.0, 1.0),
            phase,
            decay: decay.max(0.0),
            time_offset: 0.0,
            samples: VecDeque::with_capacity(RMS_WINDOW),
        }
    }

    /// Reconfigures frequency and amplitude without touching the clock
    pub fn configure(&mut self, frequency: f32, amplitude: f32) {
        self.frequency = frequency.max(MIN_FREQUENCY);
        self.amplitude = amplitude.clamp(0.0, 1.0);
    }

    /// Sets the amplitude alone, clamped to [0, 1]
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude.clamp(0.0, 1.0);
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Re-bases the internal clock to `offset` without discarding
    /// configuration; also clears the RMS window
    pub fn reset(&mut self, offset: f64) {
        self.time_offset = offset;
        self.samples.clear();
    }

    /// Evaluates the oscillation at absolute time `t`
    pub fn oscillation(&self, t: f64) -> f32 {
        self.eval((t - self.time_offset) as f32)
    }

    fn eval(&self, local_t: f32) -> f32 {
        let t = local_t.max(0.0);
        self.amplitude
            * (-self.decay * t).exp()
            * (std::f32::consts::TAU * self.frequency * t + self.phase).sin()
    }

    /// Evaluates one oscillation per particle with independent time jitter
    ///
    /// Each particle's effective time is perturbed by up to ±0.1 s so a
    /// large ensemble does not breathe in perfect lock-step. The batch
    /// mean is pushed into the RMS window.
    pub fn batch_oscillation(&mut self, t: f64, count: usize) -> Vec<f32> {
        let local_t = (t - self.time_offset) as f32;
        let mut rng = rand::rng();
        let values: Vec<f32> = (0..count)
            .map(|_| {
                let jitter = (rng.random::<f32>() * 2.0 - 1.0) * BATCH_JITTER;
                self.eval(local_t + jitter)
            })
            .collect();

        if !values.is_empty() {
            let mean = values.iter().sum::<f32>() / values.len() as f32;
            self.push_sample(mean);
        }
        values
    }

    /// Scales each position's offset from `center` by `1 + oscillation_i`
    ///
    /// Returns new positions; the caller is responsible for clamping them
    /// back into scene bounds.
    pub fn radial_breathing(
        &mut self,
        t: f64,
        center: Vector2<f32>,
        positions: &[Vector2<f32>],
    ) -> Vec<Vector2<f32>> {
        let oscillations = self.batch_oscillation(t, positions.len());
        positions
            .iter()
            .zip(&oscillations)
            .map(|(p, osc)| center + (p - center) * (1.0 + osc))
            .collect()
    }

    fn push_sample(&mut self, sample: f32) {
        if self.samples.len() >= RMS_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Root-mean-square of the rolling sample window; 0.0 when empty
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = self.samples.iter().map(|s| s * s).sum();
        (sum_sq / self.samples.len() as f32).sqrt()
    }

    /// Nudges amplitude proportionally toward a target RMS
    ///
    /// `rate` scales the correction per call; the result stays in [0, 1].
    /// A no-op while the sample window is empty.
    pub fn auto_adjust_amplitude(&mut self, target_rms: f32, rate: f32) {
        let current = self.rms();
        if current <= 0.0 {
            return;
        }
        let error = target_rms - current;
        self.amplitude = (self.amplitude + error * rate).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oscillation_magnitude_never_exceeds_amplitude() {
        let osc = BreathingOscillator::new(1.3, 0.02, 0.7, 0.0);
        let mut t = 0.0;
        while t < 30.0 {
            assert!(osc.oscillation(t).abs() <= 0.02 + 1e-7, "t = {}", t);
            t += 0.0137;
        }
    }

    #[test]
    fn decay_shrinks_the_envelope() {
        let osc = BreathingOscillator::new(1.0, 0.5, std::f32::consts::FRAC_PI_2, 0.5);
        // peak at t=0 (sin(phase)=1), envelope below amplitude afterwards
        assert!((osc.oscillation(0.0) - 0.5).abs() < 1e-6);
        assert!(osc.oscillation(4.0).abs() < 0.5 * (-2.0f32).exp() + 1e-6);
    }

    #[test]
    fn frequency_is_floored() {
        let osc = BreathingOscillator::new(0.0, 0.1, 0.0, 0.0);
        assert_eq!(osc.frequency(), 0.1);
    }

    #[test]
    fn reset_rebases_the_clock() {
        let mut osc = BreathingOscillator::new(1.0, 0.5, std::f32::consts::FRAC_PI_2, 0.0);
        let at_zero = osc.oscillation(0.0);
        osc.reset(100.0);
        // same local time after re-basing
        assert!((osc.oscillation(100.0) - at_zero).abs() < 1e-6);
        assert_eq!(osc.amplitude(), 0.5);
    }

    #[test]
    fn batch_values_stay_bounded_and_vary() {
        let mut osc = BreathingOscillator::new(2.0, 0.03, 0.0, 0.0);
        let values = osc.batch_oscillation(1.0, 500);
        assert_eq!(values.len(), 500);
        for v in &values {
            assert!(v.abs() <= 0.03 + 1e-7);
        }
        // jitter keeps the ensemble out of lock-step
        let first = values[0];
        assert!(values.iter().any(|v| (v - first).abs() > 1e-6));
    }

    #[test]
    fn undamped_rms_approaches_amplitude_over_sqrt_two() {
        let mut osc = BreathingOscillator::new(1.0, 0.5, 0.0, 0.0);
        // sample many cycles; batch of 1 keeps jitter noise visible but small
        let mut t = 0.0;
        for _ in 0..RMS_WINDOW {
            osc.batch_oscillation(t, 200);
            t += 0.093;
        }
        let expected = 0.5 / std::f32::consts::SQRT_2;
        let rms = osc.rms();
        assert!(
            (rms - expected).abs() / expected < 0.15,
            "rms {} vs expected {}",
            rms,
            expected
        );
    }

    #[test]
    fn radial_breathing_scales_offsets_from_center() {
        let mut osc = BreathingOscillator::new(1.0, 0.02, 0.0, 0.0);
        let center = Vector2::new(0.5, 0.5);
        let positions = vec![Vector2::new(0.7, 0.5), Vector2::new(0.5, 0.3)];
        let moved = osc.radial_breathing(0.25, center, &positions);
        assert_eq!(moved.len(), 2);
        for (orig, new) in positions.iter().zip(&moved) {
            let before = orig - center;
            let after = new - center;
            // offsets scale by at most 1 +/- amplitude
            let ratio = (after.x * after.x + after.y * after.y).sqrt()
                / (before.x * before.x + before.y * before.y).sqrt();
            assert!((ratio - 1.0).abs() <= 0.02 + 1e-6);
        }
    }

    #[test]
    fn auto_adjust_moves_amplitude_toward_target() {
        let mut osc = BreathingOscillator::new(1.0, 0.2, 0.0, 0.0);
        let mut t = 0.0;
        for _ in 0..60 {
            osc.batch_oscillation(t, 50);
            t += 0.07;
        }
        let before = osc.amplitude();
        // current RMS is ~0.14; ask for much more
        osc.auto_adjust_amplitude(0.5, 0.5);
        assert!(osc.amplitude() > before);

        // and back down
        let high = osc.amplitude();
        osc.auto_adjust_amplitude(0.0, 0.5);
        assert!(osc.amplitude() < high);
    }

    #[test]
    fn auto_adjust_is_a_noop_with_empty_window() {
        let mut osc = BreathingOscillator::new(1.0, 0.2, 0.0, 0.0);
        osc.auto_adjust_amplitude(0.5, 1.0);
        assert_eq!(osc.amplitude(), 0.2);
    }
}
