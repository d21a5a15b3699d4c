//! # Frame Metrics
//!
//! Per-frame performance tracking and the metrics record handed to HUD
//! and logging collaborators. The engine never consumes these values
//! itself.
//!
//! ## Usage
//!
//! ```
//! use stipple::performance::FrameMonitor;
//!
//! let mut monitor = FrameMonitor::new();
//! monitor.begin_frame();
//! // ... advance the simulation ...
//! monitor.end_frame();
//! assert!(monitor.average_compute_ms() >= 0.0);
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::stage::Stage;

/// Per-frame metrics record for HUD and logging collaborators
#[derive(Clone, Debug)]
pub struct FrameMetrics {
    /// Rolling frames per second over the sample window
    pub fps: f32,
    /// FPS derived from the most recent frame alone
    pub instant_fps: f32,
    /// Compute time of the most recent frame in milliseconds
    pub frame_compute_ms: f32,
    pub particle_count: usize,
    pub active_count: usize,
    pub stage: Stage,
    pub recognition: f32,
    pub chaos_energy: f32,
    /// Seconds spent in the current stage
    pub stage_elapsed: f64,
    /// Seconds since the run was initialized
    pub total_elapsed: f64,
    /// Elapsed over expected stage duration, saturating at 1.0
    pub stage_progress: f32,
}

impl Default for FrameMetrics {
    fn default() -> Self {
        Self {
            fps: 0.0,
            instant_fps: 0.0,
            frame_compute_ms: 0.0,
            particle_count: 0,
            active_count: 0,
            stage: Stage::PreStart,
            recognition: 0.0,
            chaos_energy: 0.0,
            stage_elapsed: 0.0,
            total_elapsed: 0.0,
            stage_progress: 0.0,
        }
    }
}

/// Frame-time tracker with a rolling sample window
pub struct FrameMonitor {
    /// Ring buffer of recent frame compute times for averaging
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    frame_start: Option<Instant>,
    last_frame: Option<Duration>,
}

impl FrameMonitor {
    /// Creates a monitor holding ~2 seconds of samples at 60fps
    pub fn new() -> Self {
        Self::with_capacity(120)
    }

    /// Creates a monitor with a custom window size
    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            frame_start: None,
            last_frame: None,
        }
    }

    /// Marks the beginning of a frame
    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Marks the end of a frame and records its compute time
    pub fn end_frame(&mut self) {
        if let Some(start) = self.frame_start.take() {
            let frame_time = start.elapsed();
            if self.frame_times.len() >= self.max_samples {
                self.frame_times.pop_front();
            }
            self.frame_times.push_back(frame_time);
            self.last_frame = Some(frame_time);
        }
    }

    /// Rolling FPS over the sample window; 0.0 with no samples
    pub fn rolling_fps(&self) -> f32 {
        let avg = self.average_compute_ms();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }

    /// FPS implied by the most recent frame alone
    pub fn instant_fps(&self) -> f32 {
        match self.last_frame {
            Some(d) if d.as_secs_f32() > 0.0 => 1.0 / d.as_secs_f32(),
            _ => 0.0,
        }
    }

    /// Compute time of the most recent frame in milliseconds
    pub fn last_compute_ms(&self) -> f32 {
        self.last_frame
            .map(|d| d.as_secs_f32() * 1000.0)
            .unwrap_or(0.0)
    }

    /// Average compute time over the window in milliseconds
    pub fn average_compute_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let total: Duration = self.frame_times.iter().sum();
        total.as_secs_f32() * 1000.0 / self.frame_times.len() as f32
    }

    /// Clears all samples
    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.frame_start = None;
        self.last_frame = None;
    }
}

impl Default for FrameMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_monitor_reports_zero() {
        let monitor = FrameMonitor::new();
        assert_eq!(monitor.rolling_fps(), 0.0);
        assert_eq!(monitor.instant_fps(), 0.0);
        assert_eq!(monitor.average_compute_ms(), 0.0);
    }

    #[test]
    fn end_frame_without_begin_is_ignored() {
        let mut monitor = FrameMonitor::new();
        monitor.end_frame();
        assert_eq!(monitor.last_compute_ms(), 0.0);
    }

    #[test]
    fn frames_accumulate_into_the_window() {
        let mut monitor = FrameMonitor::with_capacity(4);
        for _ in 0..10 {
            monitor.begin_frame();
            std::thread::sleep(Duration::from_millis(1));
            monitor.end_frame();
        }
        assert!(monitor.average_compute_ms() >= 1.0);
        assert!(monitor.rolling_fps() > 0.0);
        assert!(monitor.instant_fps() > 0.0);
    }

    #[test]
    fn reset_clears_samples() {
        let mut monitor = FrameMonitor::new();
        monitor.begin_frame();
        monitor.end_frame();
        monitor.reset();
        assert_eq!(monitor.average_compute_ms(), 0.0);
    }
}
