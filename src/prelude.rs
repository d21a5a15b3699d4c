//! # Stipple Prelude
//!
//! This module provides a convenient way to import commonly used types
//! from the engine. It's designed to reduce boilerplate imports in typical
//! driver loops and tests.
//!
//! ## Usage
//!
//! ```rust
//! use stipple::prelude::*;
//!
//! let settings = Settings::new().build().unwrap();
//! let engine = SimulationEngine::new(settings);
//! assert_eq!(engine.stage(), Stage::PreStart);
//! ```

// Re-export the engine and its lifecycle types
pub use crate::engine::{Lifecycle, SimulationEngine};
pub use crate::error::EngineError;

// Re-export configuration types
pub use crate::settings::{DensityTier, Settings, SpeedProfile};

// Re-export the stage machine
pub use crate::stage::{PolicyInput, Stage, StagePolicy};

// Re-export particle state and the image boundary type
pub use crate::particles::{ParticleSnapshot, ParticleStore, PixelGrid};

// Re-export the oscillator
pub use crate::oscillator::BreathingOscillator;

// Re-export frame metrics
pub use crate::performance::{FrameMetrics, FrameMonitor};

// Re-export common external dependencies
pub use cgmath::{InnerSpace, Vector2, Zero};

// Re-export common standard library types
pub use std::collections::VecDeque;
pub use std::time::Instant;
