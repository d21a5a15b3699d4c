// src/lib.rs
//! Stipple
//!
//! A particle image-formation animation engine. A fixed population of
//! point particles bursts outward from a center, wanders chaotically,
//! converges, and settles into the silhouette of a target image, then
//! idles with a small breathing oscillation.
//!
//! The crate is the simulation core only: it produces per-particle
//! position/velocity/color state for an external renderer to draw.
//! Image decoding, color assignment, HUD rendering, and command handling
//! are collaborators layered on top.

pub mod engine;
pub mod error;
pub mod oscillator;
pub mod particles;
pub mod performance;
pub mod prelude;
pub mod settings;
pub mod stage;

// Re-export main types for convenience
pub use engine::SimulationEngine;
pub use error::EngineError;
pub use settings::Settings;
pub use stage::Stage;

/// Creates an engine with default settings
pub fn default() -> SimulationEngine {
    SimulationEngine::new(Settings::default())
}
