//! Particle storage, initialization, and batch metrics
//!
//! Flat per-particle arrays owned by the engine, the image-to-target
//! mapping that seeds them, and the pure batch computations (chaos energy,
//! recognition score) the stage policy consumes.

pub mod init;
pub mod metrics;
pub mod store;

pub use init::PixelGrid;
pub use metrics::{chaos_energy, recognition_score, speed_stats, SpeedStats};
pub use store::{ParticleSnapshot, ParticleStore};
