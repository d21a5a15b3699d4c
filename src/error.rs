//! Error types surfaced by the simulation core
//!
//! The core deliberately keeps its error surface small: most anomalies are
//! handled by graceful degradation (empty particle sets yield zero-valued
//! metrics, fallback timeouts force stage progress) rather than propagation.

use thiserror::Error;

/// Errors produced by the simulation engine and particle store
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine was asked to step or report metrics before `init`
    #[error("engine not initialized: {0}")]
    NotInitialized(&'static str),

    /// A caller-supplied argument was rejected
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal array shapes disagree - a programming fault, not recoverable
    #[error("consistency fault: {0}")]
    Consistency(String),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, EngineError>;
