//! Error types
//!
//! One enum per subsystem. Only `DecodeError` ever reaches the host as a
//! failure; everything else is either rejected up front (config, timelines)
//! or logged and recovered where it happens.

use std::path::PathBuf;

use thiserror::Error;

/// The audio for a track could not be analysed
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read track {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported or corrupt audio in {path}: {message}")]
    Format { path: PathBuf, message: String },
    #[error("track {path} contains no audio")]
    Empty { path: PathBuf },
    #[error("onset analysis failed: {0}")]
    Analysis(String),
}

/// A beat timeline violated its ordering invariants
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("beat {index} is not a finite number")]
    NonFinite { index: usize },
    #[error("beat {index} is negative ({value}s)")]
    Negative { index: usize, value: f64 },
    #[error("beat {index} ({value}s) comes before the previous beat ({previous}s)")]
    OutOfOrder {
        index: usize,
        previous: f64,
        value: f64,
    },
}

/// A level configuration that the engine refuses to run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("fall speed must be positive, got {0}")]
    FallSpeed(f32),
    #[error("a level needs at least one starting life")]
    NoLives,
    #[error("a level needs at least one spawn lane")]
    NoLanes,
    #[error("jar kind weights must not all be zero")]
    NoWeights,
    #[error("break animation needs at least one step of at least one frame")]
    BreakAnimation,
    #[error("click dwell must be a non-negative number of seconds, got {0}")]
    ClickDwell(f64),
    #[error("at least one active jar must be allowed")]
    JarLimit,
}

/// The scheduler could not place a new jar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("active jar limit of {limit} reached")]
    JarLimit { limit: usize },
}

/// JSON file storage failures
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
