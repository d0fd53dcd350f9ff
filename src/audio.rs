//! Audio channel abstraction
//!
//! The engine only needs transport controls for one music track. Actual
//! playback belongs to the host; [`SilentChannel`] tracks transport state
//! without producing sound, for headless runs and tests.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// A track could not be opened for playback
#[derive(Debug, Error)]
#[error("cannot play {path}: {reason}")]
pub struct AudioError {
    pub path: PathBuf,
    pub reason: String,
}

/// Transport controls for a single audio track
pub trait AudioChannel {
    /// Open a track, replacing whatever was loaded
    fn load(&mut self, track: &Path) -> Result<(), AudioError>;
    fn play(&mut self);
    fn pause(&mut self);
    fn unpause(&mut self);
    fn stop(&mut self);
    /// Volume in [0, 1]; implementations clamp
    fn set_volume(&mut self, volume: f32);
}

/// Playback state of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Channel that follows transport commands without making sound
#[derive(Debug, Default)]
pub struct SilentChannel {
    track: Option<PathBuf>,
    transport: Transport,
    volume: f32,
}

impl SilentChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn track(&self) -> Option<&Path> {
        self.track.as_deref()
    }
}

impl AudioChannel for SilentChannel {
    fn load(&mut self, track: &Path) -> Result<(), AudioError> {
        if !track.exists() {
            return Err(AudioError {
                path: track.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }
        log::debug!("Silent channel loaded {}", track.display());
        self.track = Some(track.to_path_buf());
        self.transport = Transport::Stopped;
        Ok(())
    }

    fn play(&mut self) {
        if self.track.is_some() {
            self.transport = Transport::Playing;
        }
    }

    fn pause(&mut self) {
        if self.transport == Transport::Playing {
            self.transport = Transport::Paused;
        }
    }

    fn unpause(&mut self) {
        if self.transport == Transport::Paused {
            self.transport = Transport::Playing;
        }
    }

    fn stop(&mut self) {
        self.transport = Transport::Stopped;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}
