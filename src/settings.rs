//! Player settings
//!
//! Persisted as a flat JSON map of volume sliders. The engine never reads
//! this file; the host hands it a volume via [`Settings::get_volume`].

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Volume step used by the settings screen arrows
pub const VOLUME_STEP: f32 = 0.1;
/// Volume restored when toggling a muted channel back on
pub const UNMUTED_VOLUME: f32 = 0.5;

/// Audio channels with their own volume slider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Music,
    Effects,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Music => "Music",
            Channel::Effects => "Effects",
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Background song volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Jar smash effect volume (0.0 - 1.0)
    pub effects_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_volume: 0.5,
            effects_volume: 0.5,
        }
    }
}

impl Settings {
    /// Current volume of a channel, always within [0, 1]
    pub fn get_volume(&self, channel: Channel) -> f32 {
        let v = match channel {
            Channel::Music => self.music_volume,
            Channel::Effects => self.effects_volume,
        };
        if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
    }

    pub fn set_volume(&mut self, channel: Channel, volume: f32) {
        // Round to the slider grid so repeated steps don't drift
        let volume = (volume.clamp(0.0, 1.0) * 100.0).round() / 100.0;
        match channel {
            Channel::Music => self.music_volume = volume,
            Channel::Effects => self.effects_volume = volume,
        }
    }

    pub fn increase_volume(&mut self, channel: Channel) {
        self.set_volume(channel, self.get_volume(channel) + VOLUME_STEP);
    }

    pub fn decrease_volume(&mut self, channel: Channel) {
        self.set_volume(channel, self.get_volume(channel) - VOLUME_STEP);
    }

    /// Mute, or restore a muted channel to half volume
    pub fn toggle_volume(&mut self, channel: Channel) {
        let next = if self.get_volume(channel) == 0.0 {
            UNMUTED_VOLUME
        } else {
            0.0
        };
        self.set_volume(channel, next);
    }

    /// Slider caption, e.g. "Music: 50"
    pub fn volume_label(&self, channel: Channel) -> String {
        format!("{}: {:.0}", channel.as_str(), self.get_volume(channel) * 100.0)
    }

    /// Load settings from disk, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match crate::persistence::read_json(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::info!("Using default settings ({e})");
                Self::default()
            }
        }
    }

    /// Save settings to disk (failures are logged, not fatal)
    pub fn save(&self, path: &Path) {
        match crate::persistence::write_json_atomic(path, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_steps_clamp() {
        let mut s = Settings::default();
        for _ in 0..8 {
            s.increase_volume(Channel::Music);
        }
        assert_eq!(s.get_volume(Channel::Music), 1.0);
        for _ in 0..12 {
            s.decrease_volume(Channel::Music);
        }
        assert_eq!(s.get_volume(Channel::Music), 0.0);
        assert_eq!(s.get_volume(Channel::Effects), 0.5);
    }

    #[test]
    fn test_toggle_mutes_and_restores() {
        let mut s = Settings::default();
        s.increase_volume(Channel::Effects);
        s.toggle_volume(Channel::Effects);
        assert_eq!(s.get_volume(Channel::Effects), 0.0);
        s.toggle_volume(Channel::Effects);
        assert_eq!(s.get_volume(Channel::Effects), UNMUTED_VOLUME);
    }

    #[test]
    fn test_label() {
        let mut s = Settings::default();
        s.increase_volume(Channel::Music);
        assert_eq!(s.volume_label(Channel::Music), "Music: 60");
    }

    #[test]
    fn test_out_of_range_file_values_are_clamped() {
        let s: Settings = serde_json::from_str(r#"{"music_volume": 3.0}"#).unwrap();
        assert_eq!(s.get_volume(Channel::Music), 1.0);
        assert_eq!(s.get_volume(Channel::Effects), 0.5);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut s = Settings::default();
        s.toggle_volume(Channel::Music);
        s.save(&path);
        assert_eq!(Settings::load(&path), s);
    }

    #[test]
    fn test_corrupt_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }
}
