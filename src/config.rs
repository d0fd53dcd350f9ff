//! Level configuration
//!
//! Everything a level needs besides its beat timeline. Loadable from JSON so
//! custom levels can be played from the command line.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, PersistenceError};
use crate::lane_x;

/// Static parameters of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Display name (also keys high score entries)
    pub name: String,
    /// Background song the beats are extracted from
    pub track: PathBuf,
    /// Pixels a falling jar moves per tick
    pub fall_speed: f32,
    pub starting_lives: u8,
    /// Points per scoring jar smashed by a click
    pub reward: u64,
    /// Relative spawn weight of the hazard jar
    pub hazard_weight: u32,
    /// Relative spawn weight of each scoring jar kind
    pub score_weight: u32,
    /// Minimum seconds between accepted clicks
    pub click_dwell: f64,
    pub break_steps: u8,
    pub frames_per_break_step: u8,
    /// Left edge of each spawn lane
    pub lanes: Vec<f32>,
    /// A falling jar whose top passes this line is missed
    pub floor_y: f32,
    pub max_active_jars: usize,
    /// Seed for lane and kind selection
    pub seed: u64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            name: "Custom Level".to_string(),
            track: PathBuf::new(),
            fall_speed: 5.0,
            starting_lives: DEFAULT_LIVES,
            reward: DEFAULT_REWARD,
            hazard_weight: DEFAULT_HAZARD_WEIGHT,
            score_weight: DEFAULT_SCORE_WEIGHT,
            click_dwell: DEFAULT_CLICK_DWELL,
            break_steps: DEFAULT_BREAK_STEPS,
            frames_per_break_step: FRAMES_PER_ANIMATION,
            lanes: (0..LANE_COUNT).map(lane_x).collect(),
            floor_y: PLAYFIELD_HEIGHT,
            max_active_jars: MAX_ACTIVE_JARS,
            seed: 0x6a61_7273,
        }
    }
}

impl LevelConfig {
    pub fn new(name: impl Into<String>, track: impl Into<PathBuf>, fall_speed: f32) -> Self {
        Self {
            name: name.into(),
            track: track.into(),
            fall_speed,
            ..Self::default()
        }
    }

    /// The three built-in levels, tracks resolved against `sounds_dir`
    pub fn presets(sounds_dir: &Path) -> Vec<Self> {
        vec![
            Self::new("Level One", sounds_dir.join("ode-to-joy.ogg"), 5.0),
            Self::new("Level Two", sounds_dir.join("rushE.ogg"), 6.0),
            Self::new("Level Three", sounds_dir.join("gamemusic-6082.ogg"), 7.0),
        ]
    }

    /// Load a level description from a JSON file (missing fields take defaults)
    pub fn from_json_file(path: &Path) -> Result<Self, PersistenceError> {
        crate::persistence::read_json(path)
    }

    /// Spawn weights in `JarKind::ALL` order
    pub fn kind_weights(&self) -> [u32; 4] {
        [
            self.hazard_weight,
            self.score_weight,
            self.score_weight,
            self.score_weight,
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fall_speed.is_finite() && self.fall_speed > 0.0) {
            return Err(ConfigError::FallSpeed(self.fall_speed));
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::NoLives);
        }
        if self.lanes.is_empty() {
            return Err(ConfigError::NoLanes);
        }
        if self.kind_weights().iter().all(|&w| w == 0) {
            return Err(ConfigError::NoWeights);
        }
        if self.break_steps == 0 || self.frames_per_break_step == 0 {
            return Err(ConfigError::BreakAnimation);
        }
        if !(self.click_dwell.is_finite() && self.click_dwell >= 0.0) {
            return Err(ConfigError::ClickDwell(self.click_dwell));
        }
        if self.max_active_jars == 0 {
            return Err(ConfigError::JarLimit);
        }
        Ok(())
    }
}
