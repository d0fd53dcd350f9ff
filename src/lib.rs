//! JellySmash - a beat-synchronised jar smashing arcade game
//!
//! Core modules:
//! - `beats`: Beat timeline extraction (decode, onset detection, cache)
//! - `sim`: Level engine (jars, spawn scheduler, score/lives state machine)
//! - `game`: Host context owning the scene table and level engines
//! - `ui`: Menu scenes built from one declarative element type
//! - `audio`: Music channel abstraction
//! - `render`: Draw surface abstraction
//! - `persistence`: JSON file storage for settings, scores and cache

pub mod audio;
pub mod beats;
pub mod config;
pub mod error;
pub mod game;
pub mod highscores;
pub mod persistence;
pub mod render;
pub mod settings;
pub mod sim;
pub mod ui;

pub use config::LevelConfig;
pub use game::Game;
pub use highscores::HighScores;
pub use settings::{Channel, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed frame rate of the update loop
    pub const FRAME_RATE: u32 = 60;
    /// Fixed update timestep in seconds
    pub const FRAME_DT: f32 = 1.0 / FRAME_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Logical playfield the layout is expressed in
    pub const PLAYFIELD_WIDTH: f32 = 1366.0;
    pub const PLAYFIELD_HEIGHT: f32 = 768.0;

    /// Jar sprite size
    pub const JAR_WIDTH: f32 = 80.0;
    pub const JAR_HEIGHT: f32 = 100.0;

    /// Conveyor belts (and spawn lanes) sit at 29/103 + k*9/103 of the width
    pub const LANE_COUNT: usize = 5;

    /// Level defaults
    pub const DEFAULT_LIVES: u8 = 3;
    pub const DEFAULT_REWARD: u64 = 100;
    pub const DEFAULT_HAZARD_WEIGHT: u32 = 1;
    pub const DEFAULT_SCORE_WEIGHT: u32 = 3;
    /// Minimum seconds between two accepted clicks
    pub const DEFAULT_CLICK_DWELL: f64 = 0.2;
    pub const DEFAULT_BREAK_STEPS: u8 = 3;
    pub const FRAMES_PER_ANIMATION: u8 = 5;
    pub const MAX_ACTIVE_JARS: usize = 64;
}

/// X position of spawn lane `k` (jar left edge, centred on its belt)
pub fn lane_x(k: usize) -> f32 {
    use consts::*;
    (30.0 + k as f32 * 9.0) * PLAYFIELD_WIDTH / 103.0
}

/// Axis-aligned rectangle in playfield coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Inclusive on the top/left edges, exclusive on bottom/right
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.origin + self.size;
        point.x >= self.origin.x && point.y >= self.origin.y && point.x < max.x && point.y < max.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.y
    }
}
