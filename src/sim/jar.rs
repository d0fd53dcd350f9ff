//! Jar entity and its lifecycle
//!
//! Falling → Breaking(step) → Removed. A jar only leaves the active set
//! after the full break animation, whether it was smashed or missed.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Rect;
use crate::consts::{JAR_HEIGHT, JAR_WIDTH};

/// Jar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JarKind {
    /// Pickle jar: must not be clicked
    Hazard,
    ScoreA,
    ScoreB,
    ScoreC,
}

impl JarKind {
    /// Order used for spawn weights
    pub const ALL: [JarKind; 4] = [
        JarKind::Hazard,
        JarKind::ScoreA,
        JarKind::ScoreB,
        JarKind::ScoreC,
    ];

    pub fn is_hazard(&self) -> bool {
        *self == JarKind::Hazard
    }

    /// Sprite colour prefix
    pub fn sprite_stem(&self) -> &'static str {
        match self {
            JarKind::Hazard => "pickle",
            JarKind::ScoreA => "red",
            JarKind::ScoreB => "purple",
            JarKind::ScoreC => "magenta",
        }
    }
}

/// Why a jar started breaking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakCause {
    Clicked,
    Missed,
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JarPhase {
    Falling,
    /// Playing break animation frame `step`, `frame` ticks into it
    Breaking { step: u8, frame: u8 },
    /// Animation finished; evicted at the end of the tick
    Removed,
}

/// A falling jar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jar {
    pub id: u32,
    pub kind: JarKind,
    pub lane: usize,
    /// Top-left corner in playfield coordinates
    pub pos: Vec2,
    pub phase: JarPhase,
    /// Set once, when the jar leaves `Falling`
    pub cause: Option<BreakCause>,
}

impl Jar {
    /// New jar at the top of its lane
    pub fn new(id: u32, kind: JarKind, lane: usize, x: f32) -> Self {
        Self {
            id,
            kind,
            lane,
            pos: Vec2::new(x, 0.0),
            phase: JarPhase::Falling,
            cause: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            origin: self.pos,
            size: Vec2::new(JAR_WIDTH, JAR_HEIGHT),
        }
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        self.phase == JarPhase::Falling
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.phase == JarPhase::Removed
    }

    /// Apply one tick of gravity (no-op unless falling)
    pub fn fall(&mut self, speed: f32) {
        if self.is_falling() {
            self.pos.y += speed;
        }
    }

    /// Start the break animation
    ///
    /// Returns false (and changes nothing) if the jar was not falling, so a
    /// jar is resolved at most once.
    pub fn start_breaking(&mut self, cause: BreakCause) -> bool {
        if !self.is_falling() {
            return false;
        }
        self.phase = JarPhase::Breaking { step: 0, frame: 0 };
        self.cause = Some(cause);
        true
    }

    /// Advance the break animation by one tick
    pub fn advance_break(&mut self, steps: u8, frames_per_step: u8) {
        if let JarPhase::Breaking { step, frame } = self.phase {
            let (mut step, mut frame) = (step, frame + 1);
            if frame >= frames_per_step {
                frame = 0;
                step += 1;
            }
            self.phase = if step >= steps {
                JarPhase::Removed
            } else {
                JarPhase::Breaking { step, frame }
            };
        }
    }
}
