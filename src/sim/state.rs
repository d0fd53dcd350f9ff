//! Level state and events
//!
//! Score, lives and phase of one level session, plus the event log the
//! engine emits for the host.

use serde::{Deserialize, Serialize};

use super::jar::{BreakCause, JarKind};

/// Current phase of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Never loaded (or load failed)
    Idle,
    /// Obtaining the beat timeline
    Loading,
    /// Active gameplay
    Playing,
    /// Scheduler and jars frozen, only the resume control works
    Paused,
    Won,
    Lost,
    /// Host closed the level mid-session
    Closed,
}

impl LevelPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LevelPhase::Won | LevelPhase::Lost)
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelResult {
    Won,
    Lost,
}

impl LevelResult {
    pub fn phase(&self) -> LevelPhase {
        match self {
            LevelResult::Won => LevelPhase::Won,
            LevelResult::Lost => LevelPhase::Lost,
        }
    }

    /// Banner shown on the game over screen
    pub fn message(&self) -> &'static str {
        match self {
            LevelResult::Won => "You Win!",
            LevelResult::Lost => "Game Over",
        }
    }
}

/// Score, lives and phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelState {
    pub score: u64,
    pub lives: u8,
    pub phase: LevelPhase,
}

impl LevelState {
    pub fn new(lives: u8) -> Self {
        Self {
            score: 0,
            lives,
            phase: LevelPhase::Idle,
        }
    }

    /// Gameplay is advancing (not paused, not finished)
    #[inline]
    pub fn running(&self) -> bool {
        self.phase == LevelPhase::Playing
    }

    /// Remove one life; returns the lives left
    pub fn lose_life(&mut self) -> u8 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    pub fn add_score(&mut self, reward: u64) {
        self.score = self.score.saturating_add(reward);
    }
}

/// Things that happened during a tick, for sound effects and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelEvent {
    JarSpawned { id: u32, kind: JarKind, lane: usize },
    JarBroken { id: u32, kind: JarKind, cause: BreakCause },
    LifeLost { remaining: u8 },
    Paused,
    Resumed,
    TimelineExhausted,
    Finished { result: LevelResult, score: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = LevelState::new(3);
        assert_eq!(state.phase, LevelPhase::Idle);
        assert_eq!((state.score, state.lives), (0, 3));
        assert!(!state.running());
    }

    #[test]
    fn test_lives_saturate_at_zero() {
        let mut state = LevelState::new(1);
        assert_eq!(state.lose_life(), 0);
        assert_eq!(state.lose_life(), 0);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(LevelResult::Won.phase().is_terminal());
        assert!(LevelResult::Lost.phase().is_terminal());
        assert!(!LevelPhase::Paused.is_terminal());
        assert!(!LevelPhase::Closed.is_terminal());
    }
}
