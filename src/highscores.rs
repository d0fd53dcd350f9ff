//! High score leaderboard system
//!
//! Persisted as JSON next to the settings, tracks the top 10 finished runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::LevelResult;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player's score
    pub score: u64,
    /// Level the score was set on
    pub level: String,
    /// Whether the song was survived
    pub won: bool,
    /// Unix timestamp (seconds) when achieved
    pub timestamp: f64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a finished run to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(
        &mut self,
        score: u64,
        level: &str,
        result: LevelResult,
        timestamp: f64,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            level: level.to_string(),
            won: result == LevelResult::Won,
            timestamp,
        };

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Best score recorded on a given level
    pub fn best_for(&self, level: &str) -> Option<u64> {
        self.entries
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.score)
            .max()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load high scores from disk, starting fresh if absent or unreadable
    pub fn load(path: &Path) -> Self {
        match crate::persistence::read_json::<HighScores>(path) {
            Ok(scores) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(e) => {
                log::info!("No high scores found, starting fresh ({e})");
                Self::new()
            }
        }
    }

    /// Save high scores to disk (failures are logged, not fatal)
    pub fn save(&self, path: &Path) {
        match crate::persistence::write_json_atomic(path, self) {
            Ok(()) => log::info!("High scores saved ({} entries)", self.entries.len()),
            Err(e) => log::warn!("Failed to save high scores: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_qualifies() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(0, "Level One", LevelResult::Lost, 0.0), None);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_sorted_and_truncated() {
        let mut scores = HighScores::new();
        for i in 1..=12u64 {
            scores.add_score(i * 100, "Level One", LevelResult::Won, i as f64);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(1200));
        assert_eq!(scores.entries.last().unwrap().score, 300);
        assert!(!scores.qualifies(300));
        assert_eq!(scores.add_score(650, "Level Two", LevelResult::Lost, 0.0), Some(7));
    }

    #[test]
    fn test_best_for_level() {
        let mut scores = HighScores::new();
        scores.add_score(300, "Level One", LevelResult::Won, 0.0);
        scores.add_score(900, "Level Two", LevelResult::Lost, 0.0);
        scores.add_score(500, "Level One", LevelResult::Lost, 0.0);
        assert_eq!(scores.best_for("Level One"), Some(500));
        assert_eq!(scores.best_for("Level Three"), None);
        assert!(!scores.entries[0].won);
    }

    #[test]
    fn test_persist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        let mut scores = HighScores::new();
        scores.add_score(400, "Level One", LevelResult::Won, 1.0);
        scores.save(&path);
        let loaded = HighScores::load(&path);
        assert_eq!(loaded.entries, scores.entries);
    }
}
