//! On-disk beat cache
//!
//! One JSON array per track, named after the track's file name. A cache
//! problem is never an error for the caller: reads degrade to a miss, writes
//! are skipped.

use std::path::{Path, PathBuf};

use super::timeline::BeatTimeline;
use crate::persistence;

#[derive(Debug, Clone)]
pub struct BeatCache {
    dir: PathBuf,
}

impl BeatCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a track, or None if the path has no file name
    pub fn entry_path(&self, track: &Path) -> Option<PathBuf> {
        let name = track.file_name()?;
        let mut file = name.to_os_string();
        file.push(".json");
        Some(self.dir.join(file))
    }

    pub fn load(&self, track: &Path) -> Option<BeatTimeline> {
        let path = self.entry_path(track)?;
        if !path.exists() {
            return None;
        }
        match persistence::read_json::<BeatTimeline>(&path) {
            Ok(timeline) => {
                log::debug!("Beat cache hit for {}", track.display());
                Some(timeline)
            }
            Err(e) => {
                log::warn!("Ignoring unreadable beat cache entry: {e}");
                None
            }
        }
    }

    pub fn store(&self, track: &Path, timeline: &BeatTimeline) {
        let Some(path) = self.entry_path(track) else {
            return;
        };
        if let Err(e) = persistence::write_json_atomic(&path, timeline) {
            log::warn!("Skipping beat cache write: {e}");
        }
    }
}
