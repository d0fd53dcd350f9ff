//! Beat-driven spawn scheduler
//!
//! A cooperative task: the engine resumes it once per tick with the elapsed
//! time, and it reports how many jars became due. Waits are carried across
//! ticks exactly, so spawn timing is not quantised to the frame rate, and a
//! paused level simply stops resuming it.

use std::collections::VecDeque;

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::jar::JarKind;
use crate::beats::BeatTimeline;
use crate::config::LevelConfig;
use crate::error::ConfigError;

/// Where the scheduler task is suspended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchedulerState {
    /// About to spawn for the beat at the front of the queue
    Ready,
    /// Waiting out the current interval
    Sleeping { remaining: f64 },
    /// Timeline consumed (or stopped); no more spawns
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    beats: VecDeque<f64>,
    state: SchedulerState,
}

impl SpawnScheduler {
    pub fn new(timeline: BeatTimeline) -> Self {
        Self {
            beats: timeline.into_vec().into(),
            state: SchedulerState::Ready,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == SchedulerState::Exhausted
    }

    pub fn remaining_beats(&self) -> usize {
        self.beats.len()
    }

    /// Resume the task for `dt` seconds; returns the number of spawns due
    ///
    /// Loop per beat: spawn, sleep for the gap to the next beat (or for the
    /// last beat's own timestamp when only one is left), then drop the beat.
    pub fn advance(&mut self, dt: f64) -> u32 {
        let mut budget = dt.max(0.0);
        let mut spawns = 0;
        loop {
            match self.state {
                SchedulerState::Exhausted => break,
                SchedulerState::Ready => {
                    if self.beats.is_empty() {
                        log::debug!("Beat timeline exhausted");
                        self.state = SchedulerState::Exhausted;
                        break;
                    }
                    spawns += 1;
                    self.state = SchedulerState::Sleeping {
                        remaining: self.next_interval(),
                    };
                }
                SchedulerState::Sleeping { remaining } => {
                    if remaining > budget {
                        self.state = SchedulerState::Sleeping {
                            remaining: remaining - budget,
                        };
                        break;
                    }
                    budget -= remaining;
                    self.beats.pop_front();
                    self.state = SchedulerState::Ready;
                }
            }
        }
        spawns
    }

    /// Stop for good (level closing or a spawn failure)
    pub fn stop(&mut self) {
        self.beats.clear();
        self.state = SchedulerState::Exhausted;
    }

    fn next_interval(&self) -> f64 {
        match (self.beats.front(), self.beats.get(1)) {
            (Some(&first), Some(&second)) => second - first,
            (Some(&only), None) => only,
            _ => 0.0,
        }
    }
}

/// Picks lane and kind for new jars
#[derive(Debug, Clone)]
pub struct JarPicker {
    rng: Pcg32,
    kinds: WeightedIndex<u32>,
    lanes: usize,
}

impl JarPicker {
    pub fn new(config: &LevelConfig) -> Result<Self, ConfigError> {
        if config.lanes.is_empty() {
            return Err(ConfigError::NoLanes);
        }
        let kinds = WeightedIndex::new(config.kind_weights()).map_err(|_| ConfigError::NoWeights)?;
        Ok(Self {
            rng: Pcg32::seed_from_u64(config.seed),
            kinds,
            lanes: config.lanes.len(),
        })
    }

    /// Restart the random sequence (new session)
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg32::seed_from_u64(seed);
    }

    /// (lane index, kind)
    pub fn pick(&mut self) -> (usize, JarKind) {
        let lane = self.rng.random_range(0..self.lanes);
        let kind = JarKind::ALL[self.kinds.sample(&mut self.rng)];
        (lane, kind)
    }
}
