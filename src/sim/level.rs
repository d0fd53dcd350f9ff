//! Level engine
//!
//! Owns the jars, score, lives and the spawn scheduler of one level and
//! advances them one fixed tick at a time:
//!
//! 1. resume the spawn scheduler (may append jars)
//! 2. gravity on falling jars
//! 3. break animations of jars broken on earlier ticks
//! 4. click hit test, then floor test, scoring each new break once
//! 5. evict finished jars, then check for a win or loss
//!
//! The host is told about the outcome through [`LevelHost::on_terminal`],
//! exactly once per session.

use super::collision::{click_target, jar_past_floor};
use super::input::{ClickGate, PointerState};
use super::jar::{BreakCause, Jar, JarPhase};
use super::scheduler::{JarPicker, SpawnScheduler};
use super::state::{LevelEvent, LevelPhase, LevelResult, LevelState};
use crate::Rect;
use crate::audio::AudioChannel;
use crate::beats::BeatSource;
use crate::config::LevelConfig;
use crate::consts::*;
use crate::error::{ConfigError, DecodeError, SpawnError};
use crate::render::{Sprite, Surface};

/// Receives the end of a level
pub trait LevelHost {
    fn on_terminal(&mut self, result: LevelResult, final_score: u64);
}

/// Toggles pause while playing
pub const PAUSE_BUTTON: Rect = Rect::new(
    1080.0 * PLAYFIELD_WIDTH / 1336.0,
    598.0 * PLAYFIELD_HEIGHT / 768.0,
    120.0,
    120.0,
);

const SCORE_BOARD: Rect = Rect::new(
    997.0 * PLAYFIELD_WIDTH / 1366.0,
    201.0 * PLAYFIELD_HEIGHT / 768.0,
    355.0 * PLAYFIELD_WIDTH / 1366.0,
    100.0 * PLAYFIELD_HEIGHT / 768.0,
);

const HEART_SIZE: f32 = 48.0;
const HEART_SPACING: f32 = 105.0 * PLAYFIELD_WIDTH / 1336.0;
const BELT_MARGIN: f32 = PLAYFIELD_WIDTH / 103.0;

pub struct LevelEngine {
    config: LevelConfig,
    state: LevelState,
    /// Active jars in spawn order
    jars: Vec<Jar>,
    scheduler: Option<SpawnScheduler>,
    picker: JarPicker,
    audio: Box<dyn AudioChannel>,
    gate: ClickGate,
    /// Seconds since load, including paused time
    clock: f64,
    next_jar_id: u32,
    terminal_reported: bool,
    events: Vec<LevelEvent>,
}

impl LevelEngine {
    pub fn new(config: LevelConfig, audio: Box<dyn AudioChannel>) -> Result<Self, ConfigError> {
        config.validate()?;
        let picker = JarPicker::new(&config)?;
        Ok(Self {
            state: LevelState::new(config.starting_lives),
            gate: ClickGate::new(config.click_dwell),
            config,
            jars: Vec::new(),
            scheduler: None,
            picker,
            audio,
            clock: 0.0,
            next_jar_id: 1,
            terminal_reported: false,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn state(&self) -> &LevelState {
        &self.state
    }

    pub fn phase(&self) -> LevelPhase {
        self.state.phase
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn lives(&self) -> u8 {
        self.state.lives
    }

    pub fn jars(&self) -> &[Jar] {
        &self.jars
    }

    /// Beats still queued for spawning (0 once exhausted or closed)
    pub fn remaining_beats(&self) -> usize {
        self.scheduler.as_ref().map_or(0, |s| s.remaining_beats())
    }

    /// Take the events logged since the last drain
    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start a fresh session
    ///
    /// On a decode error the level goes back to `Idle` and must not be
    /// played. A track that cannot be opened for playback is not fatal; the
    /// level runs without music.
    pub fn load(&mut self, beats: &dyn BeatSource, volume: f32) -> Result<(), DecodeError> {
        self.reset_session();
        self.state.phase = LevelPhase::Loading;
        log::info!("Loading level '{}'", self.config.name);

        let timeline = match beats.beats_for(&self.config.track) {
            Ok(timeline) => timeline,
            Err(e) => {
                log::warn!("Level '{}' failed to load: {}", self.config.name, e);
                self.state.phase = LevelPhase::Idle;
                return Err(e);
            }
        };

        match self.audio.load(&self.config.track) {
            Ok(()) => {
                self.audio.set_volume(volume);
                self.audio.play();
            }
            Err(e) => log::warn!("{}; playing without music", e),
        }

        log::info!(
            "Level '{}' started with {} beats",
            self.config.name,
            timeline.len()
        );
        self.scheduler = Some(SpawnScheduler::new(timeline));
        self.state.phase = LevelPhase::Playing;
        Ok(())
    }

    /// Advance one tick
    pub fn update(&mut self, pointer: &PointerState, dt: f32, host: &mut dyn LevelHost) {
        let dt = f64::from(dt.max(0.0));
        self.clock += dt;
        let click = self.gate.poll(pointer, self.clock);
        let on_pause_button = click.is_some_and(|p| PAUSE_BUTTON.contains(p));

        match self.state.phase {
            LevelPhase::Playing => {}
            LevelPhase::Paused => {
                if on_pause_button {
                    self.resume();
                }
                return;
            }
            _ => return,
        }
        if on_pause_button {
            self.pause();
            return;
        }

        self.run_scheduler(dt);

        for jar in &mut self.jars {
            jar.fall(self.config.fall_speed);
        }

        // Breaks from earlier ticks animate; this tick's start next tick
        for jar in &mut self.jars {
            jar.advance_break(self.config.break_steps, self.config.frames_per_break_step);
        }

        if let Some(index) = click.and_then(|point| click_target(&self.jars, point)) {
            self.break_jar(index, BreakCause::Clicked);
        }
        for index in 0..self.jars.len() {
            if jar_past_floor(&self.jars[index], self.config.floor_y) {
                self.break_jar(index, BreakCause::Missed);
            }
        }

        self.jars.retain(|jar| !jar.is_removed());

        if self.state.lives == 0 {
            self.finish(LevelResult::Lost, host);
        } else if self.spawns_done() && self.jars.is_empty() {
            self.finish(LevelResult::Won, host);
        }
    }

    /// Freeze the level (Playing only)
    pub fn pause(&mut self) {
        if self.state.phase != LevelPhase::Playing {
            return;
        }
        self.state.phase = LevelPhase::Paused;
        self.audio.pause();
        self.events.push(LevelEvent::Paused);
        log::info!("Level '{}' paused", self.config.name);
    }

    pub fn resume(&mut self) {
        if self.state.phase != LevelPhase::Paused {
            return;
        }
        self.state.phase = LevelPhase::Playing;
        self.audio.unpause();
        self.events.push(LevelEvent::Resumed);
        log::info!("Level '{}' resumed", self.config.name);
    }

    /// Abandon the session without reporting a result
    pub fn close(&mut self) {
        self.scheduler = None;
        self.jars.clear();
        self.audio.stop();
        if self.state.phase != LevelPhase::Idle {
            self.state.phase = LevelPhase::Closed;
        }
        log::info!("Level '{}' closed", self.config.name);
    }

    /// Draw the level; never mutates
    pub fn render(&self, surface: &mut dyn Surface) {
        surface.draw_sprite(
            Sprite::Background,
            Rect::new(0.0, 0.0, PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT),
        );
        for &x in &self.config.lanes {
            surface.draw_sprite(
                Sprite::Belt,
                Rect::new(
                    x - BELT_MARGIN,
                    0.0,
                    JAR_WIDTH + 2.0 * BELT_MARGIN,
                    PLAYFIELD_HEIGHT,
                ),
            );
        }

        for jar in &self.jars {
            let sprite = match jar.phase {
                JarPhase::Falling => Sprite::Jar(jar.kind),
                JarPhase::Breaking { step, .. } => Sprite::BrokenJar(jar.kind, step),
                JarPhase::Removed => continue,
            };
            surface.draw_sprite(sprite, jar.bounds());
        }

        for i in 0..self.state.lives {
            let x = 38.0 * PLAYFIELD_WIDTH / 1336.0 + f32::from(i) * HEART_SPACING;
            let y = 65.0 * PLAYFIELD_HEIGHT / 768.0;
            surface.draw_sprite(Sprite::Heart, Rect::new(x, y, HEART_SIZE, HEART_SIZE));
        }
        surface.draw_text(&self.state.score.to_string(), SCORE_BOARD);
        surface.draw_sprite(Sprite::PauseButton, PAUSE_BUTTON);
    }

    fn reset_session(&mut self) {
        self.state = LevelState::new(self.config.starting_lives);
        self.jars.clear();
        self.scheduler = None;
        self.picker.reseed(self.config.seed);
        self.gate.reset();
        self.clock = 0.0;
        self.next_jar_id = 1;
        self.terminal_reported = false;
        self.events.clear();
    }

    fn spawns_done(&self) -> bool {
        self.scheduler.as_ref().is_none_or(|s| s.is_exhausted())
    }

    fn run_scheduler(&mut self, dt: f64) {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return;
        };
        let was_exhausted = scheduler.is_exhausted();
        let due = scheduler.advance(dt);

        for _ in 0..due {
            if let Err(e) = self.spawn_jar() {
                log::error!("Level '{}': {}; no further spawns", self.config.name, e);
                if let Some(scheduler) = self.scheduler.as_mut() {
                    scheduler.stop();
                }
                break;
            }
        }

        if !was_exhausted && self.spawns_done() {
            self.events.push(LevelEvent::TimelineExhausted);
        }
    }

    fn spawn_jar(&mut self) -> Result<(), SpawnError> {
        let limit = self.config.max_active_jars;
        if self.jars.len() >= limit {
            return Err(SpawnError::JarLimit { limit });
        }

        let (lane, kind) = self.picker.pick();
        let id = self.next_jar_id;
        self.next_jar_id += 1;
        let x = self.config.lanes.get(lane).copied().unwrap_or_default();
        self.jars.push(Jar::new(id, kind, lane, x));
        self.events.push(LevelEvent::JarSpawned { id, kind, lane });
        log::debug!("Spawned {:?} jar {} in lane {} at {:.3}s", kind, id, lane, self.clock);
        Ok(())
    }

    /// Move a falling jar into its break animation and settle score/lives
    fn break_jar(&mut self, index: usize, cause: BreakCause) {
        let Some(jar) = self.jars.get_mut(index) else {
            return;
        };
        if !jar.start_breaking(cause) {
            return;
        }
        let (id, kind) = (jar.id, jar.kind);
        self.events.push(LevelEvent::JarBroken { id, kind, cause });

        match (kind.is_hazard(), cause) {
            (false, BreakCause::Clicked) => self.state.add_score(self.config.reward),
            (false, BreakCause::Missed) | (true, BreakCause::Clicked) => {
                let remaining = self.state.lose_life();
                self.events.push(LevelEvent::LifeLost { remaining });
                log::debug!("Jar {} cost a life, {} left", id, remaining);
            }
            (true, BreakCause::Missed) => {}
        }
    }

    fn finish(&mut self, result: LevelResult, host: &mut dyn LevelHost) {
        if self.terminal_reported {
            log::error!(
                "Level '{}' already finished as {:?}; ignoring {:?}",
                self.config.name,
                self.state.phase,
                result
            );
            return;
        }
        self.terminal_reported = true;
        self.state.phase = result.phase();
        self.scheduler = None;
        self.audio.stop();

        let score = self.state.score;
        self.events.push(LevelEvent::Finished { result, score });
        log::info!("Level '{}' finished: {:?} with {}", self.config.name, result, score);
        host.on_terminal(result, score);
    }
}
