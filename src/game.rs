//! Game context
//!
//! Owns everything that outlives a single level: the scene table, the level
//! engines, settings, high scores and the effects channel. The host drives it
//! with one `update` and one `render` per frame.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::audio::{AudioChannel, SilentChannel};
use crate::beats::BeatSource;
use crate::error::DecodeError;
use crate::highscores::HighScores;
use crate::render::Surface;
use crate::settings::{Channel, Settings};
use crate::sim::{ClickGate, LevelEngine, LevelEvent, LevelHost, LevelPhase, LevelResult, PointerState};
use crate::ui::{Scene, SceneId, UiAction, UiBinding};

/// Dwell between accepted menu clicks
const MENU_CLICK_DWELL: f64 = 0.2;

/// Collects the result of the level being played
#[derive(Debug, Default)]
struct GameOverBoard {
    pending: Option<(LevelResult, u64)>,
}

impl LevelHost for GameOverBoard {
    fn on_terminal(&mut self, result: LevelResult, final_score: u64) {
        self.pending = Some((result, final_score));
    }
}

pub struct Game {
    scenes: HashMap<SceneId, Scene>,
    active: SceneId,
    settings: Settings,
    settings_path: Option<PathBuf>,
    high_scores: HighScores,
    scores_path: Option<PathBuf>,
    levels: Vec<LevelEngine>,
    beats: Box<dyn BeatSource>,
    effects: Box<dyn AudioChannel>,
    effects_ready: bool,
    gate: ClickGate,
    clock: f64,
    board: GameOverBoard,
    /// Outcome of the last finished level, shown on the game over screen
    last_result: Option<(LevelResult, u64)>,
    running: bool,
}

impl Game {
    pub fn new(levels: Vec<LevelEngine>, beats: Box<dyn BeatSource>) -> Self {
        let names: Vec<&str> = levels.iter().map(|l| l.name()).collect();
        let scenes = HashMap::from([
            (SceneId::Menu, Scene::menu()),
            (SceneId::LevelSelect, Scene::level_select(&names)),
            (SceneId::Settings, Scene::settings()),
            (SceneId::GameOver, Scene::game_over()),
        ]);
        Self {
            scenes,
            active: SceneId::Menu,
            settings: Settings::default(),
            settings_path: None,
            high_scores: HighScores::new(),
            scores_path: None,
            levels,
            beats,
            effects: Box::new(SilentChannel::new()),
            effects_ready: false,
            gate: ClickGate::new(MENU_CLICK_DWELL),
            clock: 0.0,
            board: GameOverBoard::default(),
            last_result: None,
            running: true,
        }
    }

    /// Load settings from `path` and save every change back to it
    pub fn with_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.settings = Settings::load(&path);
        self.settings_path = Some(path);
        self
    }

    /// Load the leaderboard from `path` and save new entries to it
    pub fn with_high_scores_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.high_scores = HighScores::load(&path);
        self.scores_path = Some(path);
        self
    }

    /// Channel and sample used for the jar smash effect
    pub fn with_effects(mut self, mut channel: Box<dyn AudioChannel>, sound: &Path) -> Self {
        self.effects_ready = match channel.load(sound) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{}; smash effect disabled", e);
                false
            }
        };
        self.effects = channel;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn active_scene(&self) -> SceneId {
        self.active
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(&id)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn levels(&self) -> &[LevelEngine] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&LevelEngine> {
        self.levels.get(index)
    }

    pub fn last_result(&self) -> Option<(LevelResult, u64)> {
        self.last_result
    }

    /// Switch scenes
    ///
    /// Opening a level loads it first; if its beats cannot be obtained the
    /// error is returned and the current scene stays active. A different
    /// level that was being played is closed once the new one has loaded.
    pub fn open(&mut self, scene: SceneId) -> Result<(), DecodeError> {
        if let SceneId::Level(index) = scene {
            let volume = self.settings.get_volume(Channel::Music);
            let Some(level) = self.levels.get_mut(index) else {
                log::error!("No level with index {}", index);
                return Ok(());
            };
            level.load(self.beats.as_ref(), volume)?;
            self.board = GameOverBoard::default();
            if self.active != scene {
                self.close_active_level();
            }
        } else {
            self.leave_level();
        }

        log::info!("Opened {:?}", scene);
        self.active = scene;
        self.refresh_bindings();
        Ok(())
    }

    /// Leave the level being played without a result
    pub fn close_level(&mut self) {
        if matches!(self.active, SceneId::Level(_)) {
            self.leave_level();
            self.active = SceneId::LevelSelect;
            self.refresh_bindings();
        }
    }

    /// Pause or resume the level being played
    pub fn toggle_pause(&mut self) {
        if let Some(level) = self.active_level_mut() {
            match level.phase() {
                LevelPhase::Playing => level.pause(),
                LevelPhase::Paused => level.resume(),
                _ => {}
            }
        }
    }

    /// Advance one frame
    pub fn update(&mut self, pointer: &PointerState, dt: f32) {
        self.clock += f64::from(dt.max(0.0));

        if let SceneId::Level(index) = self.active {
            self.update_level(index, pointer, dt);
            return;
        }

        let click = self.gate.poll(pointer, self.clock);
        let action = click.and_then(|point| self.scenes.get(&self.active)?.click(point));
        if let Some(action) = action {
            self.apply(action);
        }
        self.refresh_bindings();
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        match self.active {
            SceneId::Level(index) => {
                if let Some(level) = self.levels.get(index) {
                    level.render(surface);
                }
            }
            id => {
                if let Some(scene) = self.scenes.get(&id) {
                    scene.render(surface);
                }
            }
        }
    }

    fn update_level(&mut self, index: usize, pointer: &PointerState, dt: f32) {
        let Some(level) = self.levels.get_mut(index) else {
            return;
        };
        level.update(pointer, dt, &mut self.board);
        let events = level.drain_events();

        for event in events {
            if let LevelEvent::JarBroken { .. } = event {
                self.play_smash();
            }
        }

        if let Some((result, score)) = self.board.pending.take() {
            self.record_result(index, result, score);
            self.active = SceneId::GameOver;
            self.gate.reset();
            self.refresh_bindings();
        }
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::Open(scene) => {
                if let Err(e) = self.open(scene) {
                    log::error!("Cannot start level: {}", e);
                }
            }
            UiAction::IncreaseVolume(channel) => self.edit_settings(|s| s.increase_volume(channel)),
            UiAction::DecreaseVolume(channel) => self.edit_settings(|s| s.decrease_volume(channel)),
            UiAction::ToggleVolume(channel) => self.edit_settings(|s| s.toggle_volume(channel)),
            UiAction::Exit => {
                log::info!("Thanks for playing!");
                self.close_active_level();
                self.running = false;
            }
        }
    }

    fn edit_settings(&mut self, edit: impl FnOnce(&mut Settings)) {
        edit(&mut self.settings);
        if let Some(path) = &self.settings_path {
            self.settings.save(path);
        }
    }

    fn record_result(&mut self, index: usize, result: LevelResult, score: u64) {
        self.last_result = Some((result, score));
        let Some(level) = self.levels.get(index) else {
            return;
        };
        if let Some(rank) = self.high_scores.add_score(score, level.name(), result, now_timestamp()) {
            log::info!("New high score #{} on '{}': {}", rank, level.name(), score);
            if let Some(path) = &self.scores_path {
                self.high_scores.save(path);
            }
        }
    }

    fn play_smash(&mut self) {
        if !self.effects_ready {
            return;
        }
        self.effects.set_volume(self.settings.get_volume(Channel::Effects));
        self.effects.stop();
        self.effects.play();
    }

    fn active_level_mut(&mut self) -> Option<&mut LevelEngine> {
        match self.active {
            SceneId::Level(index) => self.levels.get_mut(index),
            _ => None,
        }
    }

    /// Close the level being played; menus wait for the button to come up
    fn leave_level(&mut self) {
        if matches!(self.active, SceneId::Level(_)) {
            self.close_active_level();
            self.gate.reset();
        }
    }

    fn close_active_level(&mut self) {
        if let Some(level) = self.active_level_mut() {
            if !level.phase().is_terminal() {
                level.close();
            }
        }
    }

    fn binding_text(&self, binding: UiBinding) -> String {
        match binding {
            UiBinding::VolumeLabel(channel) => self.settings.volume_label(channel),
            UiBinding::FinalMessage => self
                .last_result
                .map(|(result, _)| result.message().to_string())
                .unwrap_or_default(),
            UiBinding::FinalScore => {
                let score = self.last_result.map_or(0, |(_, score)| score);
                format!("Score: {}", score)
            }
            UiBinding::BestScore(index) => {
                let Some(level) = self.levels.get(index) else {
                    return String::new();
                };
                match self.high_scores.best_for(level.name()) {
                    Some(best) => format!("{} ({})", level.name(), best),
                    None => level.name().to_string(),
                }
            }
        }
    }

    /// Run the active scene's label bindings
    fn refresh_bindings(&mut self) {
        let Some(scene) = self.scenes.get(&self.active) else {
            return;
        };
        let labels: Vec<(usize, String)> = scene
            .elements
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.on_update.map(|b| (i, self.binding_text(b))))
            .collect();
        if let Some(scene) = self.scenes.get_mut(&self.active) {
            for (i, label) in labels {
                scene.elements[i].label = Some(label);
            }
        }
    }
}

/// Seconds since the Unix epoch
fn now_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioError;
    use crate::beats::BeatTimeline;
    use crate::config::LevelConfig;
    use crate::consts::FRAME_DT;
    use crate::render::RecordingSurface;
    use crate::sim::Autoplay;
    use glam::Vec2;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FailingSource;

    impl BeatSource for FailingSource {
        fn beats_for(&self, track: &Path) -> Result<BeatTimeline, DecodeError> {
            Err(DecodeError::Empty {
                path: track.to_path_buf(),
            })
        }
    }

    /// Counts `play` calls
    struct CountingChannel(Rc<Cell<u32>>);

    impl AudioChannel for CountingChannel {
        fn load(&mut self, _track: &Path) -> Result<(), AudioError> {
            Ok(())
        }
        fn play(&mut self) {
            self.0.set(self.0.get() + 1);
        }
        fn pause(&mut self) {}
        fn unpause(&mut self) {}
        fn stop(&mut self) {}
        fn set_volume(&mut self, _volume: f32) {}
    }

    fn levels() -> Vec<LevelEngine> {
        ["Level One", "Level Two"]
            .into_iter()
            .map(|name| {
                let config = LevelConfig {
                    hazard_weight: 0,
                    ..LevelConfig::new(name, "missing.ogg", 5.0)
                };
                LevelEngine::new(config, Box::new(SilentChannel::new())).unwrap()
            })
            .collect()
    }

    fn game(beats: &[f64]) -> Game {
        Game::new(levels(), Box::new(BeatTimeline::new(beats.to_vec()).unwrap()))
    }

    fn center_of(game: &Game, scene: SceneId, name: &str) -> Vec2 {
        game.scene(scene).unwrap().element(name).unwrap().rect.center()
    }

    /// Press, then release long enough for the next click to count
    fn click(game: &mut Game, point: Vec2) {
        game.update(&PointerState::pressed_at(point), FRAME_DT);
        for _ in 0..15 {
            game.update(&PointerState::released_at(point), FRAME_DT);
        }
    }

    #[test]
    fn test_menu_navigation() {
        let mut game = game(&[0.5]);
        assert_eq!(game.active_scene(), SceneId::Menu);

        let pos = center_of(&game, SceneId::Menu, "settings");
        click(&mut game, pos);
        assert_eq!(game.active_scene(), SceneId::Settings);

        let pos = center_of(&game, SceneId::Settings, "back");
        click(&mut game, pos);
        assert_eq!(game.active_scene(), SceneId::Menu);

        let pos = center_of(&game, SceneId::Menu, "open");
        click(&mut game, pos);
        assert_eq!(game.active_scene(), SceneId::LevelSelect);
    }

    #[test]
    fn test_exit_stops_game() {
        let mut game = game(&[0.5]);
        let pos = center_of(&game, SceneId::Menu, "exit");
        click(&mut game, pos);
        assert!(!game.is_running());
    }

    #[test]
    fn test_volume_buttons_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut game = game(&[0.5]).with_settings_file(&path);
        game.open(SceneId::Settings).unwrap();

        let music = center_of(&game, SceneId::Settings, "Music");
        let increase = music + Vec2::new(150.0, 0.0);
        click(&mut game, increase);
        assert_eq!(game.settings().get_volume(Channel::Music), 0.6);
        assert_eq!(
            game.scene(SceneId::Settings).unwrap().element("Music").unwrap().label.as_deref(),
            Some("Music: 60")
        );

        click(&mut game, music);
        assert_eq!(game.settings().get_volume(Channel::Music), 0.0);

        let saved = Settings::load(&path);
        assert_eq!(saved.get_volume(Channel::Music), 0.0);
    }

    #[test]
    fn test_decode_error_keeps_level_select() {
        let mut game = Game::new(levels(), Box::new(FailingSource));
        game.open(SceneId::LevelSelect).unwrap();
        assert!(game.open(SceneId::Level(0)).is_err());
        assert_eq!(game.active_scene(), SceneId::LevelSelect);
        assert_eq!(game.level(0).unwrap().phase(), LevelPhase::Idle);
    }

    #[test]
    fn test_level_to_game_over_records_score() {
        let dir = tempfile::tempdir().unwrap();
        let plays = Rc::new(Cell::new(0));
        let mut game = game(&[0.5, 1.0, 1.5])
            .with_high_scores_file(dir.path().join("scores.json"))
            .with_effects(Box::new(CountingChannel(plays.clone())), Path::new("smash.ogg"));
        game.open(SceneId::Level(0)).unwrap();

        let mut bot = Autoplay::new(0.2);
        for _ in 0..1000 {
            if game.active_scene() != SceneId::Level(0) {
                break;
            }
            let pointer = bot.pointer(game.level(0).unwrap().jars());
            game.update(&pointer, FRAME_DT);
        }

        assert_eq!(game.active_scene(), SceneId::GameOver);
        assert_eq!(game.last_result(), Some((LevelResult::Won, 300)));
        assert_eq!(plays.get(), 3);
        assert_eq!(game.high_scores().best_for("Level One"), Some(300));

        let over = game.scene(SceneId::GameOver).unwrap();
        assert_eq!(over.element("message").unwrap().label.as_deref(), Some("You Win!"));
        assert_eq!(over.element("score").unwrap().label.as_deref(), Some("Score: 300"));

        let reloaded = HighScores::load(&dir.path().join("scores.json"));
        assert_eq!(reloaded.top_score(), Some(300));
    }

    #[test]
    fn test_close_level_returns_to_select() {
        let mut game = game(&[0.5, 1.0]);
        game.open(SceneId::Level(1)).unwrap();
        game.update(&PointerState::absent(), FRAME_DT);
        game.toggle_pause();
        assert_eq!(game.level(1).unwrap().phase(), LevelPhase::Paused);

        game.close_level();
        assert_eq!(game.active_scene(), SceneId::LevelSelect);
        assert_eq!(game.level(1).unwrap().phase(), LevelPhase::Closed);
        assert!(game.last_result().is_none());
    }

    #[test]
    fn test_press_held_across_loss_stays_on_game_over() {
        let config = LevelConfig {
            hazard_weight: 1,
            score_weight: 0,
            starting_lives: 1,
            lanes: vec![crate::lane_x(2)],
            ..LevelConfig::new("Hazards", "missing.ogg", 5.0)
        };
        let level = LevelEngine::new(config, Box::new(SilentChannel::new())).unwrap();
        let mut game = Game::new(vec![level], Box::new(BeatTimeline::new(vec![5.0]).unwrap()));
        game.open(SceneId::Level(0)).unwrap();
        for _ in 0..60 {
            game.update(&PointerState::absent(), FRAME_DT);
        }

        // Smash the hazard and keep the button down
        let point = game.level(0).unwrap().jars()[0].bounds().center();
        assert!(game.scene(SceneId::GameOver).unwrap().click(point).is_some());
        for _ in 0..10 {
            game.update(&PointerState::pressed_at(point), FRAME_DT);
        }
        assert_eq!(game.active_scene(), SceneId::GameOver);
        assert_eq!(game.last_result(), Some((LevelResult::Lost, 0)));

        game.update(&PointerState::released_at(point), FRAME_DT);
        let pos = center_of(&game, SceneId::GameOver, "levels");
        click(&mut game, pos);
        assert_eq!(game.active_scene(), SceneId::LevelSelect);
    }

    #[test]
    fn test_opening_another_level_closes_current() {
        let mut game = game(&[0.5, 1.0]);
        game.open(SceneId::Level(0)).unwrap();
        game.update(&PointerState::absent(), FRAME_DT);
        assert_eq!(game.level(0).unwrap().phase(), LevelPhase::Playing);

        game.open(SceneId::Level(1)).unwrap();
        assert_eq!(game.active_scene(), SceneId::Level(1));
        assert_eq!(game.level(0).unwrap().phase(), LevelPhase::Closed);
        assert_eq!(game.level(1).unwrap().phase(), LevelPhase::Playing);
    }

    #[test]
    fn test_render_follows_active_scene() {
        let mut game = game(&[0.5]);
        let mut surface = RecordingSurface::new();
        game.render(&mut surface);
        assert!(surface.texts().any(|t| t == "Start"));

        game.open(SceneId::Level(0)).unwrap();
        game.update(&PointerState::absent(), FRAME_DT);
        surface.clear();
        game.render(&mut surface);
        assert!(surface.texts().any(|t| t == "0"));
    }
}
