//! JellySmash entry point
//!
//! Runs a level headless: beats are extracted from the track, the demo
//! player smashes jars through a fixed-timestep loop and the result goes to
//! the high score table.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use thiserror::Error;

use jelly_smash::audio::SilentChannel;
use jelly_smash::beats::BeatExtractor;
use jelly_smash::consts::{FRAME_DT, MAX_SUBSTEPS};
use jelly_smash::error::{ConfigError, DecodeError, PersistenceError};
use jelly_smash::sim::{Autoplay, LevelEngine};
use jelly_smash::ui::SceneId;
use jelly_smash::{Game, LevelConfig};

/// Beat-synchronised jar smashing, played by the built-in demo player
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Built-in level to play (1-3)
    #[arg(long, default_value_t = 1)]
    level: usize,
    /// Play this track instead of the level's own
    #[arg(long)]
    track: Option<PathBuf>,
    /// Level configuration JSON; replaces --level
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the game's sound files
    #[arg(long, default_value = "sounds")]
    sounds_dir: PathBuf,
    /// Where extracted beat timelines are cached
    #[arg(long, default_value = ".jellysmash/beats")]
    cache_dir: PathBuf,
    /// Where settings and high scores are kept
    #[arg(long, default_value = ".jellysmash")]
    data_dir: PathBuf,
    /// Override the level's RNG seed
    #[arg(long)]
    seed: Option<u64>,
    /// Pace the loop with the wall clock instead of running flat out
    #[arg(long)]
    realtime: bool,
    /// Print the beat timeline as JSON and exit
    #[arg(long)]
    beats_only: bool,
}

#[derive(Debug, Error)]
enum RunError {
    #[error("no built-in level {0} (choose 1-3)")]
    UnknownLevel(usize),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("cannot print timeline: {0}")]
    Json(#[from] serde_json::Error),
}

fn level_config(args: &Args) -> Result<LevelConfig, RunError> {
    let mut config = match &args.config {
        Some(path) => LevelConfig::from_json_file(path)?,
        None => LevelConfig::presets(&args.sounds_dir)
            .into_iter()
            .nth(args.level.wrapping_sub(1))
            .ok_or(RunError::UnknownLevel(args.level))?,
    };
    if let Some(track) = &args.track {
        config.track = track.clone();
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), RunError> {
    let config = level_config(args)?;
    let extractor = BeatExtractor::ogg(&args.cache_dir);

    if args.beats_only {
        let timeline = extractor.extract(&config.track)?;
        println!("{}", serde_json::to_string_pretty(&timeline)?);
        return Ok(());
    }

    let name = config.name.clone();
    let mut bot = Autoplay::new(config.click_dwell);
    let engine = LevelEngine::new(config, Box::new(SilentChannel::new()))?;
    let mut game = Game::new(vec![engine], Box::new(extractor))
        .with_settings_file(args.data_dir.join("settings.json"))
        .with_high_scores_file(args.data_dir.join("highscores.json"))
        .with_effects(
            Box::new(SilentChannel::new()),
            &args.sounds_dir.join("smashing_glass.ogg"),
        );
    game.open(SceneId::Level(0))?;
    log::info!("Playing '{}'", name);

    let mut accumulator = 0.0f32;
    let mut last = Instant::now();
    while game.is_running() && game.active_scene() == SceneId::Level(0) {
        let dt = if args.realtime {
            let now = Instant::now();
            let elapsed = now.duration_since(last).as_secs_f32();
            last = now;
            elapsed
        } else {
            FRAME_DT
        };
        accumulator += dt.min(0.1);

        let mut substeps = 0;
        while accumulator >= FRAME_DT && substeps < MAX_SUBSTEPS {
            let jars = game.level(0).map(|l| l.jars()).unwrap_or_default();
            let pointer = bot.pointer(jars);
            game.update(&pointer, FRAME_DT);
            accumulator -= FRAME_DT;
            substeps += 1;
        }

        if args.realtime {
            std::thread::sleep(Duration::from_secs_f32(FRAME_DT));
        }
    }

    if let Some((result, score)) = game.last_result() {
        println!("{}: {} Score: {}", name, result.message(), score);
        if let Some(best) = game.high_scores().best_for(&name) {
            println!("Best on {}: {}", name, best);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
