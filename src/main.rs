//! Headless driver: runs the simulation core from the command line.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use molten2d::engine::Engine;
use molten2d::input::InputSnapshot;
use molten2d::resources::gameconfig::GameConfig;

#[derive(Parser, Debug)]
#[command(version, about = "molten2d simulation core")]
struct Cli {
    /// Path to the INI configuration file.
    #[arg(long, default_value = "./config.ini")]
    config: PathBuf,

    /// Scene to load instead of the configured start scene.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Run this many frames and exit; 0 runs until interrupted.
    #[arg(long, default_value_t = 0)]
    frames: u64,

    /// Seed for the engine RNG; omitted means a random run.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = GameConfig::with_path(&cli.config);
    if let Err(err) = config.load_from_file() {
        info!("no config at {:?}, using defaults ({err})", cli.config);
    }

    let mut engine = match cli.seed {
        Some(seed) => Engine::with_seed(config, seed),
        None => Engine::new(config),
    };

    let scene = cli
        .scene
        .unwrap_or_else(|| engine.config.start_scene.clone());
    if let Err(err) = engine.load_scene(&scene) {
        error!("could not load start scene {:?}: {err}", scene);
    }

    let mut previous = Instant::now();
    let mut frames: u64 = 0;
    loop {
        let now = Instant::now();
        let frame_dt = now.duration_since(previous).as_secs_f32();
        previous = now;

        // Headless run: no window, so input stays at its defaults.
        let report = engine.frame(&InputSnapshot::default(), frame_dt);
        if report.win_latched {
            info!("win condition latched at {:.2}s", engine.time.elapsed);
        }

        frames += 1;
        if engine.should_exit() || (cli.frames > 0 && frames >= cli.frames) {
            break;
        }
    }

    info!(
        "ran {frames} frames, {:.2}s simulated",
        engine.time.elapsed
    );
    engine.shutdown();
}
