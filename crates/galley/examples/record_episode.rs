//! Galley Replay — recording an episode and verifying it.
//!
//! Demonstrates:
//!   1. Loading the reference kitchen from `configs/kitchen.toml`
//!   2. Driving it with a random policy over the valid actions
//!   3. Recording each episode to its own file with a DirectorySink
//!   4. Loading the first recording and re-running it to prove determinism
//!
//! Run with:
//!   RUST_LOG=info cargo run -p galley --example record_episode [config] [out_dir]
//!
//! Set `GALLEY_COMPRESS=1` to write gzipped `.jsonl.gz` logs.

use std::path::PathBuf;

use galley::prelude::*;
use galley::replay::{replay_and_compare, SinkFactory};
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

const EPISODES: usize = 2;
const POLICY_SEED: u64 = 17;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn run_episode<F: SinkFactory>(env: &mut RecordingEnv<F>, policy: &mut ChaCha8Rng) -> StepResult {
    env.reset();
    loop {
        let node_count = env.env().node_count();
        let choice = env
            .valid_actions()
            .into_iter()
            .choose(policy)
            .unwrap_or(node_count);
        let action = Action::from_index(choice, node_count).unwrap_or(Action::Interact);
        let result = env.step(action);
        if result.is_done() {
            return result;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from).unwrap_or_else(|| {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../configs/kitchen.toml"))
    });
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("galley-replays"));

    let config = KitchenConfig::load(&config_path)?;
    let options = RecordingOptions {
        config_path: config_path.display().to_string(),
        compress: std::env::var("GALLEY_COMPRESS").is_ok_and(|v| v == "1"),
        ..RecordingOptions::default()
    };
    let mut env = RecordingEnv::new(
        KitchenEnv::new(&config)?,
        DirectorySink::new(&out_dir, "episode"),
        options,
    );
    let mut policy = ChaCha8Rng::seed_from_u64(POLICY_SEED);

    let mut first_path = None;
    for episode in 0..EPISODES {
        let last = run_episode(&mut env, &mut policy);
        if let Some(err) = env.take_recording_error() {
            tracing::warn!(episode, error = %err, "episode was not fully recorded");
        }
        let path = env.sinks().last_path().map(|p| p.to_path_buf());
        if first_path.is_none() {
            first_path = path.clone();
        }
        println!(
            "episode {episode}: {} ticks, {} delivered, {} expired -> {}",
            last.snapshot.tick,
            last.snapshot.completed_orders,
            env.env().world().expired_orders(),
            path.as_deref().map_or("<not recorded>".into(), |p| p.display().to_string()),
        );
    }
    drop(env);

    let Some(path) = first_path else {
        return Ok(());
    };
    let loaded = ReplayLoader::load_path(&path)?;
    let timeline = ReplayTimeline::new(loaded.clone());
    println!(
        "loaded {}: {} keyframes, {} actions, {} skipped lines",
        path.display(),
        timeline.keyframes().count(),
        timeline.actions().len(),
        loaded.warnings.len(),
    );

    // A fresh env replays its first episode from the same RNG state.
    let mut fresh = KitchenEnv::new(&config)?;
    match replay_and_compare(&loaded, &mut fresh) {
        None => println!("replay verified: every keyframe matches"),
        Some(report) => {
            println!(
                "replay diverged at tick {}: {} component(s) differ",
                report.tick,
                report.divergences.len()
            );
            std::process::exit(1);
        }
    }
    Ok(())
}
