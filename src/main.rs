//! mp-retarget - landmark sequence replay
//!
//! Plays a recorded landmark sequence against the built-in reference hand
//! rig and prints the arm targets of every tick as JSON lines.

use clap::Parser;
use glam::Affine3A;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mp_retarget::{
    hand::FingerSegment, ArmSide, CameraModel, Config, HandBindings, LandmarkSequence,
    RetargetingOrchestrator, RigSkeleton,
};

/// Replay a MediaPipe landmark sequence through the retargeter
#[derive(Parser, Debug)]
#[command(name = "mp-retarget", version, about, long_about = None)]
struct Args {
    /// Landmark sequence (JSON)
    sequence: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run (defaults to one pass over the sequence)
    #[arg(short = 'n', long)]
    ticks: Option<usize>,

    /// Seconds per tick (defaults to one sequence frame)
    #[arg(long)]
    dt: Option<f32>,

    /// Camera vertical field of view (degrees)
    #[arg(long, default_value_t = 60.0)]
    fov: f32,

    /// Camera aspect ratio (width / height)
    #[arg(long, default_value_t = 16.0 / 9.0)]
    aspect: f32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", mp_retarget::NAME, mp_retarget::VERSION);

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    let sequence = LandmarkSequence::from_file(&args.sequence)?;
    let fps = sequence.frame_rate(config.playback.fps);
    let ticks = args.ticks.unwrap_or(sequence.len());
    let dt = args.dt.unwrap_or(1.0 / fps);
    if !(dt.is_finite() && dt >= 0.0) {
        anyhow::bail!("--dt must be a non-negative number, got {}", dt);
    }

    let camera = CameraModel::new(args.fov, args.aspect, Affine3A::IDENTITY);
    let mut rig = RigSkeleton::reference_hands();
    let bindings = HandBindings::auto_bind(rig.bones());

    let mut orchestrator = RetargetingOrchestrator::new(config, sequence, &camera);
    orchestrator.rebuild_rest_pose(bindings, &rig);

    info!("Replaying {} ticks at dt={:.4}s", ticks, dt);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for _ in 0..ticks {
        // No IK solver here: targets are reported, fingers are driven
        let targets = orchestrator.tick(dt, &camera, &mut rig, |_, _| {});
        serde_json::to_writer(&mut out, &targets)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    for side in ArmSide::ALL {
        let driven = FingerSegment::ALL
            .iter()
            .filter(|seg| orchestrator.fingers().is_driven(side, **seg))
            .count();
        info!("{} hand: {}/15 finger bones driven", side, driven);
    }

    Ok(())
}
