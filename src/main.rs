// src/main.rs
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pose_angles::input::{read_frames, write_frame};
use pose_angles::simulate::Simulator;
use pose_angles::{
    spawn_poller, AngleRule, AngleSet, BodyAngle, CaptureSession, EngineConfig, EngineError,
    HandAngle, JointName, RawFrame,
};

#[derive(Parser, Debug)]
#[command(name = "pose_angles")]
#[command(version, about = "Joint angles from 2D body and hand keypoints")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute body angles from a JSON Lines keypoint file
    Body(CaptureArgs),
    /// Compute finger angles from a JSON Lines keypoint file
    Hand(CaptureArgs),
    /// Run a synthetic detector stream through a capture session
    Simulate(SimulateArgs),
    /// Print an angle table
    Angles {
        #[arg(long, value_enum, default_value_t = Kind::Body)]
        kind: Kind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Body,
    Hand,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// JSON config file; missing fields use defaults
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory the session folder is created in
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Session folder name
    #[arg(long)]
    session: Option<String>,

    /// Angle label to log at the poll interval, e.g. "Right Elbow Flexion/Extension"
    #[arg(long)]
    watch: Option<String>,

    /// Also write an HTML summary report
    #[arg(long)]
    report: bool,
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// Detector output, one JSON frame per line
    #[arg(long, short)]
    input: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[arg(long, value_enum, default_value_t = Kind::Body)]
    kind: Kind,

    #[arg(long, default_value_t = 300)]
    frames: u64,

    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Also save the generated frames as JSON Lines
    #[arg(long)]
    dump: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
}

fn load_config(args: &OutputArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &args.output {
        config.output_directory = dir.clone();
    }
    if let Some(name) = &args.session {
        config.session_name = Some(name.clone());
    }
    config.validate()?;
    Ok(config)
}

fn parse_watch<A: AngleSet>(label: Option<&str>) -> Result<Option<A>> {
    let Some(label) = label else {
        return Ok(None);
    };
    match A::from_label(label) {
        Some(angle) => Ok(Some(angle)),
        None => bail!(
            "unknown angle `{}`; expected one of: {}",
            label,
            A::labels().join(", ")
        ),
    }
}

async fn run_capture<A, I>(args: &OutputArgs, frames: I, pacing: Option<Duration>) -> Result<()>
where
    A: AngleSet,
    I: IntoIterator<Item = pose_angles::Result<RawFrame>>,
{
    let config = load_config(args)?;
    let watched = parse_watch::<A>(args.watch.as_deref())?;

    let mut session = CaptureSession::<A>::new(&config);
    session.start()?;

    let display = watched.map(|angle| {
        let (tx, mut rx) = mpsc::channel(16);
        let poller = spawn_poller(session.subscribe(), angle, config.poll_interval(), tx);
        let printer = tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                match update.degrees {
                    Some(degrees) => info!(angle = update.angle.label(), "{degrees:.1}°"),
                    None => info!(angle = update.angle.label(), "no reading"),
                }
            }
        });
        (poller, printer)
    });

    let mut failure = None;
    for frame in frames {
        let result = frame.and_then(|frame| session.ingest_raw(&frame));
        match result {
            Ok(_) => {}
            Err(e @ (EngineError::Input { .. } | EngineError::Encoding { .. })) => {
                warn!("skipping frame: {e}");
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
        if let Some(delay) = pacing {
            tokio::time::sleep(delay).await;
        }
    }

    session.stop()?;
    let frames_ingested = session.frames_ingested();
    let recorder = session.into_recorder();

    if let Some((poller, printer)) = display {
        poller.await?;
        printer.await?;
    }

    let csv_path = recorder.export_csv().context("failed to export angle csv")?;
    println!("Recorded {frames_ingested} frames -> {}", csv_path.display());

    if let Some(e) = failure {
        return Err(anyhow::Error::new(e)
            .context("input stopped early; frames read so far were exported"));
    }

    if args.report {
        let report_path = recorder.generate_report().context("failed to write report")?;
        println!("Report -> {}", report_path.display());
    }

    println!();
    println!("{:<36} {:>9} {:>8} {:>8} {:>8}", "angle", "coverage", "min", "mean", "max");
    let cell = |v: Option<f64>| v.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".into());
    for summary in recorder.summary() {
        println!(
            "{:<36} {:>8.1}% {:>8} {:>8} {:>8}",
            summary.label,
            summary.coverage,
            cell(summary.min),
            cell(summary.mean),
            cell(summary.max)
        );
    }

    Ok(())
}

async fn run_file<A: AngleSet>(args: &CaptureArgs) -> Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("cannot open {}", args.input.display()))?;
    run_capture::<A, _>(&args.output, read_frames(BufReader::new(file)), None).await
}

async fn run_simulation(args: &SimulateArgs) -> Result<()> {
    let mut sim = Simulator::new(args.fps);
    let frames: Vec<RawFrame> = (0..args.frames)
        .map(|_| match args.kind {
            Kind::Body => sim.next_body_frame(),
            Kind::Hand => sim.next_hand_frame(),
        })
        .collect();
    info!(frames = sim.frames_generated(), fps = args.fps, "generated synthetic frames");

    if let Some(path) = &args.dump {
        let mut writer = BufWriter::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        );
        for frame in &frames {
            write_frame(&mut writer, frame)?;
        }
        info!(path = %path.display(), "saved synthetic frames");
    }

    let pacing = Some(Duration::from_secs_f64(1.0 / args.fps.max(1.0)));
    let frames = frames.into_iter().map(Ok);
    match args.kind {
        Kind::Body => run_capture::<BodyAngle, _>(&args.output, frames, pacing).await,
        Kind::Hand => run_capture::<HandAngle, _>(&args.output, frames, pacing).await,
    }
}

fn print_table<A: AngleSet>() {
    for angle in A::ALL {
        match angle.rule() {
            AngleRule::Triple { start, vertex, end } => println!(
                "{:<36} {} -> {} <- {}",
                angle.label(),
                start.name(),
                vertex.name(),
                end.name()
            ),
            AngleRule::PlaneRelative {
                proximal,
                distal,
                plane,
            } => println!(
                "{:<36} {} -> {} vs {:?}",
                angle.label(),
                proximal.name(),
                distal.name(),
                plane
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Body(args) => run_file::<BodyAngle>(&args).await,
        Command::Hand(args) => run_file::<HandAngle>(&args).await,
        Command::Simulate(args) => run_simulation(&args).await,
        Command::Angles { kind } => {
            match kind {
                Kind::Body => print_table::<BodyAngle>(),
                Kind::Hand => print_table::<HandAngle>(),
            }
            Ok(())
        }
    }
}
