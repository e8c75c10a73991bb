//! palm_stage — interactive entry point.

use std::path::PathBuf;

use clap::Parser;
use palm_stage::app::{run, RunOptions};
use palm_stage::color::Rgb;
use palm_stage::config::StageConfig;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "palm_stage", about = "Hand-gesture interaction stage (keyboard/mouse simulator)")]
struct Cli {
    /// Stage config in RON; any omitted field keeps its default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Spawn a ring of shapes and queue the demo messages
    #[arg(long)]
    quick: bool,

    /// Seed for shape geometry
    #[arg(long)]
    seed: Option<u64>,

    /// Print the effective config as RON and exit
    #[arg(long)]
    dump_config: bool,

    /// Queue a text message (repeatable)
    #[arg(long = "message", value_name = "TEXT")]
    messages: Vec<String>,

    /// Queue an image or GIF (repeatable)
    #[arg(long = "media", value_name = "FILE")]
    media: Vec<PathBuf>,

    /// Card color for queued messages, `#rgb` or `#rrggbb`
    #[arg(long, value_parser = parse_color)]
    color: Option<Rgb>,

    /// Play recorded frames (RON list of frames) instead of the simulator
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// With --replay: no window, log a summary
    #[arg(long, requires = "replay")]
    headless: bool,
}

fn parse_color(s: &str) -> Result<Rgb, String> {
    Rgb::parse_hex(s).ok_or_else(|| format!("not a hex color: {}", s))
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palm_stage=info".into()),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => match StageConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => StageConfig::default(),
    };
    if cli.seed.is_some() {
        config.shapes.seed = cli.seed;
    }

    if cli.dump_config {
        match config.to_ron_string() {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    info!("palm_stage v{} starting", env!("CARGO_PKG_VERSION"));
    println!();
    println!("  P=pinch (hold)  O=open palm (hold)  H=second hand  2=two-hand pinch");
    println!("  N=spawn shape   M=queue message     Q=quit");
    println!();

    let opts = RunOptions {
        config,
        messages: cli.messages,
        media:    cli.media,
        color:    cli.color,
        quick:    cli.quick,
        replay:   cli.replay,
        headless: cli.headless,
    };

    if let Err(e) = run(opts) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
