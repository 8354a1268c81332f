//! Mosaic CLI - Command-line interface for the Mosaic particle portrait engine

mod commands;
mod config;
mod raster;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{render, roster, sample};
use mosaic_particles::ComputeMode;

#[derive(Parser)]
#[command(name = "mosaic")]
#[command(about = "Particle portraits that fall into place and explode away", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Read this config file instead of the global and project layers
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the stage headless and write PNG snapshots of every canvas
    Render {
        /// Roster file (JSON array or TOML with [[people]])
        roster: String,

        /// Directory image refs are resolved against (overrides cache.image_root)
        #[arg(long)]
        images: Option<String>,

        /// Directory for PNG snapshots
        #[arg(short, long, default_value = "frames")]
        output: String,

        /// Stage time to simulate, in milliseconds
        #[arg(long, default_value = "30000")]
        duration_ms: f64,

        /// Snapshot period in stage milliseconds (0 writes only the final frame)
        #[arg(long, default_value = "1000")]
        snapshot_ms: f64,

        /// Number of canvases
        #[arg(long)]
        canvases: Option<u32>,

        /// Sampling stride in pixels
        #[arg(long)]
        step: Option<u32>,

        /// Photos per cache batch
        #[arg(long)]
        batch: Option<u64>,

        /// PRNG seed for roster shuffle and particles (0 seeds from the clock)
        #[arg(long)]
        seed: Option<u32>,

        /// Particle update strategy: in_process, offloaded, offloaded:<workers>
        #[arg(long, value_parser = parse_compute)]
        compute: Option<ComputeMode>,

        /// Keep the roster in file order
        #[arg(long)]
        no_shuffle: bool,

        /// Pace frames against the wall clock instead of simulating
        #[arg(long)]
        realtime: bool,
    },

    /// Sample an image and report the resulting particle targets
    Sample {
        /// Path to image file
        image: String,

        /// Sampling stride in pixels
        #[arg(long, default_value = "22")]
        step: u32,

        /// Target canvas width
        #[arg(long, default_value = "480")]
        width: u32,

        /// Target canvas height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate and list a roster
    Roster {
        /// Roster file (JSON array or TOML with [[people]])
        file: String,

        /// Show the playback order for this seed
        #[arg(long)]
        shuffle: Option<u32>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn parse_compute(s: &str) -> Result<ComputeMode, String> {
    config::parse_compute_mode(s).map_err(|e| format!("{:#}", e))
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Render {
            roster,
            images,
            output,
            duration_ms,
            snapshot_ms,
            canvases,
            step,
            batch,
            seed,
            compute,
            no_shuffle,
            realtime,
        } => render::run(render::RenderArgs {
            config: cli.config,
            roster,
            images,
            output,
            duration_ms,
            snapshot_ms,
            canvases,
            step,
            batch,
            seed,
            compute,
            no_shuffle,
            realtime,
        }),
        Commands::Sample {
            image,
            step,
            width,
            height,
            format,
        } => sample::run(sample::SampleArgs {
            image,
            step,
            width,
            height,
            format,
        }),
        Commands::Roster {
            file,
            shuffle,
            format,
        } => roster::run(&file, shuffle, &format),
    }
}
