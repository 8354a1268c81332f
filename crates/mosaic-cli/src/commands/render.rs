//! Headless stage-to-PNG render command

use crate::config::MosaicConfig;
use crate::raster::RasterSurface;
use anyhow::{Context, Result};
use mosaic_cache::{FileRoster, ImageSampler, PixelCache, Roster, RosterProvider};
use mosaic_conductor::Stage;
use mosaic_core::{Rgb, XorShiftRng};
use mosaic_particles::ComputeMode;
use mosaic_runtime::{FrameClock, IntervalTimer, RuntimeSystem, StageEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct RenderArgs {
    pub config: Option<String>,
    pub roster: String,
    pub images: Option<String>,
    pub output: String,
    pub duration_ms: f64,
    pub snapshot_ms: f64,
    pub canvases: Option<u32>,
    pub step: Option<u32>,
    pub batch: Option<u64>,
    pub seed: Option<u32>,
    pub compute: Option<ComputeMode>,
    pub no_shuffle: bool,
    pub realtime: bool,
}

struct Playback {
    duration_ms: f64,
    snapshot_ms: f64,
    realtime: bool,
    output: PathBuf,
}

#[derive(Debug, Default)]
struct RenderSummary {
    frames: u64,
    snapshots: usize,
    captions: usize,
    finished: usize,
    misses: usize,
}

pub fn run(args: RenderArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => MosaicConfig::load_from_file(Path::new(path))?,
        None => MosaicConfig::load()?,
    };
    apply_flags(&mut config, &args);
    config.validate()?;

    let mut roster = FileRoster::new(&args.roster)
        .get_roster()
        .with_context(|| format!("Failed to load roster {}", args.roster))?;
    println!("Loaded roster: {} people", roster.len());
    if !args.no_shuffle {
        let mut rng = if config.stage.seed == 0 {
            XorShiftRng::from_time()
        } else {
            XorShiftRng::new(config.stage.seed)
        };
        roster.shuffle(&mut rng);
    }

    let mut stage = build_stage(&config, roster)?;
    println!(
        "Stage: {} canvases of {}x{}, step {}, compute {}",
        config.stage.canvas_count,
        config.stage.canvas_width,
        config.stage.canvas_height,
        config.stage.step_pixel,
        stage.compute_name()
    );

    let playback = Playback {
        duration_ms: args.duration_ms,
        snapshot_ms: args.snapshot_ms,
        realtime: args.realtime,
        output: PathBuf::from(&args.output),
    };
    let summary = drive(&mut stage, &playback)?;

    println!(
        "Rendered {} frames: {} photos shown, {} finished, {} cache misses",
        summary.frames, summary.captions, summary.finished, summary.misses
    );
    println!(
        "Wrote {} snapshots to {}",
        summary.snapshots,
        playback.output.display()
    );
    Ok(())
}

fn apply_flags(config: &mut MosaicConfig, args: &RenderArgs) {
    if let Some(images) = &args.images {
        config.cache.image_root = images.clone();
    }
    if let Some(canvases) = args.canvases {
        config.stage.canvas_count = canvases;
    }
    if let Some(step) = args.step {
        config.stage.step_pixel = step;
    }
    if let Some(batch) = args.batch {
        config.cache.batch_size = batch;
    }
    if let Some(seed) = args.seed {
        config.stage.seed = seed;
    }
    if let Some(compute) = &args.compute {
        config.particles.compute = compute.clone();
    }
}

fn build_stage(config: &MosaicConfig, roster: Roster) -> Result<Stage<RasterSurface>> {
    let sampler = ImageSampler::new(&config.cache.image_root);
    let cache = PixelCache::new(
        Arc::new(sampler),
        config.cache.loader_threads,
        config.stage.canvas_width,
        config.stage.canvas_height,
    )
    .context("Failed to start pixel cache")?;

    let surfaces = (0..config.stage.canvas_count)
        .map(|_| {
            RasterSurface::new(
                config.stage.canvas_width,
                config.stage.canvas_height,
                Rgb::BLACK,
            )
        })
        .collect();

    Stage::new(
        config.stage.clone(),
        config.particles.clone(),
        config.cache.clone(),
        Arc::new(roster),
        cache,
        surfaces,
    )
    .context("Failed to build stage")
}

fn drive(stage: &mut Stage<RasterSurface>, playback: &Playback) -> Result<RenderSummary> {
    stage.initialize().context("Failed to initialize stage")?;

    let frame_ms = stage.config().frame_ms();
    let frame_budget = Duration::from_secs_f64(frame_ms / 1000.0);
    let mut clock = FrameClock::new();
    if playback.realtime {
        clock.tick();
    }
    let mut snapshot_timer =
        (playback.snapshot_ms > 0.0).then(|| IntervalTimer::new(playback.snapshot_ms));
    let mut summary = RenderSummary::default();

    while clock.now() < playback.duration_ms {
        let frame_start = Instant::now();
        stage.update(&clock).context("Stage update failed")?;
        record_events(stage, &mut summary);

        if let Some(timer) = snapshot_timer.as_mut() {
            if timer.poll(clock.now()) {
                summary.snapshots += write_snapshots(stage, &playback.output, clock.frame)?;
            }
        }
        summary.frames += 1;

        if playback.realtime {
            if let Some(rest) = frame_budget.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(rest);
            }
            clock.tick();
        } else {
            clock.advance(frame_ms);
        }
    }

    summary.snapshots += write_snapshots(stage, &playback.output, clock.frame)?;
    stage.shutdown().context("Stage shutdown failed")?;
    Ok(summary)
}

fn record_events(stage: &mut Stage<RasterSurface>, summary: &mut RenderSummary) {
    for event in stage.drain_events() {
        let canvas = event.canvas();
        match event {
            StageEvent::CaptionShown { text, .. } => {
                log::info!("{}: {}", canvas, text);
                summary.captions += 1;
            }
            StageEvent::CaptionHidden(_) => log::debug!("{}: caption hidden", canvas),
            StageEvent::AnimationFinished(_) => {
                log::debug!("{}: animation finished", canvas);
                summary.finished += 1;
            }
            StageEvent::CacheMiss { index, .. } => {
                log::debug!("{}: photo {} not ready", canvas, index);
                summary.misses += 1;
            }
        }
    }
}

fn write_snapshots(stage: &Stage<RasterSurface>, output: &Path, frame: u64) -> Result<usize> {
    let mut written = 0;
    for (canvas, surface) in stage.surfaces() {
        let path = output
            .join(canvas.to_string())
            .join(format!("frame_{:06}.png", frame));
        surface.save_png(&path)?;
        written += 1;
    }
    log::debug!("Snapshot of frame {} written", frame);
    Ok(written)
}
