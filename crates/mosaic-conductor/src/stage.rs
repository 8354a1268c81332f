//! The stage: conductor, cache, and every canvas, ticked once per frame

use crate::canvas::{CanvasAnimation, FrameHandle, PhaseTiming, StepOutcome};
use crate::conductor::{Conductor, TickOutcome};
use crate::config::StageConfig;
use mosaic_cache::{CacheConfig, PixelCache, Roster};
use mosaic_core::{CanvasId, MosaicError, Result, XorShiftRng};
use mosaic_particles::{create_compute, ParticleCompute, ParticleConfig, RenderSurface};
use mosaic_runtime::{EventBus, FrameClock, IntervalTimer, RuntimeSystem, StageEvent};
use std::sync::Arc;

struct CanvasSlot<S> {
    animation: CanvasAnimation,
    surface: S,
    /// Handle of the animation this slot last started
    handle: Option<FrameHandle>,
}

impl<S> CanvasSlot<S> {
    fn is_animating(&self) -> bool {
        self.handle.is_some_and(|h| self.animation.is_current(h))
    }

    /// Cancel the running animation, if this slot started it
    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            if self.animation.is_current(handle) {
                self.animation.cancel();
            }
        }
    }
}

pub struct Stage<S: RenderSurface> {
    config: StageConfig,
    particle_config: ParticleConfig,
    cache_config: CacheConfig,
    roster: Arc<Roster>,
    cache: PixelCache,
    conductor: Conductor,
    canvases: Vec<CanvasSlot<S>>,
    compute: Box<dyn ParticleCompute>,
    events: EventBus,
    timer: IntervalTimer,
    rng: XorShiftRng,
}

impl<S: RenderSurface> Stage<S> {
    /// One surface per canvas, in canvas id order
    pub fn new(
        config: StageConfig,
        particle_config: ParticleConfig,
        cache_config: CacheConfig,
        roster: Arc<Roster>,
        cache: PixelCache,
        surfaces: Vec<S>,
    ) -> Result<Self> {
        config.validate()?;
        particle_config.validate()?;
        cache_config.validate()?;
        if surfaces.len() != config.canvas_count as usize {
            return Err(MosaicError::ConfigError(format!(
                "{} surfaces for {} canvases",
                surfaces.len(),
                config.canvas_count
            )));
        }

        let canvases = CanvasId::all(config.canvas_count)
            .zip(surfaces)
            .map(|(id, mut surface)| {
                surface.resize(config.canvas_width, config.canvas_height);
                CanvasSlot {
                    animation: CanvasAnimation::new(
                        id,
                        config.canvas_width,
                        config.canvas_height,
                        &particle_config,
                    ),
                    surface,
                    handle: None,
                }
            })
            .collect();

        let conductor = Conductor::new(
            config.canvas_count,
            roster.len(),
            cache_config.batch_size,
            cache_config.stale_batches,
            config.max_retries,
        );
        let rng = if config.seed == 0 {
            XorShiftRng::from_time()
        } else {
            XorShiftRng::new(config.seed)
        };

        Ok(Self {
            compute: create_compute(&particle_config.compute),
            timer: IntervalTimer::new(config.tick_interval_ms),
            events: EventBus::new(),
            config,
            particle_config,
            cache_config,
            roster,
            cache,
            conductor,
            canvases,
            rng,
        })
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn conductor(&self) -> &Conductor {
        &self.conductor
    }

    pub fn cache(&self) -> &PixelCache {
        &self.cache
    }

    pub fn animation(&self, canvas: CanvasId) -> Option<&CanvasAnimation> {
        self.canvases.get(canvas.index()).map(|slot| &slot.animation)
    }

    /// Whether `canvas` is still running the animation the stage last
    /// started on it
    pub fn is_animating(&self, canvas: CanvasId) -> bool {
        self.canvases
            .get(canvas.index())
            .is_some_and(CanvasSlot::is_animating)
    }

    pub fn surface(&self, canvas: CanvasId) -> Option<&S> {
        self.canvases.get(canvas.index()).map(|slot| &slot.surface)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (CanvasId, &S)> {
        self.canvases
            .iter()
            .map(|slot| (slot.animation.id(), &slot.surface))
    }

    pub fn compute_name(&self) -> &str {
        self.compute.name()
    }

    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        self.events.drain()
    }

    fn run_tick(&mut self, now: f64) {
        match self.conductor.tick(&self.cache) {
            TickOutcome::Idle => {}
            TickOutcome::Assigned {
                canvas,
                index,
                looped,
                samples,
            } => {
                let person = &self.roster.people()[looped];
                let Some(slot) = self.canvases.get_mut(canvas.index()) else {
                    return;
                };
                if slot.is_animating() {
                    log::warn!("{} still animating; cancelling it for photo {}", canvas, index);
                }
                slot.cancel();
                slot.handle = Some(slot.animation.start(
                    &samples,
                    index,
                    now,
                    self.config.step_pixel,
                    &self.particle_config,
                    &mut self.rng,
                ));
                log::info!(
                    "{} showing {} (photo {})",
                    canvas,
                    person.display_name,
                    index
                );
                self.events.push(StageEvent::CaptionShown {
                    canvas,
                    text: person.caption(),
                });
            }
            TickOutcome::Retry { canvas, index } | TickOutcome::Skipped { canvas, index } => {
                self.events.push(StageEvent::CacheMiss { canvas, index });
            }
        }
    }
}

impl<S: RenderSurface> RuntimeSystem for Stage<S> {
    /// Seeds the cache and blocks until the first two batches are resident
    fn initialize(&mut self) -> Result<()> {
        let report = self.cache.initialize(
            Arc::clone(&self.roster),
            self.config.step_pixel,
            self.cache_config.batch_size,
        );
        if report.loaded == 0 {
            log::warn!(
                "No photos loaded during initialization ({} failed)",
                report.failed
            );
        }
        log::info!(
            "Stage ready: {} canvases, {} people, compute {}",
            self.config.canvas_count,
            self.roster.len(),
            self.compute.name()
        );
        Ok(())
    }

    fn update(&mut self, clock: &FrameClock) -> Result<()> {
        let now = clock.now();
        if self.timer.poll(now) {
            self.run_tick(now);
        }

        let timing = PhaseTiming {
            hold_ms: self.config.hold_ms,
            explode_window_ms: self.config.explode_window_ms,
        };
        for slot in &mut self.canvases {
            let canvas = slot.animation.id();
            match slot.animation.step(
                now,
                timing,
                self.compute.as_mut(),
                &self.particle_config,
                &mut self.rng,
                &mut slot.surface,
            ) {
                StepOutcome::ExplosionStarted => {
                    self.events.push(StageEvent::CaptionHidden(canvas));
                }
                StepOutcome::Finished => {
                    slot.handle = None;
                    if let Err(e) = self.conductor.finish(canvas) {
                        log::error!("{}", e);
                        debug_assert!(false, "{}", e);
                    }
                    self.events.push(StageEvent::AnimationFinished(canvas));
                }
                StepOutcome::Idle | StepOutcome::Running => {}
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        for slot in &mut self.canvases {
            slot.cancel();
        }
        log::info!(
            "Stage stopped after {} photos",
            self.conductor.next_person_index()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "stage"
    }
}
