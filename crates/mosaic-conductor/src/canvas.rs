//! Per-canvas animation loop: formation → hold → explosion

use mosaic_core::{CanvasId, PixelSample, XorShiftRng};
use mosaic_particles::{
    ParticleCompute, ParticleConfig, ParticlePool, Phase, RenderSurface, SpawnContext,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationPhase {
    Idle,
    Forming,
    /// Photo complete; explosion starts at `until`
    Holding { until: f64 },
    Exploding,
    Finished,
}

/// Identifies one started animation. Starting a new photo on the same
/// canvas invalidates every earlier handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing to animate
    Idle,
    Running,
    /// Hold elapsed; detonations are scheduled from this frame on
    ExplosionStarted,
    /// Every particle has left the canvas or gone inactive
    Finished,
}

/// Timing knobs for the two phases
#[derive(Debug, Clone, Copy)]
pub struct PhaseTiming {
    pub hold_ms: f64,
    pub explode_window_ms: f64,
}

pub struct CanvasAnimation {
    id: CanvasId,
    width: f32,
    height: f32,
    pool: ParticlePool,
    /// Detonation time per active particle
    fuses: Vec<f64>,
    phase: AnimationPhase,
    generation: u64,
    index: Option<u64>,
}

impl CanvasAnimation {
    pub fn new(id: CanvasId, width: u32, height: u32, config: &ParticleConfig) -> Self {
        Self {
            id,
            width: width as f32,
            height: height as f32,
            pool: ParticlePool::new(config.capacity, config.global_check_interval_ms),
            fuses: Vec::with_capacity(config.capacity),
            phase: AnimationPhase::Idle,
            generation: 0,
            index: None,
        }
    }

    pub fn id(&self) -> CanvasId {
        self.id
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    /// Absolute photo index being shown
    pub fn index(&self) -> Option<u64> {
        self.index
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.phase, AnimationPhase::Idle | AnimationPhase::Finished)
    }

    pub fn is_current(&self, handle: FrameHandle) -> bool {
        handle.0 == self.generation && self.is_running()
    }

    /// Begin forming a new photo, cancelling whatever was running
    pub fn start(
        &mut self,
        samples: &[PixelSample],
        index: u64,
        now: f64,
        step_pixel: u32,
        config: &ParticleConfig,
        rng: &mut XorShiftRng,
    ) -> FrameHandle {
        if self.is_running() {
            log::warn!(
                "{} force-started photo {} while {:?}; cancelling previous frames",
                self.id,
                index,
                self.phase
            );
        }
        self.generation += 1;
        self.fuses.clear();

        let mut ctx = SpawnContext { now, config, rng };
        let active = self.pool.activate(
            samples,
            self.width,
            self.height,
            step_pixel as f32,
            &mut ctx,
        );
        log::debug!(
            "{} forming photo {} with {} particles",
            self.id,
            index,
            active.len()
        );

        self.index = Some(index);
        self.phase = AnimationPhase::Forming;
        FrameHandle(self.generation)
    }

    /// Stop immediately and park all particles
    pub fn cancel(&mut self) {
        if self.is_running() {
            log::debug!("{} cancelled", self.id);
        }
        self.generation += 1;
        self.pool.deactivate_all();
        self.fuses.clear();
        self.phase = AnimationPhase::Idle;
        self.index = None;
    }

    /// Advance one frame and redraw the canvas
    pub fn step(
        &mut self,
        now: f64,
        timing: PhaseTiming,
        compute: &mut dyn ParticleCompute,
        config: &ParticleConfig,
        rng: &mut XorShiftRng,
        surface: &mut dyn RenderSurface,
    ) -> StepOutcome {
        let outcome = match self.phase {
            AnimationPhase::Idle | AnimationPhase::Finished => return StepOutcome::Idle,
            AnimationPhase::Forming => {
                compute.update(self.pool.active_mut(), now, config);
                self.pool.update_global_state(now);
                if let Some(formed_at) = self.pool.global_phase_start() {
                    self.phase = AnimationPhase::Holding {
                        until: formed_at + timing.hold_ms,
                    };
                }
                StepOutcome::Running
            }
            AnimationPhase::Holding { until } => {
                if now >= until {
                    self.arm_fuses(now, timing.explode_window_ms, rng);
                    self.phase = AnimationPhase::Exploding;
                    StepOutcome::ExplosionStarted
                } else {
                    StepOutcome::Running
                }
            }
            AnimationPhase::Exploding => {
                for (particle, fuse) in self.pool.active_mut().iter_mut().zip(&self.fuses) {
                    if particle.phase == Phase::AtTarget && now >= *fuse {
                        particle.explode(config, rng);
                    }
                }
                compute.update(self.pool.active_mut(), now, config);

                let (w, h) = (self.width, self.height);
                let cleared = self.pool.active().iter().all(|p| {
                    p.phase != Phase::AtTarget && (p.is_inactive() || !p.is_within(w, h))
                });
                if cleared {
                    self.phase = AnimationPhase::Finished;
                    log::debug!("{} finished photo {:?}", self.id, self.index);
                    StepOutcome::Finished
                } else {
                    StepOutcome::Running
                }
            }
        };

        self.draw(surface);
        outcome
    }

    fn arm_fuses(&mut self, now: f64, window_ms: f64, rng: &mut XorShiftRng) {
        self.fuses.clear();
        for _ in 0..self.pool.active_count() {
            self.fuses.push(now + rng.range_f64(0.0, window_ms));
        }
    }

    fn draw(&self, surface: &mut dyn RenderSurface) {
        surface.clear(self.width, self.height);
        for particle in self.pool.active() {
            particle.draw(surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::Rgb;
    use mosaic_particles::{InProcessCompute, RecordingSurface};

    const TIMING: PhaseTiming = PhaseTiming {
        hold_ms: 2000.0,
        explode_window_ms: 3000.0,
    };

    fn samples(n: usize) -> Vec<PixelSample> {
        (0..n)
            .map(|i| {
                let x = 20.0 + (i % 8) as f32 * 22.0;
                let y = 20.0 + (i / 8) as f32 * 22.0;
                PixelSample::new(x, y, Rgb::BLACK)
            })
            .collect()
    }

    fn small_config() -> ParticleConfig {
        ParticleConfig {
            capacity: 64,
            ..Default::default()
        }
    }

    /// Step at 60 fps until `until` returns true or the time budget runs out
    fn run_until(
        anim: &mut CanvasAnimation,
        now: &mut f64,
        config: &ParticleConfig,
        rng: &mut XorShiftRng,
        surface: &mut RecordingSurface,
        mut until: impl FnMut(StepOutcome) -> bool,
    ) -> bool {
        let mut compute = InProcessCompute;
        let deadline = *now + 120_000.0;
        while *now < deadline {
            *now += 16.0;
            let outcome = anim.step(*now, TIMING, &mut compute, config, rng, surface);
            if until(outcome) {
                return true;
            }
        }
        false
    }

    fn phase_tag(phase: AnimationPhase) -> &'static str {
        match phase {
            AnimationPhase::Idle => "idle",
            AnimationPhase::Forming => "forming",
            AnimationPhase::Holding { .. } => "holding",
            AnimationPhase::Exploding => "exploding",
            AnimationPhase::Finished => "finished",
        }
    }

    #[test]
    fn full_lifecycle_in_order() {
        let config = small_config();
        let mut rng = XorShiftRng::new(21);
        let mut surface = RecordingSurface::new(200, 300);
        let mut anim = CanvasAnimation::new(CanvasId(0), 200, 300, &config);
        let mut now = 0.0;

        let handle = anim.start(&samples(40), 0, now, 22, &config, &mut rng);
        assert!(anim.is_current(handle));

        let mut phases = vec![phase_tag(anim.phase())];
        let mut explosion_started = 0;
        let mut compute = InProcessCompute;
        let mut finished = false;
        while now < 120_000.0 && !finished {
            now += 16.0;
            let outcome = anim.step(now, TIMING, &mut compute, &config, &mut rng, &mut surface);
            let tag = phase_tag(anim.phase());
            if phases.last() != Some(&tag) {
                phases.push(tag);
            }
            if outcome == StepOutcome::ExplosionStarted {
                explosion_started += 1;
            }
            finished = outcome == StepOutcome::Finished;
        }

        assert!(finished);
        assert_eq!(phases, vec!["forming", "holding", "exploding", "finished"]);
        assert_eq!(explosion_started, 1);
        assert!(!anim.is_current(handle));
        assert!(surface.clears > 0);
        assert!(anim
            .pool()
            .active()
            .iter()
            .all(|p| p.is_inactive() || !p.is_within(200.0, 300.0)));
    }

    #[test]
    fn explosion_never_starts_before_hold_elapses() {
        let config = small_config();
        let mut rng = XorShiftRng::new(23);
        let mut surface = RecordingSurface::new(200, 300);
        let mut anim = CanvasAnimation::new(CanvasId(0), 200, 300, &config);
        let mut compute = InProcessCompute;
        anim.start(&samples(16), 0, 0.0, 22, &config, &mut rng);

        let mut now = 0.0;
        let mut hold_until = None;
        let mut exploded_at = None;
        while now < 60_000.0 && exploded_at.is_none() {
            now += 16.0;
            let outcome = anim.step(now, TIMING, &mut compute, &config, &mut rng, &mut surface);
            if let AnimationPhase::Holding { until } = anim.phase() {
                hold_until.get_or_insert(until);
                // Formation is frozen during the hold
                assert!(anim.pool().active().iter().all(|p| p.phase == Phase::AtTarget));
            }
            if outcome == StepOutcome::ExplosionStarted {
                exploded_at = Some(now);
            }
        }
        let hold_until = hold_until.unwrap();
        let exploded_at = exploded_at.unwrap();
        assert!(exploded_at >= hold_until);
        let formed = anim.pool().global_phase_start().unwrap();
        assert!((hold_until - formed - TIMING.hold_ms).abs() < 1e-9);
    }

    #[test]
    fn restart_invalidates_previous_handle() {
        let config = small_config();
        let mut rng = XorShiftRng::new(24);
        let mut anim = CanvasAnimation::new(CanvasId(0), 200, 300, &config);
        let first = anim.start(&samples(10), 0, 0.0, 22, &config, &mut rng);
        let second = anim.start(&samples(5), 1, 100.0, 22, &config, &mut rng);
        assert!(!anim.is_current(first));
        assert!(anim.is_current(second));
        assert_eq!(anim.index(), Some(1));
        assert_eq!(anim.pool().active_count(), 5);

        anim.cancel();
        assert!(!anim.is_current(second));
        assert_eq!(anim.phase(), AnimationPhase::Idle);
    }

    #[test]
    fn idle_canvas_does_not_draw() {
        let config = small_config();
        let mut rng = XorShiftRng::new(25);
        let mut surface = RecordingSurface::new(200, 300);
        let mut anim = CanvasAnimation::new(CanvasId(0), 200, 300, &config);
        let mut compute = InProcessCompute;
        let outcome = anim.step(0.0, TIMING, &mut compute, &config, &mut rng, &mut surface);
        assert_eq!(outcome, StepOutcome::Idle);
        assert_eq!(surface.clears, 0);
    }

    #[test]
    fn empty_photo_completes() {
        let config = small_config();
        let mut rng = XorShiftRng::new(26);
        let mut surface = RecordingSurface::new(200, 300);
        let mut anim = CanvasAnimation::new(CanvasId(0), 200, 300, &config);
        let mut now = 0.0;
        anim.start(&[], 0, now, 22, &config, &mut rng);
        assert!(run_until(&mut anim, &mut now, &config, &mut rng, &mut surface, |o| {
            o == StepOutcome::Finished
        }));
        assert!(now >= TIMING.hold_ms);
    }
}
