//! Fixed-capacity particle pool, one per canvas

use crate::particle::{Particle, Phase, SpawnContext};
use mosaic_core::PixelSample;

/// Pre-allocated particles reused across photo activations.
///
/// The backing store is filled once in [`ParticlePool::new`] and never
/// resized; `activate` only resets the first N entries.
pub struct ParticlePool {
    particles: Vec<Particle>,
    active_count: usize,
    all_at_target: bool,
    global_phase_start: Option<f64>,
    last_check: f64,
    check_interval_ms: f64,
}

impl ParticlePool {
    pub fn new(capacity: usize, check_interval_ms: f64) -> Self {
        let mut particles = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            particles.push(Particle::dormant());
        }
        Self {
            particles,
            active_count: 0,
            all_at_target: false,
            global_phase_start: None,
            last_check: f64::NEG_INFINITY,
            check_interval_ms,
        }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn all_at_target(&self) -> bool {
        self.all_at_target
    }

    pub fn global_phase_start(&self) -> Option<f64> {
        self.global_phase_start
    }

    /// Reset the first `min(samples.len(), capacity)` particles onto the
    /// given samples and return them. Excess samples are dropped.
    pub fn activate(
        &mut self,
        samples: &[PixelSample],
        canvas_width: f32,
        canvas_height: f32,
        step_pixel: f32,
        ctx: &mut SpawnContext<'_>,
    ) -> &mut [Particle] {
        let n = samples.len().min(self.particles.len());
        if samples.len() > n {
            log::debug!(
                "Pool truncating {} samples to capacity {}",
                samples.len(),
                n
            );
        }

        for (particle, sample) in self.particles[..n].iter_mut().zip(samples) {
            particle.reset(
                sample.x,
                sample.y,
                sample.color,
                canvas_width,
                canvas_height,
                step_pixel,
                ctx,
            );
        }
        for particle in &mut self.particles[n..self.active_count.max(n)] {
            particle.phase = Phase::Inactive;
            particle.size = 0.0;
        }

        self.active_count = n;
        self.all_at_target = false;
        self.global_phase_start = None;
        self.last_check = f64::NEG_INFINITY;
        &mut self.particles[..n]
    }

    /// Throttled scan for the "everyone arrived" milestone.
    ///
    /// Returns true only on the call that first observes every active
    /// particle at its target; that time becomes `global_phase_start`.
    pub fn update_global_state(&mut self, now: f64) -> bool {
        if self.all_at_target {
            return false;
        }
        if now - self.last_check < self.check_interval_ms {
            return false;
        }
        self.last_check = now;

        if !self.active().iter().all(Particle::is_at_target) {
            return false;
        }

        self.all_at_target = true;
        self.global_phase_start = Some(now);
        log::debug!(
            "All {} particles at target at {:.0}ms",
            self.active_count,
            now
        );
        true
    }

    pub fn active(&self) -> &[Particle] {
        &self.particles[..self.active_count]
    }

    pub fn active_mut(&mut self) -> &mut [Particle] {
        &mut self.particles[..self.active_count]
    }

    /// Park every particle; the backing store is kept
    pub fn deactivate_all(&mut self) {
        for particle in &mut self.particles[..self.active_count] {
            particle.phase = Phase::Inactive;
            particle.size = 0.0;
        }
        self.active_count = 0;
        self.all_at_target = false;
        self.global_phase_start = None;
        self.last_check = f64::NEG_INFINITY;
    }
}
