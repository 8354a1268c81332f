//! Particle state machine: falling → at target → exploding → inactive

use crate::config::{FormationVariant, ParticleConfig};
use crate::curves::{decay, late_growth};
use crate::surface::RenderSurface;
use mosaic_core::{Rgb, Vec2, XorShiftRng};

/// Lifecycle phase of a particle within one photo cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Falling,
    AtTarget,
    Exploding,
    Inactive,
}

/// Everything a reset needs besides the target pixel
pub struct SpawnContext<'a> {
    pub now: f64,
    pub config: &'a ParticleConfig,
    pub rng: &'a mut XorShiftRng,
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec2,
    pub target: Vec2,
    /// Where the current formation flight began
    pub origin: Vec2,
    pub color: Rgb,
    pub size: f32,
    pub target_size: f32,
    pub velocity: Vec2,
    pub phase: Phase,
    pub start_time: f64,
    pub duration: f64,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub sway_amount: f32,
    pub settlement_started: bool,
    pub rotation_at_settlement: f32,
    /// Size-derived multiplier on explosion speed and gravity
    pub weight: f32,
    pub shrink_rate: f32,
    at_target: bool,
}

impl Particle {
    /// A parked particle: inactive, zero size, nowhere in particular
    pub fn dormant() -> Self {
        Self {
            position: Vec2::ZERO,
            target: Vec2::ZERO,
            origin: Vec2::ZERO,
            color: Rgb::WHITE,
            size: 0.0,
            target_size: 0.0,
            velocity: Vec2::ZERO,
            phase: Phase::Inactive,
            start_time: 0.0,
            duration: 1.0,
            rotation: 0.0,
            rotation_speed: 0.0,
            sway_amount: 0.0,
            settlement_started: false,
            rotation_at_settlement: 0.0,
            weight: 1.0,
            shrink_rate: 0.0,
            at_target: false,
        }
    }

    /// Re-purpose this particle for a new target pixel.
    ///
    /// Callable from any phase; always rewinds to `Falling` with fresh
    /// randomized start position and timing.
    #[allow(clippy::too_many_arguments)]
    pub fn reset(
        &mut self,
        x: f32,
        y: f32,
        color: Rgb,
        canvas_width: f32,
        canvas_height: f32,
        step_pixel: f32,
        ctx: &mut SpawnContext<'_>,
    ) {
        let config = ctx.config;
        let rng = &mut *ctx.rng;

        self.target = Vec2::new(x, y);
        self.color = config.color;
        self.size = 0.0;
        self.target_size = config.target_size(color, step_pixel);
        self.velocity = Vec2::ZERO;

        self.origin = match config.variant {
            FormationVariant::Outside => {
                outside_position(rng, canvas_width, canvas_height, config.outside_offset)
            }
            FormationVariant::Nearby => nearby_position(rng, self.target, config.nearby_spread),
        };
        self.position = self.origin;

        self.start_time = ctx.now + rng.range_f64(0.0, config.start_jitter_ms);
        self.duration = rng.range_f64(config.duration_min_ms, config.duration_max_ms);

        self.rotation = 0.0;
        self.rotation_speed = rng.range(-config.rotation_speed_max, config.rotation_speed_max);
        self.sway_amount = rng.range(0.0, config.sway_max);
        self.settlement_started = false;
        self.rotation_at_settlement = 0.0;
        self.weight = 1.0;
        self.shrink_rate = config.shrink_rate;
        self.at_target = false;
        self.phase = Phase::Falling;
    }

    pub fn is_at_target(&self) -> bool {
        self.at_target
    }

    pub fn is_inactive(&self) -> bool {
        self.phase == Phase::Inactive
    }

    /// Normalized formation progress at `now`, clamped to [0, 1]
    pub fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start_time) / self.duration).clamp(0.0, 1.0) as f32
    }

    /// Advance one tick
    pub fn update(&mut self, now: f64, config: &ParticleConfig) {
        match self.phase {
            Phase::Falling => self.update_falling(now, config),
            Phase::Exploding => self.update_exploding(config),
            Phase::AtTarget | Phase::Inactive => {}
        }
    }

    fn update_falling(&mut self, now: f64, config: &ParticleConfig) {
        let elapsed = (now - self.start_time) / self.duration.max(f64::EPSILON);

        if elapsed < 0.0 {
            // Not launched yet: idle at the origin as dust
            self.size = config.dust_size;
            return;
        }

        if elapsed >= 1.0 {
            self.position = self.target;
            self.size = self.target_size;
            self.rotation = 0.0;
            self.at_target = true;
            self.phase = Phase::AtTarget;
            return;
        }

        let progress = elapsed as f32;
        let eased = config.easing.apply(progress);
        let envelope = decay(progress, config.decay_exponent);

        let sway = (progress * std::f32::consts::PI * 1.5 + self.sway_amount).sin()
            * self.sway_amount
            * config.sway_scale
            * envelope;
        let base = self.origin.lerp(self.target, eased);
        self.position = Vec2::new(base.x + sway, base.y);

        if progress < config.settle_start {
            self.rotation += self.rotation_speed * 0.4 * envelope;
        } else {
            if !self.settlement_started {
                self.settlement_started = true;
                self.rotation_at_settlement = self.rotation;
            }
            let settle = (progress - config.settle_start) / (1.0 - config.settle_start);
            let eased_settle = settle.clamp(0.0, 1.0).powf(config.settle_exponent);
            self.rotation = self.rotation_at_settlement * (1.0 - eased_settle);
        }

        let growth = late_growth(progress, config.growth_start, config.growth_exponent);
        self.size = config.dust_size + (self.target_size - config.dust_size) * growth;
    }

    fn update_exploding(&mut self, config: &ParticleConfig) {
        self.velocity = self.velocity * config.air_resistance;
        self.velocity.y += config.gravity * self.weight;
        self.position += self.velocity;
        self.size = (self.size - self.shrink_rate).max(0.0);

        // Either condition ends the particle: fully shrunk, or stalled in place
        if self.size <= 0.0 || self.velocity.length() < config.stall_epsilon {
            self.phase = Phase::Inactive;
        }
    }

    /// Launch outward. Only a particle resting at its target can explode;
    /// returns whether the transition happened.
    pub fn explode(&mut self, config: &ParticleConfig, rng: &mut XorShiftRng) -> bool {
        if self.phase != Phase::AtTarget {
            return false;
        }
        self.weight = 1.0 + config.weight_scale * self.size;
        self.velocity = Vec2::new(
            (rng.next_f32() - 0.5) * config.explosion_speed_x * self.weight,
            (rng.next_f32() - 0.5) * config.explosion_speed_y * self.weight,
        );
        self.shrink_rate = config.shrink_rate + rng.range(0.0, config.shrink_jitter);
        self.phase = Phase::Exploding;
        true
    }

    /// Whether the particle lies strictly inside a `width` x `height` canvas
    pub fn is_within(&self, width: f32, height: f32) -> bool {
        self.position.x > 0.0
            && self.position.x < width
            && self.position.y > 0.0
            && self.position.y < height
    }

    /// Draw as a centered square; rotated about its center only while falling
    pub fn draw(&self, surface: &mut dyn RenderSurface) {
        if self.size <= 0.0 || self.phase == Phase::Inactive {
            return;
        }
        let half = self.size / 2.0;
        if self.phase == Phase::Falling && self.rotation != 0.0 {
            surface.save();
            surface.translate(self.position.x, self.position.y);
            surface.rotate(self.rotation);
            surface.fill_rect(-half, -half, self.size, self.size, self.color);
            surface.restore();
        } else {
            surface.fill_rect(
                self.position.x - half,
                self.position.y - half,
                self.size,
                self.size,
                self.color,
            );
        }
    }
}

/// A point `offset` pixels beyond a random edge of the canvas
fn outside_position(rng: &mut XorShiftRng, width: f32, height: f32, offset: f32) -> Vec2 {
    match rng.index(4) {
        0 => Vec2::new(rng.range(0.0, width.max(1.0)), -offset),
        1 => Vec2::new(rng.range(0.0, width.max(1.0)), height + offset),
        2 => Vec2::new(-offset, rng.range(0.0, height.max(1.0))),
        _ => Vec2::new(width + offset, rng.range(0.0, height.max(1.0))),
    }
}

/// A point up to `spread` pixels away from `target` along one of four directions,
/// with half that much jitter on the cross axis
fn nearby_position(rng: &mut XorShiftRng, target: Vec2, spread: f32) -> Vec2 {
    let half = spread / 2.0;
    match rng.index(4) {
        0 => Vec2::new(target.x + rng.range(-half, half), target.y - rng.range(0.0, spread)),
        1 => Vec2::new(target.x + rng.range(-half, half), target.y + rng.range(0.0, spread)),
        2 => Vec2::new(target.x - rng.range(0.0, spread), target.y + rng.range(-half, half)),
        _ => Vec2::new(target.x + rng.range(0.0, spread), target.y + rng.range(-half, half)),
    }
}
