//! Particle configuration (parsed from the `[particles]` TOML table)
//!
//! Every visual constant of the formation and explosion phases lives here.
//! None of them are invariants; they are tuning knobs.

use crate::curves::Easing;
use mosaic_core::{MosaicError, Result, Rgb};
use serde::{Deserialize, Serialize};

/// Where a particle starts its formation flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationVariant {
    /// Fully off-canvas, beyond one of the four edges
    Outside,
    /// Close to the target with a small random offset
    Nearby,
}

/// How per-frame particle updates are computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ComputeMode {
    InProcess,
    Offloaded { workers: usize, timeout_ms: u64 },
}

impl Default for ComputeMode {
    fn default() -> Self {
        ComputeMode::InProcess
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Pool size per canvas; samples beyond this are dropped
    pub capacity: usize,
    /// Color every particle is drawn with
    pub color: Rgb,

    // ── Target size from brightness ──
    pub size_factor: f32,
    pub min_size_factor: f32,
    pub dust_size: f32,

    // ── Formation ──
    pub variant: FormationVariant,
    pub outside_offset: f32,
    pub nearby_spread: f32,
    pub start_jitter_ms: f64,
    pub duration_min_ms: f64,
    pub duration_max_ms: f64,
    pub easing: Easing,
    /// Progress at which size starts growing from dust toward target
    pub growth_start: f32,
    pub growth_exponent: f32,
    pub sway_max: f32,
    pub sway_scale: f32,
    pub rotation_speed_max: f32,
    /// Progress at which rotation is captured and eased back to zero
    pub settle_start: f32,
    pub settle_exponent: f32,
    pub decay_exponent: f32,

    // ── Explosion ──
    pub explosion_speed_x: f32,
    pub explosion_speed_y: f32,
    pub air_resistance: f32,
    pub gravity: f32,
    pub shrink_rate: f32,
    pub shrink_jitter: f32,
    /// Extra speed and gravity per unit of size; 0 disables weighting
    pub weight_scale: f32,
    pub stall_epsilon: f32,

    /// Minimum spacing between pool-wide "all at target" scans
    pub global_check_interval_ms: f64,

    pub compute: ComputeMode,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            capacity: 4320,
            color: Rgb::WHITE,
            size_factor: 0.8,
            min_size_factor: 0.2,
            dust_size: 0.2,
            variant: FormationVariant::Nearby,
            outside_offset: 1000.0,
            nearby_spread: 100.0,
            start_jitter_ms: 1000.0,
            duration_min_ms: 4000.0,
            duration_max_ms: 14000.0,
            easing: Easing::SineInOut,
            growth_start: 0.7,
            growth_exponent: 0.6,
            sway_max: 0.5,
            sway_scale: 12.0,
            rotation_speed_max: 0.05,
            settle_start: 0.8,
            settle_exponent: 0.4,
            decay_exponent: 1.2,
            explosion_speed_x: 3.0,
            explosion_speed_y: 2.0,
            air_resistance: 0.98,
            gravity: 0.0,
            shrink_rate: 0.5,
            shrink_jitter: 0.0,
            weight_scale: 0.0,
            stall_epsilon: 0.1,
            global_check_interval_ms: 100.0,
            compute: ComputeMode::InProcess,
        }
    }
}

impl ParticleConfig {
    /// Parse from a `[particles]` TOML table; missing keys keep their defaults
    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        let config: ParticleConfig = toml::Value::Table(table.clone()).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Target size for a sampled pixel: darker pixels give bigger particles,
    /// floored so fully bright pixels never vanish.
    pub fn target_size(&self, color: Rgb, step_pixel: f32) -> f32 {
        let darkness = 1.0 - color.brightness() / 255.0;
        (step_pixel * darkness * self.size_factor).max(step_pixel * self.min_size_factor)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(MosaicError::ConfigError(
                "particles.capacity must be at least 1".to_string(),
            ));
        }
        MosaicError::check_range("particles.size_factor", self.size_factor as f64, 0.0, 10.0)?;
        MosaicError::check_range(
            "particles.min_size_factor",
            self.min_size_factor as f64,
            0.0,
            10.0,
        )?;
        MosaicError::check_range("particles.dust_size", self.dust_size as f64, 0.0, 100.0)?;
        MosaicError::check_range(
            "particles.duration_min_ms",
            self.duration_min_ms,
            1.0,
            self.duration_max_ms,
        )?;
        MosaicError::check_range("particles.growth_start", self.growth_start as f64, 0.0, 0.99)?;
        MosaicError::check_range("particles.settle_start", self.settle_start as f64, 0.0, 0.99)?;
        // Resistance must decay, and shrinking must make progress, or an
        // exploding particle could live forever.
        MosaicError::check_range(
            "particles.air_resistance",
            self.air_resistance as f64,
            0.0,
            1.0,
        )?;
        if self.shrink_rate <= 0.0 {
            return Err(MosaicError::ValueOutOfRange {
                field: "particles.shrink_rate".to_string(),
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
                value: self.shrink_rate as f64,
            });
        }
        MosaicError::check_range(
            "particles.global_check_interval_ms",
            self.global_check_interval_ms,
            0.0,
            60_000.0,
        )?;
        if let ComputeMode::Offloaded { workers, .. } = self.compute {
            if workers == 0 {
                return Err(MosaicError::ConfigError(
                    "particles.compute.workers must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}
