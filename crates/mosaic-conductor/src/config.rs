//! Stage configuration (the `[stage]` table)

use mosaic_core::{MosaicError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub canvas_count: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Sampling stride in pixels; also the scale for particle sizes
    pub step_pixel: u32,
    /// Conductor tick period
    pub tick_interval_ms: f64,
    /// Consecutive cache misses tolerated before a canvas sits out a cycle
    pub max_retries: u32,
    /// How long a completed photo stays up before exploding
    pub hold_ms: f64,
    /// Detonation delays are drawn from `[0, explode_window_ms)`
    pub explode_window_ms: f64,
    pub frame_rate: f64,
    /// Roster shuffle and particle randomness; 0 seeds from the clock
    pub seed: u32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            canvas_count: 4,
            canvas_width: 480,
            canvas_height: 1080,
            step_pixel: 22,
            tick_interval_ms: 4000.0,
            max_retries: 5,
            hold_ms: 2000.0,
            explode_window_ms: 3000.0,
            frame_rate: 60.0,
            seed: 0,
        }
    }
}

impl StageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.canvas_count == 0 {
            return Err(MosaicError::ConfigError(
                "stage.canvas_count must be at least 1".to_string(),
            ));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(MosaicError::ConfigError(
                "stage canvas dimensions must be non-zero".to_string(),
            ));
        }
        MosaicError::check_range("stage.step_pixel", self.step_pixel as f64, 1.0, 512.0)?;
        MosaicError::check_range("stage.tick_interval_ms", self.tick_interval_ms, 1.0, 3.6e6)?;
        MosaicError::check_range("stage.hold_ms", self.hold_ms, 0.0, 3.6e6)?;
        MosaicError::check_range("stage.explode_window_ms", self.explode_window_ms, 0.0, 3.6e6)?;
        MosaicError::check_range("stage.frame_rate", self.frame_rate, 1.0, 1000.0)?;
        Ok(())
    }

    /// Milliseconds per frame at `frame_rate`
    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.frame_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = StageConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.frame_ms() - 16.666).abs() < 0.01);
    }

    #[test]
    fn parse_partial_table() {
        let config: StageConfig = toml::from_str("canvas_count = 2\nhold_ms = 500.0").unwrap();
        assert_eq!(config.canvas_count, 2);
        assert_eq!(config.hold_ms, 500.0);
        assert_eq!(config.step_pixel, 22);
    }

    #[test]
    fn rejects_zero_canvases() {
        let config = StageConfig {
            canvas_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_step() {
        let config = StageConfig {
            step_pixel: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MosaicError::ValueOutOfRange { .. })
        ));
    }
}
