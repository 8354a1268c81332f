//! Cache window configuration (the `[cache]` table)

use mosaic_core::{MosaicError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Photos per load/evict batch
    pub batch_size: u64,
    /// Batches kept resident behind the one being consumed
    pub stale_batches: u64,
    /// Background threads running the sampler
    pub loader_threads: usize,
    /// Directory image refs are resolved against
    pub image_root: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            stale_batches: 1,
            loader_threads: 4,
            image_root: "images".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(MosaicError::ConfigError(
                "cache.batch_size must be at least 1".to_string(),
            ));
        }
        if self.loader_threads == 0 {
            return Err(MosaicError::ConfigError(
                "cache.loader_threads must be at least 1".to_string(),
            ));
        }
        MosaicError::check_range("cache.stale_batches", self.stale_batches as f64, 0.0, 16.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(CacheConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: CacheConfig = toml::from_str("batch_size = 4").unwrap();
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.stale_batches, 1);
        assert_eq!(config.image_root, "images");
    }

    #[test]
    fn zero_batch_rejected() {
        let config = CacheConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MosaicError::ConfigError(_))
        ));
    }
}
