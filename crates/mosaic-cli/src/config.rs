//! Layered configuration system
//!
//! Config is loaded with four layers of precedence (highest wins):
//! 1. Command-line flags (applied by each command)
//! 2. Environment variables: `MOSAIC_STEP_PIXEL`, `MOSAIC_BATCH_SIZE`,
//!    `MOSAIC_CANVAS_COUNT`, `MOSAIC_COMPUTE`
//! 3. Project-local: `.mosaic/config.toml`
//! 4. Global: `~/.mosaic/config.toml`

use anyhow::{bail, Context, Result};
use mosaic_cache::CacheConfig;
use mosaic_conductor::StageConfig;
use mosaic_particles::{ComputeMode, ParticleConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_OFFLOAD_TIMEOUT_MS: u64 = 50;

/// Top-level config file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    pub stage: StageConfig,
    pub cache: CacheConfig,
    pub particles: ParticleConfig,
}

impl MosaicConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut merged = toml::Table::new();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                merge_tables(&mut merged, Self::read_table(&global_path)?);
            }
        }

        let local_path = PathBuf::from(".mosaic/config.toml");
        if local_path.exists() {
            merge_tables(&mut merged, Self::read_table(&local_path)?);
        }

        let mut config = Self::from_table(merged)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load config from a specific file path only, plus env overrides
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::from_table(Self::read_table(path)?)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `MOSAIC_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MOSAIC_STEP_PIXEL") {
            self.stage.step_pixel = parse_env("MOSAIC_STEP_PIXEL", &value)?;
        }
        if let Some(value) = lookup("MOSAIC_BATCH_SIZE") {
            self.cache.batch_size = parse_env("MOSAIC_BATCH_SIZE", &value)?;
        }
        if let Some(value) = lookup("MOSAIC_CANVAS_COUNT") {
            self.stage.canvas_count = parse_env("MOSAIC_CANVAS_COUNT", &value)?;
        }
        if let Some(value) = lookup("MOSAIC_COMPUTE") {
            self.particles.compute = parse_compute_mode(&value)
                .with_context(|| format!("Invalid MOSAIC_COMPUTE value '{}'", value))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.stage.validate().context("Invalid [stage] config")?;
        self.cache.validate().context("Invalid [cache] config")?;
        self.particles
            .validate()
            .context("Invalid [particles] config")?;
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".mosaic").join("config.toml"))
    }

    fn read_table(path: &Path) -> Result<toml::Table> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    fn from_table(table: toml::Table) -> Result<Self> {
        toml::Value::Table(table)
            .try_into()
            .context("Config does not match the expected layout")
    }
}

/// Overlay keys win; nested tables merge key by key
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(_) => bail!("{} must be a non-negative integer, got '{}'", key, value),
    }
}

/// `in_process`, `offloaded`, or `offloaded:<workers>`
pub fn parse_compute_mode(value: &str) -> Result<ComputeMode> {
    let value = value.trim();
    match value.split_once(':') {
        None if value == "in_process" => Ok(ComputeMode::InProcess),
        None if value == "offloaded" => Ok(ComputeMode::Offloaded {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2),
            timeout_ms: DEFAULT_OFFLOAD_TIMEOUT_MS,
        }),
        Some(("offloaded", workers)) => Ok(ComputeMode::Offloaded {
            workers: workers
                .parse()
                .with_context(|| format!("Bad worker count '{}'", workers))?,
            timeout_ms: DEFAULT_OFFLOAD_TIMEOUT_MS,
        }),
        _ => bail!("expected in_process, offloaded, or offloaded:<workers>"),
    }
}
