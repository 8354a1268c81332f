//! Error types for Mosaic

use thiserror::Error;

/// The main error type for Mosaic operations
#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Sampler error for index {index}: {message}")]
    SamplerError { index: u64, message: String },

    #[error("Roster error: {0}")]
    RosterError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Compute error: {0}")]
    ComputeError(String),

    #[error("Cache miss for index {0}")]
    CacheMiss(u64),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result type alias for Mosaic operations
pub type Result<T> = std::result::Result<T, MosaicError>;

impl MosaicError {
    /// Build a `ValueOutOfRange` error when `value` falls outside `[min, max]`
    pub fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
        if value.is_nan() || value < min || value > max {
            return Err(MosaicError::ValueOutOfRange {
                field: field.to_string(),
                min,
                max,
                value,
            });
        }
        Ok(())
    }
}

impl From<toml::de::Error> for MosaicError {
    fn from(err: toml::de::Error) -> Self {
        MosaicError::TomlParseError(err.to_string())
    }
}

impl From<serde_json::Error> for MosaicError {
    fn from(err: serde_json::Error) -> Self {
        MosaicError::JsonParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_range_accepts_bounds() {
        assert!(MosaicError::check_range("x", 0.0, 0.0, 1.0).is_ok());
        assert!(MosaicError::check_range("x", 1.0, 0.0, 1.0).is_ok());
    }

    #[test]
    fn check_range_rejects_nan_and_outside() {
        let err = MosaicError::check_range("resistance", 1.5, 0.0, 1.0).unwrap_err();
        assert!(err.to_string().contains("resistance"));
        assert!(MosaicError::check_range("x", f64::NAN, 0.0, 1.0).is_err());
    }
}
