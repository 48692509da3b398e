//! Revolver configuration.
//!
//! Loaded from TOML and environment variables. Priority (highest to lowest):
//! 1. Environment variables (`REVOLVE_*`)
//! 2. Config file
//! 3. Default values
//!
//! ```toml
//! checkpoints = 10        # optional, adjust(timesteps) when absent
//! timesteps = 100
//!
//! [compression]
//! scheme = "zstd"         # none | zstd | quantize
//! tolerance = 1e-7
//! level = 3
//! ```
//!
//! A `custom` scheme cannot be selected from a file since the codec is code;
//! use [`CompressionParams::custom`] instead.

use std::path::Path;

use revolve_core::adjust;
use serde::Deserialize;

use crate::compression::{
    CompressionError, CompressionParams, Scheme, DEFAULT_LEVEL, DEFAULT_TOLERANCE,
};
use crate::error::ConfigError;

/// Environment variable overriding [`RevolverConfig::checkpoints`].
pub const ENV_CHECKPOINTS: &str = "REVOLVE_CHECKPOINTS";
/// Environment variable overriding [`RevolverConfig::timesteps`].
pub const ENV_TIMESTEPS: &str = "REVOLVE_TIMESTEPS";
/// Environment variable overriding [`CompressionConfig::scheme`].
pub const ENV_SCHEME: &str = "REVOLVE_SCHEME";
/// Environment variable overriding [`CompressionConfig::tolerance`].
pub const ENV_TOLERANCE: &str = "REVOLVE_TOLERANCE";
/// Environment variable overriding [`CompressionConfig::level`].
pub const ENV_LEVEL: &str = "REVOLVE_LEVEL";

/// Compression section of [`RevolverConfig`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Codec selector
    pub scheme: Scheme,
    /// Absolute error bound of the lossy scheme
    pub tolerance: f64,
    /// zstd compression level
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::None,
            tolerance: DEFAULT_TOLERANCE,
            level: DEFAULT_LEVEL,
        }
    }
}

impl CompressionConfig {
    /// Builds compression parameters for a built-in scheme.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Compression`] if the scheme is `custom` or the
    /// parameters are invalid.
    pub fn to_params(&self) -> Result<CompressionParams, ConfigError> {
        if self.scheme == Scheme::Custom {
            return Err(CompressionError::MissingCustomCodec.into());
        }
        let params = CompressionParams::new(self.scheme)
            .with_tolerance(self.tolerance)
            .with_level(self.level);
        params.validate()?;
        Ok(params)
    }
}

/// Run configuration.
///
/// # Default Values
///
/// | Parameter | Default | Description |
/// |-----------|---------|-------------|
/// | `checkpoints` | `None` | `adjust(timesteps)` when unset |
/// | `timesteps` | 0 | Forward timesteps |
/// | `compression.scheme` | `none` | Codec selector |
/// | `compression.tolerance` | 1e-7 | Lossy error bound |
/// | `compression.level` | 3 | zstd level |
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevolverConfig {
    /// Checkpoints held simultaneously
    pub checkpoints: Option<usize>,
    /// Forward timesteps
    pub timesteps: usize,
    /// Compression settings
    pub compression: CompressionConfig,
}

impl RevolverConfig {
    /// Creates a configuration for `timesteps` with default settings.
    pub fn new(timesteps: usize) -> Self {
        Self {
            timesteps,
            ..Self::default()
        }
    }

    /// Sets the checkpoint count.
    pub fn with_checkpoints(mut self, checkpoints: usize) -> Self {
        self.checkpoints = Some(checkpoints);
        self
    }

    /// Sets the compression settings.
    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RevolverConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `REVOLVE_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CHECKPOINTS) {
            self.checkpoints = Some(parse_env(ENV_CHECKPOINTS, value)?);
        }
        if let Some(value) = lookup(ENV_TIMESTEPS) {
            self.timesteps = parse_env(ENV_TIMESTEPS, value)?;
        }
        if let Some(value) = lookup(ENV_SCHEME) {
            self.compression.scheme = parse_env(ENV_SCHEME, value)?;
        }
        if let Some(value) = lookup(ENV_TOLERANCE) {
            self.compression.tolerance = parse_env(ENV_TOLERANCE, value)?;
        }
        if let Some(value) = lookup(ENV_LEVEL) {
            self.compression.level = parse_env(ENV_LEVEL, value)?;
        }
        self.validate()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkpoints == Some(0) {
            return Err(ConfigError::InvalidCheckpoints(0));
        }
        self.compression.to_params()?;
        Ok(())
    }

    /// Checkpoint count to use: the configured one or `adjust(timesteps)`.
    pub fn resolved_checkpoints(&self) -> usize {
        self.checkpoints.unwrap_or_else(|| adjust(self.timesteps))
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RevolverConfig::default();
        assert_eq!(config.checkpoints, None);
        assert_eq!(config.timesteps, 0);
        assert_eq!(config.compression.scheme, Scheme::None);
        assert_eq!(config.compression.tolerance, 1e-7);
        assert_eq!(config.compression.level, 3);
    }

    #[test]
    fn test_from_toml_full() {
        let config = RevolverConfig::from_toml_str(
            r#"
            checkpoints = 10
            timesteps = 100

            [compression]
            scheme = "blosc"
            level = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.checkpoints, Some(10));
        assert_eq!(config.timesteps, 100);
        assert_eq!(config.compression.scheme, Scheme::Zstd);
        assert_eq!(config.compression.level, 5);
        assert_eq!(config.compression.tolerance, 1e-7);
    }

    #[test]
    fn test_from_toml_defaults_checkpoints_with_adjust() {
        let config = RevolverConfig::from_toml_str("timesteps = 1000").unwrap();
        assert_eq!(config.resolved_checkpoints(), 7);
    }

    #[test]
    fn test_from_toml_unknown_scheme() {
        let err = RevolverConfig::from_toml_str("[compression]\nscheme = \"lzma\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("lzma"));
    }

    #[test]
    fn test_custom_scheme_rejected_in_file() {
        let err = RevolverConfig::from_toml_str("[compression]\nscheme = \"custom\"").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Compression(CompressionError::MissingCustomCodec)
        ));
    }

    #[test]
    fn test_zero_checkpoints_rejected() {
        let err = RevolverConfig::from_toml_str("checkpoints = 0\ntimesteps = 5").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCheckpoints(0)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = RevolverConfig::from_file("/nonexistent/revolve.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_overrides() {
        let mut config = RevolverConfig::new(50);
        config
            .apply_overrides(lookup(&[
                (ENV_CHECKPOINTS, "4"),
                (ENV_SCHEME, "zfp"),
                (ENV_TOLERANCE, "1e-3"),
            ]))
            .unwrap();
        assert_eq!(config.checkpoints, Some(4));
        assert_eq!(config.timesteps, 50);
        assert_eq!(config.compression.scheme, Scheme::Quantize);
        assert_eq!(config.compression.tolerance, 1e-3);
    }

    #[test]
    fn test_override_parse_failure() {
        let mut config = RevolverConfig::new(50);
        let err = config
            .apply_overrides(lookup(&[(ENV_LEVEL, "high")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: ENV_LEVEL, .. }));
    }

    #[test]
    fn test_to_params_rejects_bad_tolerance() {
        let compression = CompressionConfig {
            scheme: Scheme::Quantize,
            tolerance: -1.0,
            level: 3,
        };
        assert!(compression.to_params().is_err());
    }
}
