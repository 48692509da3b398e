//! Run configuration assembled from all sources.
//!
//! Priority (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (`REVOLVE_*`)
//! 3. Config file
//! 4. Default values

use std::path::PathBuf;

use revolve_engine::compression::Scheme;
use revolve_engine::RevolverConfig;

use crate::Result;

/// Run settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Timesteps override
    pub steps: Option<usize>,
    /// Checkpoints override
    pub checkpoints: Option<usize>,
    /// Scheme override
    pub scheme: Option<Scheme>,
    /// Tolerance override
    pub tolerance: Option<f64>,
    /// zstd level override
    pub level: Option<i32>,
}

impl RunArgs {
    /// Applies the arguments given on the command line.
    fn merge_into(&self, config: &mut RevolverConfig) {
        if let Some(steps) = self.steps {
            config.timesteps = steps;
        }
        if let Some(checkpoints) = self.checkpoints {
            config.checkpoints = Some(checkpoints);
        }
        if let Some(scheme) = self.scheme {
            config.compression.scheme = scheme;
        }
        if let Some(tolerance) = self.tolerance {
            config.compression.tolerance = tolerance;
        }
        if let Some(level) = self.level {
            config.compression.level = level;
        }
    }
}

/// Builds the run configuration from file, environment and arguments.
pub fn build_config(args: &RunArgs) -> Result<RevolverConfig> {
    build_config_with(args, |key| std::env::var(key).ok())
}

fn build_config_with<F>(args: &RunArgs, lookup: F) -> Result<RevolverConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config_file {
        Some(path) => RevolverConfig::from_file(path)?,
        None => RevolverConfig::default(),
    };
    config.apply_overrides(lookup)?;
    args.merge_into(&mut config);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CliError;
    use revolve_engine::ConfigError;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = build_config_with(&RunArgs::default(), no_env).unwrap();
        assert_eq!(config, RevolverConfig::default());
    }

    #[test]
    fn test_cli_overrides_env() {
        let args = RunArgs {
            steps: Some(100),
            scheme: Some(Scheme::Zstd),
            ..Default::default()
        };
        let env = |key: &str| match key {
            "REVOLVE_SCHEME" => Some("quantize".to_string()),
            "REVOLVE_CHECKPOINTS" => Some("6".to_string()),
            _ => None,
        };
        let config = build_config_with(&args, env).unwrap();
        assert_eq!(config.timesteps, 100);
        assert_eq!(config.checkpoints, Some(6));
        assert_eq!(config.compression.scheme, Scheme::Zstd);
    }

    #[test]
    fn test_cli_values_are_validated() {
        let args = RunArgs {
            checkpoints: Some(0),
            ..Default::default()
        };
        let err = build_config_with(&args, no_env).unwrap_err();
        assert!(matches!(
            err,
            CliError::Config(ConfigError::InvalidCheckpoints(0))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let args = RunArgs {
            config_file: Some(PathBuf::from("/nonexistent/revolve.toml")),
            ..Default::default()
        };
        assert!(matches!(
            build_config_with(&args, no_env),
            Err(CliError::Config(ConfigError::Io { .. }))
        ));
    }
}
