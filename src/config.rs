use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::DEFAULT_DEPLOYMENT_WEIGHT;
use crate::error::AppError;
use crate::usage::{NormalizationRules, UsageEngine};

fn default_weight() -> u64 {
    DEFAULT_DEPLOYMENT_WEIGHT
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Weight given to registry entries that carry none
    #[serde(default = "default_weight")]
    pub default_weight: u64,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub normalization: NormalizationRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_weight: DEFAULT_DEPLOYMENT_WEIGHT,
            debug: false,
            normalization: NormalizationRules::default(),
        }
    }
}

/// Result of a config search
///
/// Logging is configured from the loaded config, so problems found while
/// searching are returned for the caller to report once it is up.
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: Option<PathBuf>,
    pub warnings: Vec<AppError>,
}

impl Config {
    pub fn parse(content: &str, path: &Path) -> Result<Self, AppError> {
        toml::from_str(content).map_err(|source| AppError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `explicit` when given, failing if it cannot be used.
    /// Otherwise the first readable, parsable file on the search path wins.
    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, AppError> {
        if let Some(path) = explicit {
            let content = fs::read_to_string(path).map_err(|source| AppError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            return Ok(LoadedConfig {
                config: Self::parse(&content, path)?,
                source: Some(path.to_path_buf()),
                warnings: Vec::new(),
            });
        }

        Ok(Self::search(&Self::get_config_paths()))
    }

    fn search(paths: &[PathBuf]) -> LoadedConfig {
        let mut warnings = Vec::new();

        for path in paths {
            if path.exists()
                && let Ok(content) = fs::read_to_string(path)
            {
                match Self::parse(&content, path) {
                    Ok(config) => {
                        return LoadedConfig {
                            config,
                            source: Some(path.clone()),
                            warnings,
                        };
                    }
                    Err(e) => warnings.push(e),
                }
            }
        }

        LoadedConfig {
            warnings,
            ..LoadedConfig::default()
        }
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/stickyledger/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("stickyledger").join("config.toml"));
        }

        // 2. Platform config dir (Application Support on macOS)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("stickyledger").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.stickyledger.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".stickyledger.toml"));
        }

        paths
    }

    pub fn usage_engine(&self) -> UsageEngine {
        UsageEngine::new(self.normalization.clone())
    }
}
