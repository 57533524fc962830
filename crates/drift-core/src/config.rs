use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    export::DEFAULT_BITS_PER_SAMPLE, pipeline::TextureConfig, signal::DEFAULT_SAMPLE_RATE,
    time::estimate_buffer_bytes,
};

pub const CONFIG_FILE_NAME: &str = "drift.config.toml";
pub const CONFIG_PATH_ENV: &str = "DRIFT_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub texture: TextureConfig,
    pub output: OutputConfig,
    pub limits: LimitsConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_target_seconds: f32,
    pub max_buffer_bytes: u64,
    pub fallback_target_seconds: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub log_filter: String,
    pub trace_file_prefix: String,
    pub log_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
            directory: PathBuf::from("data/renders"),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_target_seconds: 120.0,
            max_buffer_bytes: 500 * 1024 * 1024,
            fallback_target_seconds: 60.0,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_filter: "info,drift_core=debug".to_string(),
            trace_file_prefix: "drift".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl LimitsConfig {
    /// Caps a requested extension length so its output buffer fits in memory.
    #[must_use]
    pub fn bounded_target_seconds(&self, requested: f32, sample_rate: u32) -> f32 {
        let mut target = requested.min(self.max_target_seconds);
        let estimate = estimate_buffer_bytes(f64::from(target), sample_rate);
        if estimate >= self.max_buffer_bytes {
            let fallback = target.min(self.fallback_target_seconds);
            warn!(
                requested,
                estimate_bytes = estimate,
                budget_bytes = self.max_buffer_bytes,
                fallback,
                "target duration exceeds memory budget"
            );
            target = fallback;
        }
        target
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let config_path = discover_config_path().with_context(|| {
            format!("failed to locate {CONFIG_FILE_NAME}; looked in cwd and parent directory")
        })?;
        Self::from_path(&config_path)
    }

    pub fn load_or_default() -> Result<Self> {
        match discover_config_path() {
            Ok(path) => Self::from_path(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config TOML from {}", path.display()))?;
        Ok(config)
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
    }

    let cwd = env::current_dir().context("failed to resolve current directory")?;
    let candidates = [
        cwd.join(CONFIG_FILE_NAME),
        cwd.join("..").join(CONFIG_FILE_NAME),
    ];

    candidates
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| anyhow::anyhow!("{CONFIG_FILE_NAME} not found"))
}
