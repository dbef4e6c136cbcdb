//! Harness configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::corpus::{CorpusFormat, DEFAULT_IMAGE_DIR};
use crate::session::DEFAULT_TIME_LIMIT_SECS;

/// Name of the per-directory config file.
pub const CONFIG_FILE_NAME: &str = "perceptest.toml";

/// Top-level perceptest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Corpus file to load when none is given on the command line.
    #[serde(default)]
    pub corpus: Option<PathBuf>,
    /// Corpus format; detected from the extension when unset.
    #[serde(default)]
    pub format: Option<CorpusFormat>,
    /// Directory prefixed to image names in JSON corpora.
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
    /// Seconds allowed per question.
    #[serde(default = "default_time_limit")]
    pub time_limit_secs: u32,
    /// Where result archives are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Play a cue on each question transition.
    #[serde(default = "default_true")]
    pub cue: bool,
}

fn default_image_dir() -> String {
    DEFAULT_IMAGE_DIR.to_string()
}
fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_SECS
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./perceptest-results")
}
fn default_true() -> bool {
    true
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            corpus: None,
            format: None,
            image_dir: default_image_dir(),
            time_limit_secs: default_time_limit(),
            output_dir: default_output_dir(),
            cue: true,
        }
    }
}

impl HarnessConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.time_limit_secs >= 1,
            "time_limit_secs must be at least 1"
        );
        Ok(())
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `perceptest.toml` in the current directory
/// 2. `~/.config/perceptest/config.toml`
/// 3. built-in defaults
pub fn load_config_from(path: Option<&Path>) -> Result<HarnessConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => HarnessConfig::default(),
    };

    config.validate()?;
    Ok(config)
}

/// Parse configuration TOML.
pub fn parse_config(content: &str) -> Result<HarnessConfig> {
    Ok(toml::from_str(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("perceptest"))
}
