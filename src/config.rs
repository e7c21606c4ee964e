//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `skywall.toml`. Stock defaults
//! are overridden by an optional `skywall.toml` in the pipeline directory,
//! next to `recipe.toml`:
//!
//! ```text
//! pipelines/simple/
//! ├── recipe.toml
//! ├── skywall.toml      # optional, overrides stock defaults
//! └── sources.json      # optional, replaces the built-in catalog
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! images_dir = "images"       # Relative to the pipeline directory
//!
//! [magick]
//! dialect = "auto"            # auto | legacy | modern
//!
//! [transfer]
//! program = "curl"
//! args = ["--fail", "--location", "--silent", "--show-error"]
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::imaging::DialectSetting;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "skywall.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `skywall.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkywallConfig {
    /// Where downloads and generated images go, relative to the pipeline
    /// directory.
    pub images_dir: String,
    pub magick: MagickConfig,
    /// Program used to download catalog sources.
    pub transfer: TransferConfig,
}

impl Default for SkywallConfig {
    fn default() -> Self {
        Self {
            images_dir: crate::pipeline::IMAGES_DIR.to_string(),
            magick: MagickConfig::default(),
            transfer: TransferConfig::default(),
        }
    }
}

impl SkywallConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "images_dir must not be empty".into(),
            ));
        }
        if self.transfer.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "transfer.program must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn images_dir_in(&self, pipeline_dir: &Path) -> PathBuf {
        pipeline_dir.join(&self.images_dir)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MagickConfig {
    /// `auto` prefers `magick` (7.x) and falls back to `convert` (6.x).
    pub dialect: DialectSetting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransferConfig {
    pub program: String,
    /// Passed before `-o <file> <url>`.
    pub args: Vec<String>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            program: "curl".to_string(),
            args: ["--fail", "--location", "--silent", "--show-error"]
                .map(String::from)
                .to_vec(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SkywallConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `skywall.toml` from a directory as a raw TOML value, or `None` if
/// there is no such file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config for a pipeline directory: user values over stock defaults,
/// unknown keys rejected, result validated.
pub fn load_config(pipeline_dir: &Path) -> Result<SkywallConfig, ConfigError> {
    let merged = match load_raw_config(pipeline_dir)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let config: SkywallConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// A fully-commented stock `skywall.toml`, printed by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# skywall configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file next to recipe.toml in a pipeline directory.
# Unknown keys will cause an error.

# Directory for downloaded and generated images, relative to the
# pipeline directory. Generated files are named generated0.png,
# generated1.png, ... and are overwritten on the next run.
images_dir = "images"

# ---------------------------------------------------------------------------
# ImageMagick
# ---------------------------------------------------------------------------
[magick]
# "modern" runs `magick` (ImageMagick 7), "legacy" runs `convert` and
# `identify` (ImageMagick 6). "auto" picks modern when `magick` is on PATH.
dialect = "auto"

# ---------------------------------------------------------------------------
# Downloads
# ---------------------------------------------------------------------------
[transfer]
# Invoked as: <program> <args...> -o <file> <url>
program = "curl"
args = ["--fail", "--location", "--silent", "--show-error"]
"##
}
