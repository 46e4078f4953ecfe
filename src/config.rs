//! CLI configuration module.
//!
//! Handles loading, validating, and merging `squash.toml`. Stock defaults are
//! overridden by the user file, unknown keys are rejected, and the result is
//! turned into the [`ConfigInput`] the stage runs with.
//!
//! ## Config File Location
//!
//! `imgsquash run` looks for `squash.toml` in the source directory unless
//! `--config` points somewhere else.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional. Empty [encode] = re-encode to the same format.
//!
//! [encode.webp]             # one table per output codec, in output order
//! [encode.avif]
//! quality = 60
//!
//! [preprocess.rotate]       # resize / quant / rotate, same keys as the library
//! enabled = true
//! numRotations = 1
//!
//! [fit]
//! contain = 1600            # or cover = 400, computed per image
//!
//! [extensions.jpg]          # per-extension override
//! encode = { webp = {} }
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! `[fit]` and `[extensions]` need the decoded image or its extension, so
//! either one makes the configuration per-file.

use crate::naming;
use crate::options::{
    Callback, ConfigInput, EncodeTargets, Options, OptionsError, OptionsShape, PreprocessSpec,
    merge_json,
};
use crate::registry::FormatRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the source directory.
pub const CONFIG_FILE: &str = "squash.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid image options: {0}")]
    Options(#[from] OptionsError),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `squash.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SquashConfig {
    /// Output codecs and their options, in declaration order.
    pub encode: toml::Table,
    /// Preprocess operations applied before encoding.
    pub preprocess: toml::Table,
    /// Per-image resize computed from the decoded size.
    pub fit: FitConfig,
    /// Overrides keyed by source extension (without the dot).
    pub extensions: BTreeMap<String, ExtensionConfig>,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    /// Fit inside an N×N box, never upscaling.
    pub contain: Option<u32>,
    /// Scale so the shorter side is exactly N.
    pub cover: Option<u32>,
}

impl FitConfig {
    pub fn is_set(&self) -> bool {
        self.contain.is_some() || self.cover.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionConfig {
    /// Replaces the top-level `[encode]` for this extension.
    pub encode: Option<toml::Table>,
    /// Merged over the top-level `[preprocess]`.
    pub preprocess: Option<toml::Table>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

fn to_json(table: &toml::Table) -> Result<Value, ConfigError> {
    Ok(serde_json::to_value(table)?)
}

impl SquashConfig {
    /// Validate config values and every embedded option table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let (Some(_), Some(_)) = (self.fit.contain, self.fit.cover) {
            return Err(ConfigError::Validation(
                "fit.contain and fit.cover are mutually exclusive".into(),
            ));
        }
        if self.fit.contain == Some(0) || self.fit.cover == Some(0) {
            return Err(ConfigError::Validation("fit size must be non-zero".into()));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }

        EncodeTargets::parse(&to_json(&self.encode)?)?;
        PreprocessSpec::parse(&to_json(&self.preprocess)?)?;
        for (extension, overrides) in &self.extensions {
            if FormatRegistry::global().lookup(extension).is_none() {
                return Err(ConfigError::Validation(format!(
                    "extensions.{extension}: not an image format"
                )));
            }
            if let Some(encode) = &overrides.encode {
                EncodeTargets::parse(&to_json(encode)?)?;
            }
            if let Some(preprocess) = &overrides.preprocess {
                PreprocessSpec::parse(&to_json(preprocess)?)?;
            }
        }
        Ok(())
    }

    /// Whether options depend on the individual file.
    pub fn is_dynamic(&self) -> bool {
        self.fit.is_set() || !self.extensions.is_empty()
    }

    /// Build the stage configuration.
    pub fn to_input(&self) -> Result<ConfigInput, ConfigError> {
        let base_encode = to_json(&self.encode)?;
        let base_preprocess = to_json(&self.preprocess)?;

        if !self.is_dynamic() {
            return Ok(ConfigInput::Static(Options {
                shape: OptionsShape::Legacy,
                encode: EncodeTargets::parse(&base_encode)?,
                preprocess: Some(PreprocessSpec::parse(&base_preprocess)?),
            }));
        }

        let mut overrides = BTreeMap::new();
        for (extension, ext) in &self.extensions {
            let encode = ext.encode.as_ref().map(to_json).transpose()?;
            let preprocess = ext.preprocess.as_ref().map(to_json).transpose()?;
            overrides.insert(extension.trim_start_matches('.').to_lowercase(), (encode, preprocess));
        }
        let fit = self.fit;

        let callback: Callback = Box::new(move |meta| {
            let ext = naming::extension_of(meta.path).unwrap_or_default();
            let (encode, preprocess) = match overrides.get(&ext) {
                Some((ext_encode, ext_preprocess)) => (
                    ext_encode.clone().unwrap_or_else(|| base_encode.clone()),
                    match ext_preprocess {
                        Some(p) => merge_json(base_preprocess.clone(), p.clone()),
                        None => base_preprocess.clone(),
                    },
                ),
                None => (base_encode.clone(), base_preprocess.clone()),
            };

            let size = match (fit.contain, fit.cover) {
                (Some(max), _) => Some(meta.contain(max)?),
                (None, Some(min)) => Some(meta.cover(min)?),
                (None, None) => None,
            };
            let preprocess = match size {
                Some(size) => merge_json(
                    preprocess,
                    json!({ "resize": {
                        "enabled": true,
                        "width": size.width,
                        "height": size.height
                    } }),
                ),
                None => preprocess,
            };

            Ok(json!({ "encodeOptions": encode, "preprocessOptions": preprocess }))
        });

        Ok(ConfigInput::Dynamic {
            callback,
            preprocess: None,
        })
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a JSON object.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top. User files are converted
/// to the same representation so one [`merge_json`] serves config files and
/// codec option bags alike.
pub fn stock_defaults_value() -> Result<Value, ConfigError> {
    Ok(serde_json::to_value(SquashConfig::default())?)
}

/// Load `squash.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: Value,
    overlay: Option<toml::Value>,
) -> Result<SquashConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_json(base, serde_json::to_value(ov)?),
        None => base,
    };
    let config: SquashConfig = serde_json::from_value(merged)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `squash.toml` in the given directory, if present.
pub fn load_config(dir: &Path) -> Result<SquashConfig, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(dir)?)
}

/// Load config from an explicit file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<SquashConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    resolve_config(stock_defaults_value()?, Some(toml::from_str(&content)?))
}

/// Returns a fully-commented stock `squash.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgsquash configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# With nothing set, every recognized image is re-encoded to its own format
# with that format's default options. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output codecs
# ---------------------------------------------------------------------------
# One table per codec. Each produces a sibling file, in the order listed.
# Codecs: mozjpeg (.jpg), oxipng (.png), webp, avif, jxl, wp2.
[encode]
# [encode.webp]
# [encode.avif]
# quality = 80
# speed = 6

# ---------------------------------------------------------------------------
# Preprocessing (applied once, before every encode: resize, quant, rotate)
# ---------------------------------------------------------------------------
[preprocess]
# [preprocess.resize]
# enabled = true
# width = 1600              # either or both; the other follows the aspect
# method = "lanczos3"       # triangle | catrom | mitchell | lanczos3
# fitMethod = "stretch"     # stretch | contain
#
# [preprocess.quant]
# enabled = true
# numColors = 255           # 2-256
# dither = 1.0              # 0.0-1.0
#
# [preprocess.rotate]
# enabled = true
# numRotations = 1          # clockwise quarter turns

# ---------------------------------------------------------------------------
# Per-image fit (overrides preprocess.resize width/height)
# ---------------------------------------------------------------------------
[fit]
# contain = 1600            # fit inside a 1600x1600 box, never upscale
# cover = 400               # shorter side becomes exactly 400

# ---------------------------------------------------------------------------
# Per-extension overrides
# ---------------------------------------------------------------------------
[extensions]
# [extensions.png]
# encode = { oxipng = {}, webp = {} }
# preprocess = { quant = { enabled = true, numColors = 64 } }

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
