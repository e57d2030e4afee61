//! Engine configuration
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change.

use std::path::{Path, PathBuf};

use ql_core::{parse_hex_color, NumberLocale, RenderContext, DEFAULT_UNIT_ALIASES};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "querylens.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Configuration for the rendering engine and its shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows per table page
    pub page_size: usize,

    /// Number convention tag, e.g. `tr-TR`
    pub locale: String,

    /// Column names probed for a unit suffix, in priority order
    pub unit_aliases: Vec<String>,

    /// Series colors as `#rrggbb` strings
    pub palette: Vec<String>,

    /// Directory export artifacts are written to
    pub export_dir: PathBuf,

    /// Chart snapshot size in pixels
    pub snapshot_width: u32,
    pub snapshot_height: u32,

    /// Number of answered queries kept in the result history
    pub history_limit: usize,

    /// Local key-value store file
    pub store_path: PathBuf,

    /// Canned query responses for the fixture query service
    pub fixture_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            locale: NumberLocale::default().tag().to_string(),
            unit_aliases: DEFAULT_UNIT_ALIASES.iter().map(|s| s.to_string()).collect(),
            palette: vec![
                "#3b82f6".to_string(),
                "#10b981".to_string(),
                "#ef4444".to_string(),
                "#f59e0b".to_string(),
                "#6366f1".to_string(),
            ],
            export_dir: PathBuf::from("exports"),
            snapshot_width: 1200,
            snapshot_height: 700,
            history_limit: 10,
            store_path: PathBuf::from("querylens-store.json"),
            fixture_path: None,
        }
    }
}

impl EngineConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load `path` if given, else `querylens.json` if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    tracing::debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "history_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.snapshot_width == 0 || self.snapshot_height == 0 {
            return Err(ConfigError::Invalid {
                key: "snapshot_width/snapshot_height",
                reason: "snapshot size must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Render context for the engine; unparseable palette entries are skipped
    pub fn render_context(&self) -> RenderContext {
        let palette = self
            .palette
            .iter()
            .filter_map(|hex| {
                let color = parse_hex_color(hex);
                if color.is_none() {
                    tracing::warn!("Ignoring invalid palette color '{}'", hex);
                }
                color
            })
            .collect();

        RenderContext {
            locale: NumberLocale::from_tag(&self.locale),
            unit_aliases: self.unit_aliases.clone(),
            palette,
        }
    }
}
