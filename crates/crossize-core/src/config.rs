//! User settings
//!
//! Settings are plain serde structs with defaults. They are read from
//! `<config dir>/crossize/config.toml` when present, and the backend URL can be
//! overridden with the `CROSSIZE_BACKEND_URL` environment variable.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crossize_gating::GateCombine;
use crossize_stats::{Bandwidth, SignificanceLevel, StatsResult, DEFAULT_KDE_POINTS};

use crate::distribution::DEFAULT_EXPANSION_SIZE;
use crate::error::{ConfigError, ConfigResult};

/// Environment variable overriding the backend base URL
pub const BACKEND_URL_ENV: &str = "CROSSIZE_BACKEND_URL";

/// All user-adjustable settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub analysis: AnalysisSettings,
    pub gating: GatingSettings,
}

/// Analysis backend connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL, e.g. `http://localhost:8000/api/v1`
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Point limit for scatter requests
    pub scatter_limit: usize,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            timeout_secs: 30,
            scatter_limit: 5_000,
        }
    }
}

/// Statistical analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Significance level for the two-sample tests
    pub alpha: f64,
    /// Grid size for KDE curves
    pub kde_points: usize,
    /// Fixed KDE bandwidth in nm; Silverman's rule when unset
    pub bandwidth: Option<f64>,
    /// Draws used when expanding a size histogram into a sample
    pub expansion_size: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            kde_points: DEFAULT_KDE_POINTS,
            bandwidth: None,
            expansion_size: DEFAULT_EXPANSION_SIZE,
        }
    }
}

impl AnalysisSettings {
    pub fn significance(&self) -> StatsResult<SignificanceLevel> {
        SignificanceLevel::from_alpha(self.alpha)
    }

    pub fn bandwidth(&self) -> Bandwidth {
        self.bandwidth.map_or(Bandwidth::Silverman, Bandwidth::Fixed)
    }
}

/// Gating behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatingSettings {
    /// How several active gates combine
    pub combine: GateCombine,
    /// Restrict the FCS side of the analysis to gated events
    pub apply_to_analysis: bool,
}

impl Default for GatingSettings {
    fn default() -> Self {
        Self {
            combine: GateCombine::All,
            apply_to_analysis: true,
        }
    }
}

impl Settings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings file location
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("crossize").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the default location, falling back to defaults when the file
    /// does not exist; environment overrides are applied either way
    pub fn load() -> ConfigResult<Self> {
        let path = Self::default_path()?;
        let settings = if path.exists() {
            Self::load_from(&path)?
        } else {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            Self::default()
        };
        let settings = settings.with_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate a TOML settings file
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write as TOML, creating parent directories
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, self.to_toml()?).map_err(write_err)
    }

    /// Apply `CROSSIZE_BACKEND_URL` if set
    pub fn with_env_overrides(self) -> Self {
        let url = std::env::var(BACKEND_URL_ENV).ok();
        self.with_backend_override(url)
    }

    fn with_backend_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(%url, "Backend URL overridden from environment");
            self.backend.base_url = url;
        }
        self
    }

    /// Load settings from a TOML string
    pub fn from_toml(toml_str: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize settings to TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load settings from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize settings to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        let url = url::Url::parse(&self.backend.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {e}", self.backend.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::OutOfRange(
                "backend.timeout_secs must be positive".to_string(),
            ));
        }

        if !(self.analysis.alpha > 0.0 && self.analysis.alpha < 1.0) {
            return Err(ConfigError::OutOfRange(
                "analysis.alpha must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }

        if self.analysis.kde_points < 2 {
            return Err(ConfigError::OutOfRange(
                "analysis.kde_points must be at least 2".to_string(),
            ));
        }

        if let Some(h) = self.analysis.bandwidth {
            if !(h.is_finite() && h > 0.0) {
                return Err(ConfigError::OutOfRange(
                    "analysis.bandwidth must be positive".to_string(),
                ));
            }
        }

        if self.analysis.expansion_size == 0 {
            return Err(ConfigError::OutOfRange(
                "analysis.expansion_size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
