//! Configuration file support.
//!
//! Settings are stored as versioned JSON, loaded once at startup and passed
//! down to the session explicitly.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CLASSIFIER_THRESHOLD, DEFAULT_LINE_WIDTH, DEFAULT_POINT_HIT_RADIUS,
    DEFAULT_USER_ADDED_ID_OFFSET, POINT_MARKER_HALF_SIZE, SELECTED_LINE_WIDTH,
};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Labeling job regions are drawn from
    #[serde(default = "default_job_id")]
    pub job_id: i64,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Interaction settings
    #[serde(default)]
    pub session: SessionSettings,

    /// Shape drawing settings
    #[serde(default)]
    pub render: RenderSettings,
}

fn default_job_id() -> i64 {
    1
}

/// Interaction settings for a labeling session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Radius within which a click hits an existing point ROI
    #[serde(default = "default_point_hit_radius")]
    pub point_hit_radius: f32,

    /// Offset added to the max id when naming a hand-drawn ROI
    #[serde(default = "default_user_added_id_offset")]
    pub user_added_id_offset: i64,

    /// Score threshold separating classifier "cell" from "not cell"
    #[serde(default = "default_classifier_threshold")]
    pub classifier_threshold: f32,

    /// Check labels against classifier scores before submitting
    #[serde(default = "default_validate_before_submit")]
    pub validate_before_submit: bool,
}

fn default_point_hit_radius() -> f32 {
    DEFAULT_POINT_HIT_RADIUS
}

fn default_user_added_id_offset() -> i64 {
    DEFAULT_USER_ADDED_ID_OFFSET
}

fn default_classifier_threshold() -> f32 {
    DEFAULT_CLASSIFIER_THRESHOLD
}

fn default_validate_before_submit() -> bool {
    true
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            point_hit_radius: default_point_hit_radius(),
            user_added_id_offset: default_user_added_id_offset(),
            classifier_threshold: default_classifier_threshold(),
            validate_before_submit: default_validate_before_submit(),
        }
    }
}

/// Settings for the shapes handed to the Renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Draw outlines of every ROI in the region, not just the selected one
    #[serde(default = "default_true")]
    pub show_all_outlines: bool,

    /// Draw the outline of the selected ROI
    #[serde(default = "default_true")]
    pub show_current_outline: bool,

    #[serde(default = "default_line_width")]
    pub line_width: f32,

    #[serde(default = "default_selected_line_width")]
    pub selected_line_width: f32,

    #[serde(default = "default_point_marker_half_size")]
    pub point_marker_half_size: f32,
}

fn default_true() -> bool {
    true
}

fn default_line_width() -> f32 {
    DEFAULT_LINE_WIDTH
}

fn default_selected_line_width() -> f32 {
    SELECTED_LINE_WIDTH
}

fn default_point_marker_half_size() -> f32 {
    POINT_MARKER_HALF_SIZE
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            show_all_outlines: true,
            show_current_outline: true,
            line_width: default_line_width(),
            selected_line_width: default_selected_line_width(),
            point_marker_half_size: default_point_marker_half_size(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            job_id: default_job_id(),
            log_level: LogLevel::default(),
            session: SessionSettings::default(),
            render: RenderSettings::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "cell-labeler-config.json"
    }

    /// Directory holding the config file and persisted preferences.
    /// Returns None on WASM (no filesystem access).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn config_dir() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("cell-labeler"))
        } else {
            dirs::home_dir().map(|home_dir| home_dir.join(".config").join("cell-labeler"))
        }
    }

    /// Get the default config file path for auto-load/save.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        Self::config_dir().map(|dir| dir.join(Self::default_filename()))
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(&path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
