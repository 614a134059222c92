//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{TrimlineError, TrimlineResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Thumbnail pool and cache settings.
    pub thumbnails: ThumbnailConfig,

    /// Timeline strip geometry and zoom behaviour.
    pub viewport: ViewportConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Thumbnail pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Number of decode units bound to a source.
    pub pool_size: usize,

    /// How long a unit waits for a precise frame-ready signal before
    /// accepting whatever frame is presented (milliseconds).
    pub frame_ready_timeout_ms: u64,

    /// Rendered thumbnail width in pixels.
    pub thumbnail_width: u32,

    /// Rendered thumbnail height in pixels.
    pub thumbnail_height: u32,
}

/// Timeline strip geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Width of one thumbnail slot in pixels.
    pub slot_width: f64,

    /// Gap between slots in pixels.
    pub slot_gap: f64,

    /// Duration multiplier for one zoom-in wheel step (zoom-out uses the inverse).
    pub zoom_step: f64,

    /// Framerate assumed when the probe reports nothing usable.
    pub fallback_fps: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trimline=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            frame_ready_timeout_ms: 500,
            thumbnail_width: 160,
            thumbnail_height: 90,
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            slot_width: 160.0,
            slot_gap: 4.0,
            zoom_step: 0.85,
            fallback_fps: crate::timecode::FALLBACK_FPS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
                    Ok(config) => match config.validate() {
                        Ok(()) => return config,
                        Err(e) => {
                            tracing::warn!("Ignoring invalid config at {:?}: {}", config_path, e);
                        }
                    },
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> TrimlineResult<()> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json)?;
        Ok(())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> TrimlineResult<()> {
        if self.thumbnails.pool_size == 0 {
            return Err(TrimlineError::config("thumbnails.pool_size must be > 0"));
        }
        if self.viewport.slot_width.is_nan() || self.viewport.slot_width <= 0.0 {
            return Err(TrimlineError::config("viewport.slot_width must be > 0"));
        }
        if self.viewport.slot_gap.is_nan() || self.viewport.slot_gap < 0.0 {
            return Err(TrimlineError::config("viewport.slot_gap must be >= 0"));
        }
        if self.viewport.zoom_step.is_nan()
            || self.viewport.zoom_step <= 0.0
            || self.viewport.zoom_step >= 1.0
        {
            return Err(TrimlineError::config(
                "viewport.zoom_step must be within (0, 1)",
            ));
        }
        if !self.viewport.fallback_fps.is_finite() || self.viewport.fallback_fps <= 0.0 {
            return Err(TrimlineError::config("viewport.fallback_fps must be > 0"));
        }
        Ok(())
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("trimline").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.thumbnails.pool_size, 4);
        assert!((config.viewport.zoom_step - 0.85).abs() < 1e-12);
        assert!((config.viewport.fallback_fps - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "thumbnails": { "pool_size": 2 } }"#).unwrap();
        assert_eq!(config.thumbnails.pool_size, 2);
        assert_eq!(config.thumbnails.frame_ready_timeout_ms, 500);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.thumbnails.pool_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.viewport.zoom_step = 1.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.viewport.slot_width = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.viewport.fallback_fps = f64::INFINITY;
        assert!(config.validate().is_err());
    }
}
