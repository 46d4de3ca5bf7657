//! # Engine Settings
//!
//! Configuration structures for the engine façade. Everything here is plain
//! serde data with defaults, so partial TOML/RON files are accepted.
//!
//! Validation is eager: [`RenderSettings::validate`] runs when settings are
//! handed to the engine, long before a window exists.

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::foundation::logging;

/// Window and frame settings consumed when the window is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Window title
    pub title: String,
    /// Initial framebuffer width in pixels
    pub width: u32,
    /// Initial framebuffer height in pixels
    pub height: u32,
    /// Whether presentation waits for vertical sync
    pub vsync: bool,
    /// RGBA clear colour, each channel in `0.0..=1.0`
    pub clear_color: [f32; 4],
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`, `off`)
    pub log_level: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            title: "Scene Engine".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            clear_color: [0.1, 0.1, 0.12, 1.0],
            log_level: "info".to_string(),
        }
    }
}

impl RenderSettings {
    /// Create settings with a title and size, everything else default
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            ..Default::default()
        }
    }

    /// Builder: set the clear colour
    pub fn with_clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    /// Builder: set the log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Width over height of the initial framebuffer
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "title",
                reason: "window title cannot be empty".to_string(),
            });
        }

        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid {
                field: "width/height",
                reason: format!("window size must be non-zero, got {}x{}", self.width, self.height),
            });
        }

        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::Invalid {
                field: "clear_color",
                reason: format!("channels must be within 0.0..=1.0, got {:?}", self.clear_color),
            });
        }

        if logging::parse_level(&self.log_level).is_none() {
            return Err(ConfigError::Invalid {
                field: "log_level",
                reason: format!("unknown log level '{}'", self.log_level),
            });
        }

        Ok(())
    }
}

/// Where the file-system asset loader looks for shaders and textures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    /// Root directory prepended to relative asset paths
    pub root: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            root: "resources".to_string(),
        }
    }
}

/// Settings for the headless window backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessSettings {
    /// Number of update/render frames to run before the loop exits
    pub frames: u32,
    /// Fixed delta time handed to every frame, in seconds
    pub fixed_delta: f32,
}

impl Default for HeadlessSettings {
    fn default() -> Self {
        Self {
            frames: 120,
            fixed_delta: 1.0 / 60.0,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window and frame settings
    pub render: RenderSettings,
    /// Asset lookup settings
    pub assets: AssetSettings,
    /// Headless run settings
    pub headless: HeadlessSettings,
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.render.validate()?;
        let fixed_delta = self.headless.fixed_delta;
        if !fixed_delta.is_finite() || fixed_delta <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "headless.fixed_delta",
                reason: format!("fixed delta must be positive and finite, got {fixed_delta}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("scene_engine_{}_{}", std::process::id(), name))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_non_finite_fixed_delta_rejected() {
        for fixed_delta in [f32::NAN, f32::INFINITY, 0.0, -0.016] {
            let mut config = EngineConfig::default();
            config.headless.fixed_delta = fixed_delta;
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid { field: "headless.fixed_delta", .. })),
                "accepted {fixed_delta}"
            );
        }
    }

    #[test]
    fn test_zero_size_rejected() {
        let settings = RenderSettings::new("x", 0, 600);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { field: "width/height", .. })
        ));
    }

    #[test]
    fn test_empty_title_rejected() {
        let settings = RenderSettings::new("  ", 800, 600);
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid { field: "title", .. })));
    }

    #[test]
    fn test_clear_color_range() {
        let settings = RenderSettings::default().with_clear_color([1.5, 0.0, 0.0, 1.0]);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let settings = RenderSettings::default().with_log_level("chatty");
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid { field: "log_level", .. })));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let path = temp_path("partial.toml");
        std::fs::write(&path, "[render]\ntitle = \"Demo\"\nwidth = 640\n").unwrap();

        let config = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(config.render.title, "Demo");
        assert_eq!(config.render.width, 640);
        assert_eq!(config.render.height, 720);
        assert_eq!(config.assets, AssetSettings::default());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_save_and_load_ron() {
        let path = temp_path("engine.ron");
        let mut config = EngineConfig::default();
        config.headless.frames = 7;
        config.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            EngineConfig::load_from_file("settings.yaml"),
            Err(ConfigError::Io(_) | ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            EngineConfig::default().save_to_file("settings.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
