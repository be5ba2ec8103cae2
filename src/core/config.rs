//! Runtime configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Compositor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Socket name (e.g., "wayland-1")
    pub socket_name: String,

    /// The single virtual output
    pub output: OutputConfig,

    /// Keyboard configuration
    pub keyboard: KeyboardConfig,

    /// Table sizes
    pub capacity: CapacityConfig,

    /// Milliseconds between compositor ticks
    pub tick_interval_ms: u64,

    /// Maximum live textures (0 = unlimited)
    pub texture_budget: usize,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            socket_name: "wayland-1".to_string(),
            output: OutputConfig::default(),
            keyboard: KeyboardConfig::default(),
            capacity: CapacityConfig::default(),
            tick_interval_ms: 16,
            texture_budget: 0,
        }
    }
}

/// Fixed geometry broadcast on wl_output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub width: i32,
    pub height: i32,
    /// Physical size in millimetres
    pub physical_width: i32,
    pub physical_height: i32,
    /// Refresh rate in mHz
    pub refresh: i32,
    pub scale: i32,
    pub make: String,
    pub model: String,
    pub name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            physical_width: 340,
            physical_height: 190,
            refresh: 60_000,
            scale: 1,
            make: "worldcomp".to_string(),
            model: "world-output".to_string(),
            name: "WORLD-1".to_string(),
        }
    }
}

/// Keyboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// XKB rules
    pub rules: String,

    /// XKB model
    pub model: String,

    /// XKB layout
    pub layout: String,

    /// XKB variant
    pub variant: String,

    /// XKB options
    pub options: String,

    /// Key repeat rate (keys per second)
    pub repeat_rate: i32,

    /// Key repeat delay (ms)
    pub repeat_delay: i32,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            rules: String::new(),
            model: "pc105".to_string(),
            layout: "us".to_string(),
            variant: String::new(),
            options: String::new(),
            repeat_rate: 33,
            repeat_delay: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    pub max_surfaces: usize,
    pub max_windows: usize,
    /// Per kind: keyboards and pointers each get this many slots.
    pub max_observers: usize,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            max_surfaces: 256,
            max_windows: 64,
            max_observers: 64,
        }
    }
}

impl CompositorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        tracing::info!(?path, socket = %config.socket_name, "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.capacity.max_surfaces > 0, "capacity.max_surfaces must be positive");
        anyhow::ensure!(self.capacity.max_windows > 0, "capacity.max_windows must be positive");
        anyhow::ensure!(self.capacity.max_observers > 0, "capacity.max_observers must be positive");
        anyhow::ensure!(self.tick_interval_ms > 0, "tick_interval_ms must be positive");
        anyhow::ensure!(
            self.output.width > 0 && self.output.height > 0,
            "output size must be positive"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = CompositorConfig::from_toml("").unwrap();
        assert_eq!(config, CompositorConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = CompositorConfig::from_toml(
            r#"
            socket_name = "world-0"
            tick_interval_ms = 10

            [keyboard]
            layout = "de"

            [capacity]
            max_windows = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.socket_name, "world-0");
        assert_eq!(config.tick_interval_ms, 10);
        assert_eq!(config.keyboard.layout, "de");
        assert_eq!(config.keyboard.model, "pc105");
        assert_eq!(config.capacity.max_windows, 8);
        assert_eq!(config.capacity.max_surfaces, 256);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = CompositorConfig::from_toml("[capacity]\nmax_windows = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_windows"));
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(CompositorConfig::from_toml("tick_interval_ms = \"fast\"").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CompositorConfig::load(Path::new("/nonexistent/worldcomp.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/worldcomp.toml"));
    }
}
