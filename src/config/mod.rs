//! Configuration management for league-pad
//!
//! Handles loading, parsing and validation of the YAML configuration file.
//! Every field has a default, so an empty (or missing) file is a valid
//! configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::info;

use crate::actuator::MouseButton;
use crate::input::gamepad::{ButtonId, TriggerSide};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub bindings: BindingsConfig,
}

/// Which backend feeds the sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// XInput controller (Windows)
    Xinput,
    /// First gilrs gamepad (Windows, non-XInput pads)
    Gilrs,
    /// Recorded frames from `replay_file`
    Replay,
}

/// Snapshot source configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,
    /// XInput user index (0-3)
    #[serde(default)]
    pub user_index: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay_file: Option<PathBuf>,
}

impl SourceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            user_index: 0,
            poll_interval_ms: default_poll_interval_ms(),
            replay_file: None,
        }
    }
}

/// Detector thresholds
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Radial stick deadzone on the raw ±32767 scale
    #[serde(default = "default_stick_deadzone")]
    pub stick_deadzone: f32,
    /// Raw magnitude treated as full deflection
    #[serde(default = "default_stick_max")]
    pub stick_max: f32,
    /// Trigger pressure (0-255) above which a trigger counts as pressed
    #[serde(default = "default_trigger_threshold")]
    pub trigger_threshold: u8,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            stick_deadzone: default_stick_deadzone(),
            stick_max: default_stick_max(),
            trigger_threshold: default_trigger_threshold(),
        }
    }
}

/// Movement arbiter configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MovementConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Minimum ticks between two champion commands
    #[serde(default = "default_champion_period_ticks")]
    pub champion_period_ticks: u32,
    /// Cursor speed at sensitivity 1.0, in desk units per tick
    #[serde(default = "default_cursor_base_speed")]
    pub cursor_base_speed: f64,
    /// Route the left stick to the cursor and the right stick to the champion
    #[serde(default)]
    pub swap_sticks: bool,
}

impl MovementConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            champion_period_ticks: default_champion_period_ticks(),
            cursor_base_speed: default_cursor_base_speed(),
            swap_sticks: false,
        }
    }
}

/// Button and trigger bindings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BindingsConfig {
    /// Button → key name
    #[serde(default = "default_button_bindings")]
    pub buttons: BTreeMap<ButtonId, String>,
    /// Trigger → mouse button clicked on press
    #[serde(default = "default_trigger_bindings")]
    pub triggers: BTreeMap<TriggerSide, MouseButton>,
}

impl Default for BindingsConfig {
    fn default() -> Self {
        Self {
            buttons: default_button_bindings(),
            triggers: default_trigger_bindings(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not exist
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            info!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse configuration from YAML text (no validation)
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document deserializes as null
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Invalid configuration")
    }

    /// Save configuration to file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.source.poll_interval_ms == 0 {
            anyhow::bail!("source.poll_interval_ms must be greater than 0");
        }
        if self.source.user_index > 3 {
            anyhow::bail!(
                "source.user_index {} is invalid (must be 0-3)",
                self.source.user_index
            );
        }
        if self.source.kind == SourceKind::Replay && self.source.replay_file.is_none() {
            anyhow::bail!("source.replay_file is required when source.kind is 'replay'");
        }

        let monitor = &self.monitor;
        if !monitor.stick_deadzone.is_finite() || monitor.stick_deadzone < 0.0 {
            anyhow::bail!("monitor.stick_deadzone must be a non-negative number");
        }
        if !monitor.stick_max.is_finite() || monitor.stick_max <= monitor.stick_deadzone {
            anyhow::bail!(
                "monitor.stick_max ({}) must be greater than monitor.stick_deadzone ({})",
                monitor.stick_max,
                monitor.stick_deadzone
            );
        }

        let movement = &self.movement;
        if movement.tick_interval_ms == 0 {
            anyhow::bail!("movement.tick_interval_ms must be greater than 0");
        }
        if movement.champion_period_ticks == 0 {
            anyhow::bail!("movement.champion_period_ticks must be greater than 0");
        }
        if !movement.cursor_base_speed.is_finite() || movement.cursor_base_speed <= 0.0 {
            anyhow::bail!("movement.cursor_base_speed must be a positive number");
        }

        for (button, key) in &self.bindings.buttons {
            if key.trim().is_empty() {
                anyhow::bail!("Key name bound to button '{}' cannot be empty", button);
            }
        }

        Ok(())
    }
}

fn default_source_kind() -> SourceKind { SourceKind::Xinput }
fn default_poll_interval_ms() -> u64 { 25 }
fn default_stick_deadzone() -> f32 { crate::input::gamepad::normalize::DEFAULT_STICK_DEADZONE }
fn default_stick_max() -> f32 { crate::input::gamepad::normalize::DEFAULT_STICK_MAX }
fn default_trigger_threshold() -> u8 { crate::input::gamepad::trigger::DEFAULT_TRIGGER_THRESHOLD }
fn default_tick_interval_ms() -> u64 { 40 }
fn default_champion_period_ticks() -> u32 { 100 }
fn default_cursor_base_speed() -> f64 { 2000.0 }

fn default_button_bindings() -> BTreeMap<ButtonId, String> {
    [
        (ButtonId::A, "Q"),
        (ButtonId::B, "W"),
        (ButtonId::X, "E"),
        (ButtonId::Y, "R"),
        (ButtonId::Back, "Tab"),
        (ButtonId::Start, "Escape"),
        (ButtonId::RightThumb, "F"),
        (ButtonId::LeftThumb, "D"),
        (ButtonId::DPadDown, "C"),
        (ButtonId::DPadUp, "Z"),
        (ButtonId::DPadLeft, "V"),
        (ButtonId::DPadRight, "X"),
    ]
    .into_iter()
    .map(|(button, key)| (button, key.to_string()))
    .collect()
}

fn default_trigger_bindings() -> BTreeMap<TriggerSide, MouseButton> {
    BTreeMap::from([
        (TriggerSide::Left, MouseButton::Left),
        (TriggerSide::Right, MouseButton::Right),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_yaml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.source.kind, SourceKind::Xinput);
        assert_eq!(config.source.poll_interval(), Duration::from_millis(25));
        assert_eq!(config.movement.tick_interval(), Duration::from_millis(40));
        assert_eq!(config.movement.champion_period_ticks, 100);
        assert_eq!(config.monitor.stick_deadzone, 7300.0);
        assert_eq!(config.monitor.trigger_threshold, 30);
        config.validate().unwrap();
    }

    #[test]
    fn test_default_bindings() {
        let bindings = BindingsConfig::default();
        assert_eq!(bindings.buttons.len(), 12);
        assert_eq!(bindings.buttons[&ButtonId::A], "Q");
        assert_eq!(bindings.buttons[&ButtonId::Start], "Escape");
        assert_eq!(bindings.buttons[&ButtonId::DPadRight], "X");
        assert!(!bindings.buttons.contains_key(&ButtonId::LeftBumper));
        assert!(!bindings.buttons.contains_key(&ButtonId::RightBumper));
        assert_eq!(bindings.triggers[&TriggerSide::Left], MouseButton::Left);
        assert_eq!(bindings.triggers[&TriggerSide::Right], MouseButton::Right);
    }

    #[test]
    fn test_partial_config() {
        let yaml = r#"
monitor:
  trigger_threshold: 60
movement:
  swap_sticks: true
bindings:
  buttons:
    a: Space
    right_bumper: G
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.monitor.trigger_threshold, 60);
        assert_eq!(config.monitor.stick_deadzone, 7300.0);
        assert!(config.movement.swap_sticks);
        assert_eq!(config.movement.tick_interval_ms, 40);
        // An explicit map replaces the default one
        assert_eq!(config.bindings.buttons.len(), 2);
        assert_eq!(config.bindings.buttons[&ButtonId::RightBumper], "G");
        assert_eq!(config.bindings.triggers.len(), 2);
    }

    #[test]
    fn test_unknown_button_is_rejected() {
        let yaml = "bindings:\n  buttons:\n    turbo: T\n";
        assert!(AppConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.monitor.stick_max = 7000.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.movement.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.movement.champion_period_ticks = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.source.kind = SourceKind::Replay;
        assert!(config.validate().is_err());
        config.source.replay_file = Some(PathBuf::from("frames.yaml"));
        assert!(config.validate().is_ok());

        let mut config = AppConfig::default();
        config.bindings.buttons.insert(ButtonId::Y, "  ".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'y'"));
    }

    #[tokio::test]
    async fn test_load_and_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = AppConfig::default();
        config.movement.swap_sticks = true;
        config.bindings.triggers.insert(TriggerSide::Left, MouseButton::Middle);
        config.save(&path).await.unwrap();

        let loaded = AppConfig::load(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "movement:\n  tick_interval_ms: 0").unwrap();

        let err = AppConfig::load(file.path()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("tick_interval_ms"));
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.yaml"))
            .await
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
