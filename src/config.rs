//! Output settings loaded from TOML
//!
//! Only transport and export settings live here; sieves and clouds are
//! always built in code or from command-line arguments.
//!
//! ```toml
//! [midi_file]
//! bpm = 120.0
//! ticks_per_beat = 480
//! separate_tracks_by_channel = true
//!
//! [osc]
//! target = "127.0.0.1:57120"
//! address = "/note"
//!
//! [midi_device]
//! port = "IAC"
//! ```

use crate::error::{XenakisError, XenakisResult};
use crate::midi_file::ExportSettings;
use crate::sink::DEFAULT_OSC_ADDRESS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscSettings {
    pub target: String,
    pub address: String,
}

impl Default for OscSettings {
    fn default() -> Self {
        Self {
            target: "127.0.0.1:57120".to_string(),
            address: DEFAULT_OSC_ADDRESS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiDeviceSettings {
    /// Substring of the output port name; first port when absent
    pub port: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub midi_file: ExportSettings,
    pub osc: OscSettings,
    pub midi_device: MidiDeviceSettings,
}

impl OutputConfig {
    pub fn load(path: &Path) -> XenakisResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> XenakisResult<Self> {
        let config: OutputConfig =
            toml::from_str(content).map_err(|e| XenakisError::Config(e.to_string()))?;
        config.midi_file.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> XenakisResult<String> {
        toml::to_string_pretty(self).map_err(|e| XenakisError::Serde(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = OutputConfig::from_toml_str("").unwrap();
        assert_eq!(config, OutputConfig::default());
        assert_eq!(config.midi_file.ticks_per_beat, 480);
        assert_eq!(config.osc.address, "/note");
        assert!(config.midi_device.port.is_none());
    }

    #[test]
    fn test_partial_tables() {
        let config = OutputConfig::from_toml_str(
            r#"
            [midi_file]
            bpm = 96.0
            separate_tracks_by_channel = false

            [midi_device]
            port = "IAC"
            "#,
        )
        .unwrap();
        assert_eq!(config.midi_file.bpm, 96.0);
        assert_eq!(config.midi_file.ticks_per_beat, 480);
        assert!(!config.midi_file.separate_tracks_by_channel);
        assert_eq!(config.midi_device.port.as_deref(), Some("IAC"));
        assert_eq!(config.osc.target, "127.0.0.1:57120");
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(matches!(
            OutputConfig::from_toml_str("[midi_file]\nbpm = \"fast\""),
            Err(XenakisError::Config(_))
        ));
        assert!(matches!(
            OutputConfig::from_toml_str("[midi_file]\nbpm = -10.0"),
            Err(XenakisError::Config(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = OutputConfig::default();
        config.osc.address = "/cloud".to_string();
        let text = config.to_toml().unwrap();
        assert_eq!(OutputConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.toml");
        fs::write(&path, "[osc]\ntarget = \"10.0.0.2:9000\"\n").unwrap();
        let config = OutputConfig::load(&path).unwrap();
        assert_eq!(config.osc.target, "10.0.0.2:9000");
    }
}
