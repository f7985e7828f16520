//! JSON configuration and report helpers.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::combination::FrameCombinations;
use crate::debug::DetectionDebug;
use crate::dictionary::{DictionaryError, LabelDictionary};
use crate::params::DetectorParams;
use crate::state::{DetectedMarker, TrackerState};

#[derive(thiserror::Error, Debug)]
pub enum TrackerIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] TrackerIoError),
    #[error("dictionary: {0}")]
    Dictionary(#[from] DictionaryError),
    #[error("config has neither an inline dictionary nor a dictionary_path")]
    MissingDictionary,
}

fn default_threshold() -> u8 {
    100
}

/// Everything needed to build a detector, as one JSON document.
///
/// The dictionary is given inline or as a path relative to the config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    #[serde(default)]
    pub detector: DetectorParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<LabelDictionary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_path: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            detector: DetectorParams::default(),
            dictionary: None,
            dictionary_path: None,
        }
    }
}

impl TrackerConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, TrackerIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), TrackerIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Inline dictionary, or the one at `dictionary_path` resolved against
    /// `base_dir`.
    pub fn load_dictionary(&self, base_dir: &Path) -> Result<LabelDictionary, ConfigError> {
        if let Some(dict) = &self.dictionary {
            return Ok(dict.clone());
        }
        let path = self
            .dictionary_path
            .as_ref()
            .ok_or(ConfigError::MissingDictionary)?;
        Ok(LabelDictionary::load_json(base_dir.join(path))?)
    }
}

/// Serializable per-frame result.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FrameReport {
    pub threshold: u8,
    pub markers: Vec<DetectedMarker>,
    pub combinations: FrameCombinations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DetectionDebug>,
}

impl FrameReport {
    pub fn new(threshold: u8, state: &TrackerState, combinations: FrameCombinations) -> Self {
        Self {
            threshold,
            markers: state.iter().cloned().collect(),
            combinations,
            debug: None,
        }
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), TrackerIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
