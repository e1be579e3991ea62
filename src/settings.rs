//! Game settings and tuning
//!
//! Stored as JSON. Every field has a default, so a settings file only needs
//! the values it wants to change.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::{ACID_JAZZ, Track};
use crate::sim::rhythm::{BeatClock, RhythmError};

/// Why settings could not be loaded
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    UnknownTrack(String),
    Rhythm(RhythmError),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "cannot read settings: {e}"),
            SettingsError::Parse(e) => write!(f, "malformed settings: {e}"),
            SettingsError::UnknownTrack(name) => write!(f, "unknown track '{name}'"),
            SettingsError::Rhythm(e) => write!(f, "bad rhythm settings: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
            SettingsError::Rhythm(e) => Some(e),
            SettingsError::UnknownTrack(_) => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

impl From<RhythmError> for SettingsError {
    fn from(e: RhythmError) -> Self {
        SettingsError::Rhythm(e)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Rhythm ===
    /// Track name (see `audio::TRACKS`)
    pub track: String,
    /// Tempo to use instead of the track's own
    pub bpm_override: Option<f64>,
    /// How long after a beat a shot still counts (ms)
    pub early_tolerance_ms: u64,
    /// How long before a beat a shot already counts (ms)
    pub late_tolerance_ms: u64,
    /// Output latency added to the reported playback start (ms)
    pub latency_offset_ms: u64,

    // === Gameplay ===
    /// Seed for spawn placement
    pub seed: u64,
    /// Laser speed (units/s)
    pub weapon_speed: f32,
    /// Live enemy cap
    pub max_enemies: usize,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,
    /// Pending sound effects before new ones are dropped
    pub sfx_queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            track: ACID_JAZZ.name.to_string(),
            bpm_override: None,
            early_tolerance_ms: 100,
            late_tolerance_ms: 100,
            latency_offset_ms: 27,

            seed: 0x5eed,
            weapon_speed: crate::consts::WEAPON_SPEED,
            max_enemies: crate::consts::MAX_ENEMIES,

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
            sfx_queue_capacity: 32,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and validate a settings file
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Reject anything that would only blow up later, mid-session
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.beat_clock().map(|_| ())
    }

    pub fn track(&self) -> Result<Track, SettingsError> {
        Track::by_name(&self.track).ok_or_else(|| SettingsError::UnknownTrack(self.track.clone()))
    }

    /// Tempo in effect: the override if set, else the track's own
    pub fn bpm(&self) -> Result<f64, SettingsError> {
        match self.bpm_override {
            Some(bpm) => Ok(bpm),
            None => Ok(self.track()?.bpm),
        }
    }

    pub fn beat_clock(&self) -> Result<BeatClock, SettingsError> {
        Ok(BeatClock::new(
            self.bpm()?,
            Duration::from_millis(self.early_tolerance_ms),
            Duration::from_millis(self.late_tolerance_ms),
        )?)
    }

    pub fn latency_offset(&self) -> Duration {
        Duration::from_millis(self.latency_offset_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = Settings::from_json(r#"{ "track": "backed-vibes", "seed": 7 }"#).unwrap();
        assert_eq!(s.seed, 7);
        assert_eq!(s.early_tolerance_ms, 100);
        assert_eq!(s.bpm().unwrap(), 102.230);
    }

    #[test]
    fn test_zero_bpm_rejected_up_front() {
        let err = Settings::from_json(r#"{ "bpm_override": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Rhythm(RhythmError::InvalidTempo(_))
        ));
    }

    #[test]
    fn test_unknown_track() {
        let err = Settings::from_json(r#"{ "track": "elevator-music" }"#).unwrap_err();
        assert!(matches!(err, SettingsError::UnknownTrack(ref t) if t == "elevator-music"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Settings::from_json("{ nope"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_roundtrip_through_file() {
        let path = std::env::temp_dir()
            .join(format!("beat-phaser-settings-{}.json", std::process::id()));
        let mut settings = Settings::default();
        settings.late_tolerance_ms = 40;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
        let _ = std::fs::remove_file(&path);
    }
}
