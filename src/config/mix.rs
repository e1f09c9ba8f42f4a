// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::ConfigError;
use super::presets;

/// Allowed range for track and master gain, in dB.
pub const GAIN_DB_RANGE: (f64, f64) = (-60.0, 24.0);
/// Allowed range for filter cutoffs, in Hz.
pub const CUTOFF_HZ_RANGE: (f64, f64) = (20.0, 20000.0);
/// Allowed range for compressor thresholds, in dB.
pub const THRESHOLD_DB_RANGE: (f64, f64) = (-60.0, 0.0);
/// Allowed range for compressor ratios.
pub const RATIO_RANGE: (f64, f64) = (1.0, 20.0);
/// Allowed range for compressor attack, in milliseconds.
pub const ATTACK_MS_RANGE: (f64, f64) = (0.01, 2000.0);
/// Allowed range for compressor release, in milliseconds.
pub const RELEASE_MS_RANGE: (f64, f64) = (0.01, 9000.0);
/// Allowed range for compressor makeup gain, in dB.
pub const MAKEUP_DB_RANGE: (f64, f64) = (0.0, 64.0);
/// Allowed range for send delay times, in milliseconds.
pub const SEND_DELAY_MS_RANGE: (f64, f64) = (1.0, 5000.0);

/// The mix configuration: per-track inserts plus the master bus.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct MixConfig {
    /// Per-track settings by track name.
    #[serde(default)]
    pub tracks: HashMap<String, TrackConfig>,
    /// Master bus settings.
    #[serde(default)]
    pub master: MasterConfig,
}

/// Insert settings for a single track bus.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct TrackConfig {
    #[serde(default)]
    pub gain_db: f64,
    pub highpass_hz: Option<f64>,
    pub lowpass_hz: Option<f64>,
    pub compressor: Option<CompressorConfig>,
    /// Ducks this track under another track's level.
    pub sidechain: Option<SidechainConfig>,
}

/// Master bus settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct MasterConfig {
    #[serde(default)]
    pub gain_db: f64,
    pub compressor: Option<CompressorConfig>,
    pub reverb_send: Option<SendConfig>,
    pub delay_send: Option<SendConfig>,
}

/// Dynamics settings, passed through to the backend's compressor.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct CompressorConfig {
    pub threshold_db: f64,
    pub ratio: f64,
    pub attack_ms: f64,
    pub release_ms: f64,
    #[serde(default)]
    pub makeup_db: f64,
}

/// A parallel effect send mixed back with the dry signal.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct SendConfig {
    /// The wet level as a linear ratio (0..=1).
    pub wet: f64,
    /// Base delay time of the effect.
    pub delay_ms: Option<f64>,
    /// Decay of each echo (0..=1).
    pub decay: Option<f64>,
}

/// Gain reduction on a track keyed from another track's bus.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SidechainConfig {
    /// The track whose level triggers the ducking.
    pub source: String,
    pub threshold_db: f64,
    pub ratio: f64,
    pub attack_ms: f64,
    pub release_ms: f64,
}

/// Where a mix configuration comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum MixSource {
    /// One of the built-in presets.
    Preset(String),
    /// A JSON or YAML file matching the mix configuration shape.
    File(PathBuf),
}

impl MixSource {
    /// Interprets a command line value: an existing file path, or otherwise a preset name.
    pub fn parse(value: &str) -> MixSource {
        let path = Path::new(value);
        if path.is_file() {
            MixSource::File(path.to_path_buf())
        } else {
            MixSource::Preset(value.to_string())
        }
    }

    /// Loads the mix configuration and clamps it into the supported ranges.
    pub fn load(&self) -> Result<MixConfig, ConfigError> {
        let config = match self {
            MixSource::Preset(name) => presets::preset(name)?,
            MixSource::File(path) => MixConfig::from_file(path)?,
        };
        Ok(config.validated())
    }
}

impl MixConfig {
    /// Deserializes a mix configuration from a file. The format is chosen by extension.
    pub fn from_file(path: &Path) -> Result<MixConfig, ConfigError> {
        Config::builder()
            .add_source(File::from(path))
            .build()
            .and_then(|config| config.try_deserialize::<MixConfig>())
            .map_err(|source| ConfigError::MixFile {
                path: path.to_path_buf(),
                available: presets::names(),
                source,
            })
    }

    /// Gets the configuration for the given track. Falls back to a case-insensitive match.
    pub fn track(&self, name: &str) -> Option<&TrackConfig> {
        self.tracks.get(name).or_else(|| {
            self.tracks
                .iter()
                .find(|(track, _)| track.eq_ignore_ascii_case(name))
                .map(|(_, config)| config)
        })
    }

    /// Returns a copy with every numeric parameter clamped into its supported range.
    pub fn validated(&self) -> MixConfig {
        MixConfig {
            tracks: self
                .tracks
                .iter()
                .map(|(name, track)| (name.clone(), track.validated(name)))
                .collect(),
            master: self.master.validated(),
        }
    }
}

impl TrackConfig {
    fn validated(&self, track: &str) -> TrackConfig {
        TrackConfig {
            gain_db: clamp_param(track, "gain_db", self.gain_db, GAIN_DB_RANGE),
            highpass_hz: self
                .highpass_hz
                .map(|hz| clamp_param(track, "highpass_hz", hz, CUTOFF_HZ_RANGE)),
            lowpass_hz: self
                .lowpass_hz
                .map(|hz| clamp_param(track, "lowpass_hz", hz, CUTOFF_HZ_RANGE)),
            compressor: self.compressor.map(|c| c.validated(track)),
            sidechain: self.sidechain.as_ref().map(|s| s.validated(track)),
        }
    }
}

impl MasterConfig {
    fn validated(&self) -> MasterConfig {
        MasterConfig {
            gain_db: clamp_param("master", "gain_db", self.gain_db, GAIN_DB_RANGE),
            compressor: self.compressor.map(|c| c.validated("master")),
            reverb_send: self.reverb_send.map(|s| s.validated("reverb_send")),
            delay_send: self.delay_send.map(|s| s.validated("delay_send")),
        }
    }
}

impl CompressorConfig {
    fn validated(&self, owner: &str) -> CompressorConfig {
        CompressorConfig {
            threshold_db: clamp_param(owner, "threshold_db", self.threshold_db, THRESHOLD_DB_RANGE),
            ratio: clamp_param(owner, "ratio", self.ratio, RATIO_RANGE),
            attack_ms: clamp_param(owner, "attack_ms", self.attack_ms, ATTACK_MS_RANGE),
            release_ms: clamp_param(owner, "release_ms", self.release_ms, RELEASE_MS_RANGE),
            makeup_db: clamp_param(owner, "makeup_db", self.makeup_db, MAKEUP_DB_RANGE),
        }
    }
}

impl SendConfig {
    fn validated(&self, owner: &str) -> SendConfig {
        SendConfig {
            wet: clamp_param(owner, "wet", self.wet, (0.0, 1.0)),
            delay_ms: self
                .delay_ms
                .map(|ms| clamp_param(owner, "delay_ms", ms, SEND_DELAY_MS_RANGE)),
            decay: self
                .decay
                .map(|decay| clamp_param(owner, "decay", decay, (0.0, 1.0))),
        }
    }
}

impl SidechainConfig {
    fn validated(&self, owner: &str) -> SidechainConfig {
        SidechainConfig {
            source: self.source.clone(),
            threshold_db: clamp_param(owner, "threshold_db", self.threshold_db, THRESHOLD_DB_RANGE),
            ratio: clamp_param(owner, "ratio", self.ratio, RATIO_RANGE),
            attack_ms: clamp_param(owner, "attack_ms", self.attack_ms, ATTACK_MS_RANGE),
            release_ms: clamp_param(owner, "release_ms", self.release_ms, RELEASE_MS_RANGE),
        }
    }
}

/// Clamps a value into the given range, logging when it had to be changed.
/// Non-finite values collapse to the lower bound.
fn clamp_param(owner: &str, field: &str, value: f64, (min, max): (f64, f64)) -> f64 {
    let clamped = if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    };
    if clamped != value {
        warn!(
            owner,
            field,
            value,
            clamped,
            "Mix parameter out of range, clamping"
        );
    }
    clamped
}
