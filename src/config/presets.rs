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
//! Built-in mix presets.

use std::collections::HashMap;

use super::error::ConfigError;
use super::mix::{
    CompressorConfig, MasterConfig, MixConfig, SendConfig, SidechainConfig, TrackConfig,
};

const PRESET_NAMES: &[&str] = &["flat", "club", "lofi", "warm", "punchy"];

/// Gets the names of all built-in presets.
pub fn names() -> Vec<&'static str> {
    PRESET_NAMES.to_vec()
}

/// Gets a built-in preset by name.
pub fn preset(name: &str) -> Result<MixConfig, ConfigError> {
    match name.to_ascii_lowercase().as_str() {
        "flat" => Ok(MixConfig::default()),
        "club" => Ok(club()),
        "lofi" => Ok(lofi()),
        "warm" => Ok(warm()),
        "punchy" => Ok(punchy()),
        _ => Err(ConfigError::UnknownPreset {
            name: name.to_string(),
            available: names(),
        }),
    }
}

fn compressor(threshold_db: f64, ratio: f64, attack_ms: f64, release_ms: f64) -> CompressorConfig {
    CompressorConfig {
        threshold_db,
        ratio,
        attack_ms,
        release_ms,
        makeup_db: 0.0,
    }
}

fn track(gain_db: f64, highpass_hz: Option<f64>, lowpass_hz: Option<f64>) -> TrackConfig {
    TrackConfig {
        gain_db,
        highpass_hz,
        lowpass_hz,
        compressor: None,
        sidechain: None,
    }
}

fn club() -> MixConfig {
    let mut bass = track(-2.0, Some(30.0), Some(5000.0));
    bass.sidechain = Some(SidechainConfig {
        source: "kick".to_string(),
        threshold_db: -24.0,
        ratio: 6.0,
        attack_ms: 5.0,
        release_ms: 150.0,
    });
    let mut kick = track(0.0, Some(30.0), None);
    kick.compressor = Some(compressor(-12.0, 4.0, 5.0, 80.0));

    MixConfig {
        tracks: HashMap::from([
            ("kick".to_string(), kick),
            ("snare".to_string(), track(-3.0, Some(120.0), None)),
            ("hihat".to_string(), track(-6.0, Some(400.0), None)),
            ("bass".to_string(), bass),
            ("pad".to_string(), track(-8.0, Some(200.0), Some(9000.0))),
        ]),
        master: MasterConfig {
            gain_db: 0.0,
            compressor: Some(compressor(-10.0, 3.0, 10.0, 200.0)),
            reverb_send: Some(SendConfig {
                wet: 0.12,
                delay_ms: None,
                decay: None,
            }),
            delay_send: None,
        },
    }
}

fn lofi() -> MixConfig {
    MixConfig {
        tracks: HashMap::from([
            ("kick".to_string(), track(-1.0, None, Some(6000.0))),
            ("snare".to_string(), track(-4.0, Some(150.0), Some(5000.0))),
            ("hihat".to_string(), track(-9.0, Some(300.0), Some(4500.0))),
            ("bass".to_string(), track(-3.0, None, Some(2500.0))),
            ("lead".to_string(), track(-6.0, Some(150.0), Some(4000.0))),
        ]),
        master: MasterConfig {
            gain_db: -1.0,
            compressor: Some(compressor(-18.0, 2.5, 30.0, 400.0)),
            reverb_send: Some(SendConfig {
                wet: 0.25,
                delay_ms: Some(80.0),
                decay: Some(0.5),
            }),
            delay_send: Some(SendConfig {
                wet: 0.1,
                delay_ms: Some(375.0),
                decay: Some(0.3),
            }),
        },
    }
}

fn warm() -> MixConfig {
    MixConfig {
        tracks: HashMap::from([
            ("hihat".to_string(), track(-4.0, Some(250.0), Some(12000.0))),
            ("bass".to_string(), track(1.0, None, Some(3500.0))),
            ("pad".to_string(), track(-4.0, Some(120.0), Some(7000.0))),
        ]),
        master: MasterConfig {
            gain_db: 0.0,
            compressor: Some(compressor(-14.0, 2.0, 25.0, 300.0)),
            reverb_send: Some(SendConfig {
                wet: 0.18,
                delay_ms: None,
                decay: None,
            }),
            delay_send: None,
        },
    }
}

fn punchy() -> MixConfig {
    let mut kick = track(2.0, Some(25.0), None);
    kick.compressor = Some(compressor(-14.0, 6.0, 1.0, 60.0));
    let mut snare = track(0.0, Some(100.0), None);
    snare.compressor = Some(compressor(-16.0, 4.0, 2.0, 90.0));

    MixConfig {
        tracks: HashMap::from([
            ("kick".to_string(), kick),
            ("snare".to_string(), snare),
            ("hihat".to_string(), track(-5.0, Some(500.0), None)),
        ]),
        master: MasterConfig {
            gain_db: 1.0,
            compressor: Some(CompressorConfig {
                makeup_db: 2.0,
                ..compressor(-8.0, 4.0, 5.0, 120.0)
            }),
            reverb_send: None,
            delay_send: None,
        },
    }
}
