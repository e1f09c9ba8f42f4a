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
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// The MIDI channel (zero-indexed) reserved for percussion.
pub const PERCUSSION_CHANNEL: u8 = 9;

/// The token in a section's active track list that enables every percussion track.
pub const DRUMS_TOKEN: &str = "drums";

/// A JSON representation of a step-sequenced arrangement.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    /// Tempo in beats per minute.
    pub tempo: u32,
    /// The time signature, e.g. "4/4".
    pub time_signature: TimeSignature,
    /// The number of steps in one bar.
    pub resolution: u32,
    /// The tracks of the pattern.
    pub tracks: Vec<Track>,
    /// Optional arrangement sections. When present, the pattern is looped per bar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,
}

/// A single track of note events.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Track {
    /// The name of the track, used for sample resolution and mix routing.
    pub name: String,
    /// The MIDI channel. Absent or 9 means percussion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    /// The note events of the track.
    pub pattern: Vec<NoteEvent>,
}

/// Whether a track plays one-shot percussion or pitched instrument notes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackKind {
    Drum,
    Pitched,
}

impl Track {
    /// Gets the kind of this track based on its channel.
    pub fn kind(&self) -> TrackKind {
        match self.channel {
            None | Some(PERCUSSION_CHANNEL) => TrackKind::Drum,
            Some(_) => TrackKind::Pitched,
        }
    }

    /// Returns true if the track is a percussion track.
    pub fn is_drum(&self) -> bool {
        self.kind() == TrackKind::Drum
    }
}

/// A note event within a track.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct NoteEvent {
    /// The step index within the bar, starting at 0.
    pub step: u32,
    /// The MIDI velocity (1..=127).
    pub velocity: u8,
    /// The MIDI note to play for pitched tracks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<u8>,
    /// The length of the note in steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl NoteEvent {
    /// Gets the duration of the note in steps (default: 1).
    pub fn duration_steps(&self) -> f64 {
        self.duration.unwrap_or(1.0)
    }
}

/// An arrangement section.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// The name of the section.
    pub name: String,
    /// The number of bars in the section.
    pub bars: u32,
    /// The tracks active in this section. May contain the literal "drums".
    pub active_tracks: Vec<String>,
    /// The energy of the section (0..=1), scales event gain.
    pub energy: f64,
}

impl Section {
    /// Returns true if the given track plays in this section.
    pub fn is_active(&self, track: &Track) -> bool {
        self.active_tracks
            .iter()
            .any(|active| active == &track.name || (active == DRUMS_TOKEN && track.is_drum()))
    }
}

/// A parsed "N/D" time signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    /// Creates a new time signature.
    pub fn new(numerator: u32, denominator: u32) -> TimeSignature {
        TimeSignature {
            numerator,
            denominator,
        }
    }
}

impl FromStr for TimeSignature {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (numerator, denominator) = s.split_once('/').ok_or_else(|| {
            ConfigError::InvalidPattern(format!("malformed time signature '{}'", s))
        })?;
        let parse = |part: &str| {
            part.trim().parse::<u32>().map_err(|_| {
                ConfigError::InvalidPattern(format!("malformed time signature '{}'", s))
            })
        };
        let signature = TimeSignature::new(parse(numerator)?, parse(denominator)?);
        if signature.numerator == 0 || signature.denominator == 0 {
            return Err(ConfigError::InvalidPattern(format!(
                "time signature '{}' must have non-zero parts",
                s
            )));
        }
        Ok(signature)
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl<'de> Deserialize<'de> for TimeSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for TimeSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Pattern {
    /// Reads and validates a pattern document from a JSON file.
    pub fn from_file(path: &Path) -> Result<Pattern, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let pattern: Pattern =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        pattern.validate()?;
        Ok(pattern)
    }

    /// Checks the structural invariants of the pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tempo == 0 {
            return Err(ConfigError::InvalidPattern("tempo must be positive".into()));
        }
        if self.resolution == 0 {
            return Err(ConfigError::InvalidPattern(
                "resolution must be positive".into(),
            ));
        }
        if self.steps_per_beat() <= 0.0 {
            return Err(ConfigError::InvalidPattern(format!(
                "resolution {} is not compatible with time signature {}",
                self.resolution, self.time_signature
            )));
        }
        for track in self.tracks.iter() {
            if let Some(note) = track
                .pattern
                .iter()
                .find(|note| note.velocity == 0 || note.velocity > 127)
            {
                return Err(ConfigError::InvalidPattern(format!(
                    "track '{}' has velocity {} at step {} (expected 1..=127)",
                    track.name, note.velocity, note.step
                )));
            }
            if let Some(note) = track.pattern.iter().find(|note| note.duration_steps() < 0.0) {
                return Err(ConfigError::InvalidPattern(format!(
                    "track '{}' has a negative duration at step {}",
                    track.name, note.step
                )));
            }
        }
        for section in self.sections.iter().flatten() {
            if section.bars == 0 {
                return Err(ConfigError::InvalidPattern(format!(
                    "section '{}' must have at least one bar",
                    section.name
                )));
            }
            if !(0.0..=1.0).contains(&section.energy) {
                return Err(ConfigError::InvalidPattern(format!(
                    "section '{}' has energy {} (expected 0..=1)",
                    section.name, section.energy
                )));
            }
        }
        Ok(())
    }

    /// Gets the number of steps per beat. May be fractional.
    pub fn steps_per_beat(&self) -> f64 {
        self.resolution as f64 / self.time_signature.numerator as f64
    }

    /// Gets the length of one beat in seconds.
    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.tempo as f64
    }

    /// Gets the length of one step in seconds.
    pub fn seconds_per_step(&self) -> f64 {
        self.seconds_per_beat() / self.steps_per_beat()
    }

    /// Gets the length of one bar in seconds.
    pub fn bar_duration(&self) -> f64 {
        self.time_signature.numerator as f64 * self.seconds_per_beat()
    }

    /// Gets a track by name.
    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.name == name)
    }

    /// Creates a copy of this pattern containing only the named track. Every section is
    /// forced to include the track so that it plays throughout the arrangement.
    pub fn isolate(&self, track_name: &str) -> Option<Pattern> {
        let track = self.track(track_name)?.clone();
        let sections = self.sections.as_ref().map(|sections| {
            sections
                .iter()
                .map(|section| {
                    let mut section = section.clone();
                    if !section.active_tracks.iter().any(|t| t == track_name) {
                        section.active_tracks.push(track_name.to_string());
                    }
                    section
                })
                .collect()
        });

        Some(Pattern {
            tempo: self.tempo,
            time_signature: self.time_signature,
            resolution: self.resolution,
            tracks: vec![track],
            sections,
        })
    }
}
