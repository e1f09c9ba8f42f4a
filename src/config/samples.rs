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
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The metadata file written next to the samples by the sample generator.
pub const METADATA_FILE: &str = "samples.json";

/// Reference pitch used when neither the metadata nor the instrument table has one.
pub const DEFAULT_REFERENCE_PITCH: u8 = 60;

/// Reference pitches of the instruments the sample generator renders by default.
const INSTRUMENT_REFERENCE_PITCHES: &[(&str, u8)] = &[("subBass", 24), ("bass", 36)];

/// Per-instrument metadata from samples.json.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentMetadata {
    /// How many numbered variants were generated.
    pub variants: Option<u32>,
    /// The MIDI note the sample was rendered at.
    pub reference_pitch: Option<u8>,
}

/// Read-only view of samples.json. A missing file yields empty metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SamplesMetadata {
    instruments: HashMap<String, InstrumentMetadata>,
}

impl SamplesMetadata {
    /// Loads samples.json from the samples directory. Entries that are not instrument
    /// objects are ignored, and an unreadable file is logged and treated as empty.
    pub fn load(samples_dir: &Path) -> SamplesMetadata {
        let path = samples_dir.join(METADATA_FILE);
        if !path.is_file() {
            debug!(path = ?path, "No sample metadata found");
            return SamplesMetadata::default();
        }

        let raw: HashMap<String, serde_json::Value> = match fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|contents| serde_json::from_str(&contents).map_err(|e| e.to_string()))
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = ?path, error = e, "Unable to read sample metadata, ignoring it");
                return SamplesMetadata::default();
            }
        };

        let instruments = raw
            .into_iter()
            .filter_map(|(name, value)| {
                serde_json::from_value::<InstrumentMetadata>(value)
                    .ok()
                    .map(|metadata| (name, metadata))
            })
            .collect();
        SamplesMetadata { instruments }
    }

    /// Gets the metadata for an instrument, matching the name case-insensitively.
    pub fn instrument(&self, name: &str) -> Option<&InstrumentMetadata> {
        self.instruments.get(name).or_else(|| {
            self.instruments
                .iter()
                .find(|(instrument, _)| instrument.eq_ignore_ascii_case(name))
                .map(|(_, metadata)| metadata)
        })
    }

    /// Gets the number of variants recorded for an instrument.
    pub fn variants(&self, name: &str) -> Option<u32> {
        self.instrument(name).and_then(|metadata| metadata.variants)
    }

    /// Gets the pitch the instrument's samples were rendered at.
    pub fn reference_pitch(&self, name: &str) -> u8 {
        self.instrument(name)
            .and_then(|metadata| metadata.reference_pitch)
            .or_else(|| {
                INSTRUMENT_REFERENCE_PITCHES
                    .iter()
                    .find(|(instrument, _)| instrument.eq_ignore_ascii_case(name))
                    .map(|(_, pitch)| *pitch)
            })
            .unwrap_or(DEFAULT_REFERENCE_PITCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_metadata_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = SamplesMetadata::load(dir.path());
        assert_eq!(metadata, SamplesMetadata::default());
        assert_eq!(metadata.reference_pitch("bass"), 36);
        assert_eq!(metadata.reference_pitch("subbass"), 24);
        assert_eq!(metadata.reference_pitch("lead"), DEFAULT_REFERENCE_PITCH);
    }

    #[test]
    fn test_load_metadata() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(METADATA_FILE),
            r#"{
                "genre": "trip-hop",
                "bass": { "variants": 3, "referencePitch": 40 },
                "Lead": { "variants": 2 }
            }"#,
        )
        .unwrap();

        let metadata = SamplesMetadata::load(dir.path());
        assert_eq!(metadata.variants("bass"), Some(3));
        assert_eq!(metadata.reference_pitch("bass"), 40);
        assert_eq!(metadata.variants("lead"), Some(2));
        assert_eq!(metadata.reference_pitch("lead"), DEFAULT_REFERENCE_PITCH);
        assert!(metadata.instrument("genre").is_none());
    }

    #[test]
    fn test_unparseable_metadata_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(METADATA_FILE), "[1, 2").unwrap();
        assert_eq!(SamplesMetadata::load(dir.path()), SamplesMetadata::default());
    }
}
