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
//! Maps track names to sample files inside a samples directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use super::candidates::{candidates, Candidate, DRUM_RULES, PITCHED_RULES};
use super::drums::drum_for_note;
use crate::config::error::ConfigError;
use crate::config::pattern::TrackKind;
use crate::config::samples::SamplesMetadata;

/// Audio file extensions that may hold samples, in preference order.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "aif", "aiff", "ogg"];

/// How to pick between numbered variants of a pitched instrument sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VariantPolicy {
    /// Use the lowest numbered variant.
    #[default]
    First,
    /// Use this variant number if it exists, otherwise the lowest.
    Fixed(u32),
    /// Pick a variant deterministically from the seed and the track name.
    Seeded(u64),
}

/// An audio file found in the samples directory.
#[derive(Clone, Debug)]
struct SampleFile {
    path: PathBuf,
    /// Lower-cased file stem.
    stem: String,
    /// Lower-cased extension.
    extension: String,
}

/// What a sample file appears to contain, judging by its name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SampleKind {
    /// "<note>-<name>..." where the note is a known percussion note.
    Drum { note: u8, instrument: &'static str },
    /// "<instrument>-v<N>..."
    Variant { instrument: String, variant: u32 },
    /// Anything else, named after the instrument.
    Instrument(String),
}

/// A classified sample file, as listed by [`SampleResolver::scan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedSample {
    pub path: PathBuf,
    pub kind: SampleKind,
}

impl fmt::Display for ScannedSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        match &self.kind {
            SampleKind::Drum { note, instrument } => {
                write!(f, "{} (drum: {}, note {})", name, instrument, note)
            }
            SampleKind::Variant {
                instrument,
                variant,
            } => write!(f, "{} ({} variant {})", name, instrument, variant),
            SampleKind::Instrument(instrument) => write!(f, "{} ({})", name, instrument),
        }
    }
}

/// Resolves track names to sample files. The directory is listed once on creation,
/// so the resolver is read-only afterwards and may be shared between renders.
#[derive(Clone, Debug)]
pub struct SampleResolver {
    dir: PathBuf,
    files: Vec<SampleFile>,
    metadata: SamplesMetadata,
    variant_policy: VariantPolicy,
}

impl SampleResolver {
    /// Lists the samples directory and loads its metadata.
    pub fn new(dir: &Path) -> Result<SampleResolver, ConfigError> {
        let read_error = |source| ConfigError::Read {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            if !path.is_file() {
                continue;
            }
            let (Some(stem), Some(extension)) = (
                path.file_stem().and_then(|stem| stem.to_str()),
                path.extension().and_then(|extension| extension.to_str()),
            ) else {
                continue;
            };
            let extension = extension.to_ascii_lowercase();
            if !AUDIO_EXTENSIONS.contains(&extension.as_str()) {
                continue;
            }
            files.push(SampleFile {
                stem: stem.to_ascii_lowercase(),
                extension,
                path,
            });
        }
        // Keep pattern matches deterministic regardless of directory order.
        files.sort_by(|a, b| a.path.cmp(&b.path));

        info!(dir = ?dir, samples = files.len(), "Indexed samples directory");
        Ok(SampleResolver {
            dir: dir.to_path_buf(),
            files,
            metadata: SamplesMetadata::load(dir),
            variant_policy: VariantPolicy::default(),
        })
    }

    /// Sets the variant selection policy for pitched instruments.
    pub fn with_variant_policy(mut self, variant_policy: VariantPolicy) -> SampleResolver {
        self.variant_policy = variant_policy;
        self
    }

    /// Gets the samples directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Gets the sample metadata.
    pub fn metadata(&self) -> &SamplesMetadata {
        &self.metadata
    }

    /// Resolves a track to a sample file. Returns None if nothing matches.
    pub fn resolve(&self, track_name: &str, kind: TrackKind) -> Option<PathBuf> {
        let rules = match kind {
            TrackKind::Drum => DRUM_RULES,
            TrackKind::Pitched => PITCHED_RULES,
        };

        let resolved = candidates(rules, track_name)
            .iter()
            .find_map(|candidate| self.find(track_name, candidate));
        match &resolved {
            Some(path) => debug!(track = track_name, path = ?path, "Resolved sample"),
            None => debug!(track = track_name, "No sample matched"),
        }
        resolved
    }

    /// Classifies every sample file in the directory by name.
    pub fn scan(&self) -> Vec<ScannedSample> {
        self.files
            .iter()
            .map(|file| ScannedSample {
                path: file.path.clone(),
                kind: classify(&file.stem),
            })
            .collect()
    }

    fn find(&self, track_name: &str, candidate: &Candidate) -> Option<PathBuf> {
        match candidate {
            Candidate::Exact(name) => {
                let name = name.to_ascii_lowercase();
                AUDIO_EXTENSIONS.iter().find_map(|extension| {
                    self.files
                        .iter()
                        .find(|file| file.stem == name && file.extension == *extension)
                        .map(|file| file.path.clone())
                })
            }
            Candidate::Prefix(prefix) => {
                let prefix = prefix.to_ascii_lowercase();
                self.files
                    .iter()
                    .find(|file| file.stem.starts_with(&prefix))
                    .map(|file| file.path.clone())
            }
            Candidate::Variant(name) => self.find_variant(track_name, name),
        }
    }

    fn find_variant(&self, track_name: &str, name: &str) -> Option<PathBuf> {
        let name = name.to_ascii_lowercase();
        let mut variants: Vec<(u32, &SampleFile)> = self
            .files
            .iter()
            .filter_map(|file| variant_number(&file.stem, &name).map(|number| (number, file)))
            .collect();
        if variants.is_empty() {
            return None;
        }
        // Lowest variant first; ties broken by extension preference.
        variants.sort_by_key(|(number, file)| {
            let rank = AUDIO_EXTENSIONS
                .iter()
                .position(|extension| *extension == file.extension)
                .unwrap_or(AUDIO_EXTENSIONS.len());
            (*number, rank)
        });
        variants.dedup_by_key(|(number, _)| *number);

        let chosen = match self.variant_policy {
            VariantPolicy::First => variants.first(),
            VariantPolicy::Fixed(wanted) => variants
                .iter()
                .find(|(number, _)| *number == wanted)
                .or_else(|| variants.first()),
            VariantPolicy::Seeded(seed) => {
                let limit = self.metadata.variants(track_name);
                let bounded: Vec<&(u32, &SampleFile)> = variants
                    .iter()
                    .filter(|(number, _)| limit.map_or(true, |limit| *number <= limit))
                    .collect();
                let pool = if bounded.is_empty() {
                    variants.iter().collect()
                } else {
                    bounded
                };
                let mut rng = StdRng::seed_from_u64(seed ^ name_hash(&name));
                pool.choose(&mut rng).copied()
            }
        };
        chosen.map(|(_, file)| file.path.clone())
    }
}

/// Parses "<name>-v<N>" (optionally followed by "-<descriptor>") and returns N.
fn variant_number(stem: &str, name: &str) -> Option<u32> {
    let rest = stem.strip_prefix(name)?.strip_prefix("-v")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let remainder = &rest[digits.len()..];
    if !remainder.is_empty() && !remainder.starts_with('-') {
        return None;
    }
    digits.parse().ok()
}

fn classify(stem: &str) -> SampleKind {
    if let Some(note) = stem
        .split_once('-')
        .and_then(|(prefix, _)| prefix.parse::<u8>().ok())
    {
        if let Some(instrument) = drum_for_note(note) {
            return SampleKind::Drum { note, instrument };
        }
    }
    if let Some(index) = stem.rfind("-v") {
        let instrument = &stem[..index];
        if let Some(variant) = variant_number(stem, instrument) {
            return SampleKind::Variant {
                instrument: instrument.to_string(),
                variant,
            };
        }
    }
    SampleKind::Instrument(stem.to_string())
}

/// FNV-1a, used to give each track its own variant choice under one seed.
fn name_hash(name: &str) -> u64 {
    name.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_dir;

    fn file_name(path: Option<PathBuf>) -> Option<String> {
        path.map(|path| path.file_name().unwrap().to_string_lossy().to_string())
    }

    #[test]
    fn test_numbered_standard_name_wins() {
        let dir = sample_dir(&["kick.wav", "36-kick.wav", "36-kick-deep.wav"]);
        let resolver = SampleResolver::new(dir.path()).unwrap();
        assert_eq!(
            file_name(resolver.resolve("kick", TrackKind::Drum)),
            Some("36-kick.wav".to_string())
        );
    }

    #[test]
    fn test_numbered_raw_name() {
        let dir = sample_dir(&["36-BD.wav", "kick-808.wav"]);
        let resolver = SampleResolver::new(dir.path()).unwrap();
        assert_eq!(
            file_name(resolver.resolve("BD", TrackKind::Drum)),
            Some("36-BD.wav".to_string())
        );
    }

    #[test]
    fn test_standard_name_before_raw_name() {
        let dir = sample_dir(&["hh.wav", "hihat.mp3"]);
        let resolver = SampleResolver::new(dir.path()).unwrap();
        assert_eq!(
            file_name(resolver.resolve("hh", TrackKind::Drum)),
            Some("hihat.mp3".to_string())
        );
    }

    #[test]
    fn test_case_insensitive_and_extension_order() {
        let dir = sample_dir(&["SNARE.MP3", "snare.wav"]);
        let resolver = SampleResolver::new(dir.path()).unwrap();
        assert_eq!(
            file_name(resolver.resolve("Snare", TrackKind::Drum)),
            Some("snare.wav".to_string())
        );
    }

    #[test]
    fn test_separator_swapped_raw_name() {
        let dir = sample_dir(&["shaker-loop.wav"]);
        let resolver = SampleResolver::new(dir.path()).unwrap();
        assert_eq!(
            file_name(resolver.resolve("shaker_loop", TrackKind::Drum)),
            Some("shaker-loop.wav".to_string())
        );
    }

    #[test]
    fn test_descriptor_patterns() {
        let dir = sample_dir(&["clap-vintage.wav", "39-clap-tight.wav"]);
        let resolver = SampleResolver::new(dir.path()).unwrap();
        assert_eq!(
            file_name(resolver.resolve("clap", TrackKind::Drum)),
            Some("39-clap-tight.wav".to_string())
        );

        let dir = sample_dir(&["clap-vintage.wav"]);
        let resolver = SampleResolver::new(dir.path()).unwrap();
        assert_eq!(
            file_name(resolver.resolve("clap", TrackKind::Drum)),
            Some("clap-vintage.wav".to_string())
        );
    }

    #[test]
    fn test_not_found() {
        let dir = sample_dir(&["snare.wav", "notes.txt", "kick.txt"]);
        let resolver = SampleResolver::new(dir.path()).unwrap();
        assert_eq!(resolver.resolve("kick", TrackKind::Drum), None);
        assert_eq!(resolver.resolve("bass", TrackKind::Pitched), None);
    }

    #[test]
    fn test_pitched_prefers_variants() {
        let dir = sample_dir(&["bass.wav", "bass-v2.wav", "bass-v1.mp3", "bassline-v1.wav"]);
        let resolver = SampleResolver::new(dir.path()).unwrap();
        assert_eq!(
            file_name(resolver.resolve("bass", TrackKind::Pitched)),
            Some("bass-v1.mp3".to_string())
        );

        let resolver = resolver.with_variant_policy(VariantPolicy::Fixed(2));
        assert_eq!(
            file_name(resolver.resolve("bass", TrackKind::Pitched)),
            Some("bass-v2.wav".to_string())
        );

        let resolver = resolver.with_variant_policy(VariantPolicy::Fixed(7));
        assert_eq!(
            file_name(resolver.resolve("bass", TrackKind::Pitched)),
            Some("bass-v1.mp3".to_string())
        );
    }

    #[test]
    fn test_pitched_falls_back_to_bare_name() {
        let dir = sample_dir(&["Lead.wav"]);
        let resolver = SampleResolver::new(dir.path()).unwrap();
        assert_eq!(
            file_name(resolver.resolve("lead", TrackKind::Pitched)),
            Some("Lead.wav".to_string())
        );
    }

    #[test]
    fn test_seeded_variant_is_deterministic_and_bounded() {
        let dir = sample_dir(&["pad-v1.wav", "pad-v2.wav", "pad-v3.wav", "pad-v4.wav"]);
        std::fs::write(
            dir.path().join("samples.json"),
            r#"{ "pad": { "variants": 2 } }"#,
        )
        .unwrap();
        let resolver = SampleResolver::new(dir.path())
            .unwrap()
            .with_variant_policy(VariantPolicy::Seeded(42));

        let first = resolver.resolve("pad", TrackKind::Pitched);
        assert_eq!(first, resolver.resolve("pad", TrackKind::Pitched));
        let name = file_name(first).unwrap();
        assert!(name == "pad-v1.wav" || name == "pad-v2.wav", "{}", name);
    }

    #[test]
    fn test_variant_number() {
        assert_eq!(variant_number("bass-v3", "bass"), Some(3));
        assert_eq!(variant_number("bass-v12-dark", "bass"), Some(12));
        assert_eq!(variant_number("bass-v", "bass"), None);
        assert_eq!(variant_number("bass-vx", "bass"), None);
        assert_eq!(variant_number("bass-v2x", "bass"), None);
        assert_eq!(variant_number("bassline-v1", "bass"), None);
    }

    #[test]
    fn test_scan() {
        let dir = sample_dir(&["36-kick-deep.wav", "bass-v2.wav", "pad.wav", "99-odd.wav"]);
        let resolver = SampleResolver::new(dir.path()).unwrap();
        let kinds: Vec<SampleKind> = resolver.scan().into_iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SampleKind::Drum {
                    note: 36,
                    instrument: "kick"
                },
                SampleKind::Instrument("99-odd".to_string()),
                SampleKind::Variant {
                    instrument: "bass".to_string(),
                    variant: 2
                },
                SampleKind::Instrument("pad".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SampleResolver::new(&dir.path().join("nope")).is_err());
    }
}
