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
//! Converts step-indexed patterns into absolute-time playback events.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::pattern::{NoteEvent, Pattern, Section, Track};
use crate::render::error::RenderError;
use crate::samples::SampleResolver;

/// A single sample playback at an absolute time.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEvent {
    /// Start time in seconds.
    pub time: f64,
    /// The sample to play.
    pub asset_path: PathBuf,
    /// Linear gain (0..=1), including velocity and section energy.
    pub gain: f64,
    /// The track the event belongs to.
    pub track_name: String,
    /// The MIDI note to play for pitched tracks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<u8>,
    /// The note length in seconds for pitched tracks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// The ordered playback events of a pattern and the total render length.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub events: Vec<PlaybackEvent>,
    pub total_duration: f64,
}

impl Timeline {
    /// Builds the timeline for a pattern, resolving each track's sample once.
    /// Tracks without a sample are skipped. Fails if no events remain.
    pub fn build(pattern: &Pattern, resolver: &SampleResolver) -> Result<Timeline, RenderError> {
        let mut samples = TrackSamples::new(resolver);
        let seconds_per_step = pattern.seconds_per_step();

        let (mut events, total_duration) = match &pattern.sections {
            Some(sections) => {
                let mut events = Vec::new();
                let mut current_time = 0.0;
                let bar_duration = pattern.bar_duration();
                for section in sections.iter() {
                    for bar in 0..section.bars {
                        let bar_offset = current_time + bar as f64 * bar_duration;
                        for track in pattern.tracks.iter().filter(|t| section.is_active(t)) {
                            let Some(asset_path) = samples.get(track) else {
                                continue;
                            };
                            events.extend(track.pattern.iter().map(|note| {
                                event(track, note, &asset_path, bar_offset, seconds_per_step)
                                    .with_energy(section)
                            }));
                        }
                    }
                    current_time += section.bars as f64 * bar_duration;
                }
                (events, current_time)
            }
            None => {
                let mut events = Vec::new();
                for track in pattern.tracks.iter() {
                    let Some(asset_path) = samples.get(track) else {
                        continue;
                    };
                    events.extend(
                        track
                            .pattern
                            .iter()
                            .map(|note| event(track, note, &asset_path, 0.0, seconds_per_step)),
                    );
                }
                let total_duration =
                    (pattern.resolution as f64 / pattern.steps_per_beat()) * pattern.seconds_per_beat();
                (events, total_duration)
            }
        };

        if events.is_empty() {
            return Err(RenderError::NoEvents);
        }
        events.sort_by(|a, b| a.time.total_cmp(&b.time));

        debug!(
            events = events.len(),
            total_duration, "Built playback timeline"
        );
        Ok(Timeline {
            events,
            total_duration,
        })
    }

    /// Gets the number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if there are no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn event(
    track: &Track,
    note: &NoteEvent,
    asset_path: &Path,
    offset: f64,
    seconds_per_step: f64,
) -> PlaybackEvent {
    let (pitch, duration) = if track.is_drum() {
        (None, None)
    } else {
        (note.pitch, Some(note.duration_steps() * seconds_per_step))
    };
    PlaybackEvent {
        time: offset + note.step as f64 * seconds_per_step,
        asset_path: asset_path.to_path_buf(),
        gain: note.velocity as f64 / 127.0,
        track_name: track.name.clone(),
        pitch,
        duration,
    }
}

impl PlaybackEvent {
    fn with_energy(mut self, section: &Section) -> PlaybackEvent {
        self.gain = (self.gain * section.energy).min(1.0);
        self
    }
}

/// Resolves and remembers the sample for each track, warning once per missing track.
struct TrackSamples<'a> {
    resolver: &'a SampleResolver,
    resolved: HashMap<String, Option<PathBuf>>,
}

impl<'a> TrackSamples<'a> {
    fn new(resolver: &'a SampleResolver) -> TrackSamples<'a> {
        TrackSamples {
            resolver,
            resolved: HashMap::new(),
        }
    }

    fn get(&mut self, track: &Track) -> Option<PathBuf> {
        self.resolved
            .entry(track.name.clone())
            .or_insert_with(|| {
                let resolved = self.resolver.resolve(&track.name, track.kind());
                if resolved.is_none() {
                    warn!(
                        track = track.name,
                        dir = ?self.resolver.dir(),
                        "No sample found for track, skipping its events"
                    );
                }
                resolved
            })
            .clone()
    }
}
