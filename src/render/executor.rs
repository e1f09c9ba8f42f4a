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
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Serialize;
use tracing::{info, span, warn, Instrument, Level};

use super::{
    backend::{Backend, RenderJob},
    error::RenderError,
    format::OutputFormat,
};
use crate::config::{MixConfig, Pattern};
use crate::graph;
use crate::pitch::RenderSession;
use crate::samples::SampleResolver;
use crate::timeline::{PlaybackEvent, Timeline};

/// The result of a successful render.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub path: PathBuf,
    /// Length of the rendered file in seconds.
    pub duration: f64,
    pub event_count: usize,
}

/// Runs the whole pipeline for a pattern: timeline, pitched samples, mix graph and the
/// backend invocation.
pub struct Renderer {
    backend: Arc<dyn Backend>,
    format: OutputFormat,
}

impl Renderer {
    pub fn new(backend: Arc<dyn Backend>, format: OutputFormat) -> Renderer {
        Renderer { backend, format }
    }

    /// Renders the full mix of the pattern to `output`.
    pub async fn render(
        &self,
        session: &RenderSession,
        pattern: &Pattern,
        resolver: &SampleResolver,
        mix: Option<&MixConfig>,
        output: &Path,
    ) -> Result<RenderReport, RenderError> {
        self.backend.check().await?;
        self.render_checked(session, pattern, resolver, mix, output)
            .instrument(span!(Level::INFO, "render mix"))
            .await
    }

    /// Renders one file per track into `dir`, named after the track. Each stem is the
    /// pattern restricted to that track, active in every section. Tracks that produce
    /// no events are skipped. Names that collide once sanitized get a numeric suffix.
    pub async fn render_stems(
        &self,
        session: &RenderSession,
        pattern: &Pattern,
        resolver: &SampleResolver,
        mix: Option<&MixConfig>,
        dir: &Path,
    ) -> Result<Vec<RenderReport>, RenderError> {
        self.backend.check().await?;

        let mut reports = Vec::new();
        let mut used = HashSet::new();
        for track in pattern.tracks.iter() {
            let Some(stem) = pattern.isolate(&track.name) else {
                continue;
            };
            let output = dir.join(format!("{}.wav", unique_file_name(&track.name, &mut used)));
            let result = self
                .render_checked(session, &stem, resolver, mix, &output)
                .instrument(span!(Level::INFO, "render stem", track = track.name))
                .await;
            match result {
                Ok(report) => reports.push(report),
                Err(RenderError::NoEvents) => {
                    warn!(track = track.name, "Stem has no events, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        if reports.is_empty() {
            return Err(RenderError::NoEvents);
        }
        Ok(reports)
    }

    async fn render_checked(
        &self,
        session: &RenderSession,
        pattern: &Pattern,
        resolver: &SampleResolver,
        mix: Option<&MixConfig>,
        output: &Path,
    ) -> Result<RenderReport, RenderError> {
        let timeline = Timeline::build(pattern, resolver)?;
        let events = self.pitch_events(session, resolver, timeline.events).await?;
        let graph = graph::compile(&events, timeline.total_duration, mix);

        info!(
            backend = %self.backend,
            output = ?output,
            events = events.len(),
            duration = timeline.total_duration,
            "Rendering"
        );
        let job = RenderJob {
            graph,
            output: output.to_path_buf(),
            format: self.format,
            duration: timeline.total_duration,
        };
        self.backend.execute(&job).await?;

        Ok(RenderReport {
            path: job.output,
            duration: timeline.total_duration,
            event_count: events.len(),
        })
    }

    /// Swaps the sample of every pitched event for a render at the event's pitch.
    async fn pitch_events(
        &self,
        session: &RenderSession,
        resolver: &SampleResolver,
        events: Vec<PlaybackEvent>,
    ) -> Result<Vec<PlaybackEvent>, RenderError> {
        let mut pitched = Vec::with_capacity(events.len());
        for mut event in events {
            if let (Some(pitch), Some(duration)) = (event.pitch, event.duration) {
                let reference_pitch = resolver.metadata().reference_pitch(&event.track_name);
                event.asset_path = session
                    .render_pitched(
                        self.backend.as_ref(),
                        &event.asset_path,
                        reference_pitch,
                        pitch,
                        duration,
                        &self.format,
                    )
                    .await?;
            }
            pitched.push(event);
        }
        Ok(pitched)
    }
}

/// Makes a track name safe to use as a file name.
fn file_name(track_name: &str) -> String {
    let name: String = track_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        "track".to_string()
    } else {
        name
    }
}

/// Like `file_name`, but never returns a name already in `used`. Comparison ignores
/// case so stems don't clobber each other on case-insensitive filesystems.
fn unique_file_name(track_name: &str, used: &mut HashSet<String>) -> String {
    let base = file_name(track_name);
    let mut name = base.clone();
    let mut suffix = 2;
    while !used.insert(name.to_lowercase()) {
        name = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    if name != base {
        warn!(track = track_name, file = name, "Stem file name already taken, renaming");
    }
    name
}
