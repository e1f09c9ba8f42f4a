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
//! Pitched sample rendering and the per-session render cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::graph::{Graph, NodeKind, OUTPUT_LABEL};
use crate::render::{Backend, OutputFormat, RenderError, RenderJob};

/// Gets the distance in semitones from the reference pitch to the target pitch.
pub fn semitone_offset(reference_pitch: u8, target_pitch: u8) -> i32 {
    target_pitch as i32 - reference_pitch as i32
}

/// Gets the playback rate factor that shifts a sample by the given number of semitones.
pub fn rate_factor(semitone_offset: i32) -> f64 {
    2f64.powf(semitone_offset as f64 / 12.0)
}

/// Builds the graph that pitches a single sample and fits it to `duration` seconds.
/// No rate change is applied when the offset is zero.
pub fn pitch_graph(source: &Path, semitone_offset: i32, duration: f64, sample_rate: u32) -> Graph {
    let mut graph = Graph::new();
    let mut port = graph.add_asset(source.to_path_buf());
    if semitone_offset != 0 {
        port = graph.push(
            NodeKind::RateShift {
                factor: rate_factor(semitone_offset),
                sample_rate,
            },
            vec![port],
            "shifted",
        );
    }
    graph.push(NodeKind::Fit { duration }, vec![port], OUTPUT_LABEL);
    graph
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    source: PathBuf,
    target_pitch: u8,
    /// Duration in whole microseconds.
    duration: u64,
}

#[derive(Default)]
struct SessionState {
    workspace: Option<TempDir>,
    cache: HashMap<CacheKey, PathBuf>,
    renders: usize,
}

/// Owns the pitched render cache and its temporary workspace for a batch of renders.
///
/// The workspace is created on the first cache miss. Pitched renders are serialized so
/// concurrent callers never race on a cache file. Call [`RenderSession::cleanup`] once
/// the batch is done; dropping the session also cleans up.
pub struct RenderSession {
    state: Mutex<SessionState>,
    render_lock: tokio::sync::Mutex<()>,
}

impl Default for RenderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSession {
    pub fn new() -> RenderSession {
        RenderSession {
            state: Mutex::new(SessionState::default()),
            render_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Renders `source`, recorded at `reference_pitch`, at `target_pitch` and exactly
    /// `duration` seconds long. Returns the path of the rendered file, which stays valid
    /// until cleanup.
    pub async fn render_pitched(
        &self,
        backend: &dyn Backend,
        source: &Path,
        reference_pitch: u8,
        target_pitch: u8,
        duration: f64,
        format: &OutputFormat,
    ) -> Result<PathBuf, RenderError> {
        let _render = self.render_lock.lock().await;

        let key = CacheKey {
            source: source.to_path_buf(),
            target_pitch,
            duration: (duration.max(0.0) * 1_000_000.0).round() as u64,
        };
        if let Some(path) = self.cached(&key) {
            debug!(source = ?source, target_pitch, path = ?path, "Using cached pitched sample");
            return Ok(path);
        }

        let output = self.reserve(&key)?;
        let offset = semitone_offset(reference_pitch, target_pitch);
        info!(
            source = ?source,
            reference_pitch,
            target_pitch,
            semitones = offset,
            duration,
            "Rendering pitched sample"
        );

        let job = RenderJob {
            graph: pitch_graph(source, offset, duration, format.sample_rate),
            output: output.clone(),
            format: *format,
            duration,
        };
        backend
            .execute(&job)
            .await
            .map_err(|e| RenderError::PitchRender {
                source_path: source.to_path_buf(),
                diagnostic: e.to_string(),
            })?;

        self.state.lock().cache.insert(key, output.clone());
        Ok(output)
    }

    /// Gets a cached render if its file still exists. Stale entries are dropped.
    fn cached(&self, key: &CacheKey) -> Option<PathBuf> {
        let mut state = self.state.lock();
        let path = state.cache.get(key)?.clone();
        if path.exists() {
            return Some(path);
        }
        debug!(path = ?path, "Cached pitched sample is gone, rendering again");
        state.cache.remove(key);
        None
    }

    /// Picks the output path for a new render, creating the workspace if needed.
    fn reserve(&self, key: &CacheKey) -> Result<PathBuf, RenderError> {
        let mut state = self.state.lock();
        let dir = match state.workspace.as_ref().map(|w| w.path().to_path_buf()) {
            Some(dir) => dir,
            None => {
                let workspace = tempfile::Builder::new()
                    .prefix("mixdown-pitch-")
                    .tempdir()
                    .map_err(|source| RenderError::Io {
                        path: std::env::temp_dir(),
                        source,
                    })?;
                let dir = workspace.path().to_path_buf();
                debug!(path = ?dir, "Created pitch workspace");
                state.workspace = Some(workspace);
                dir
            }
        };

        state.renders += 1;
        let stem = key
            .source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".to_string());
        Ok(dir.join(format!(
            "{}-p{}-{}.wav",
            stem, key.target_pitch, state.renders
        )))
    }

    /// Gets the number of cached renders.
    pub fn cached_len(&self) -> usize {
        self.state.lock().cache.len()
    }

    /// Gets the workspace directory, if one has been created.
    pub fn workspace(&self) -> Option<PathBuf> {
        self.state
            .lock()
            .workspace
            .as_ref()
            .map(|workspace| workspace.path().to_path_buf())
    }

    /// Clears the cache and removes the workspace. Safe to call any number of times.
    pub fn cleanup(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        if let Some(workspace) = state.workspace.take() {
            let path = workspace.path().to_path_buf();
            match workspace.close() {
                Ok(()) => debug!(path = ?path, "Removed pitch workspace"),
                Err(e) => warn!(path = ?path, err = %e, "Unable to remove pitch workspace"),
            }
        }
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}
