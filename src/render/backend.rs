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
use std::{fmt, path::PathBuf, sync::Arc};

use async_trait::async_trait;

use super::{error::RenderError, ffmpeg, format::OutputFormat, mock};
use crate::graph::Graph;

/// A single backend invocation: execute the graph and write its output to a file.
#[derive(Clone, Debug)]
pub struct RenderJob {
    pub graph: Graph,
    pub output: PathBuf,
    pub format: OutputFormat,
    /// Length of the output in seconds.
    pub duration: f64,
}

/// Executes processing graphs. Implementations serialize the graph into whatever their
/// engine understands.
#[async_trait]
pub trait Backend: fmt::Display + Send + Sync {
    /// Verifies the backend can run at all. Called before any work is done.
    async fn check(&self) -> Result<(), RenderError>;

    /// Executes the job. On failure the output file must not be considered valid.
    async fn execute(&self, job: &RenderJob) -> Result<(), RenderError>;
}

/// Gets a backend by name. Names starting with "mock" give the mock backend, anything
/// else is treated as the path to an ffmpeg binary.
pub fn get_backend(name: &str) -> Arc<dyn Backend> {
    if name.starts_with("mock") {
        return Arc::new(mock::Backend::get(name));
    }

    Arc::new(ffmpeg::Backend::new(name))
}
