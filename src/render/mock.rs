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
use std::{fmt, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::fs;
use tracing::{info, span, Instrument, Level};

use super::{backend::RenderJob, error::RenderError};

/// A mock backend. Doesn't actually render anything: every job is recorded and an empty
/// file is written to its output path.
///
/// Names containing "unavailable" fail the pre-flight check, names containing "fail"
/// fail every job.
#[derive(Clone)]
pub struct Backend {
    name: String,
    jobs: Arc<Mutex<Vec<RenderJob>>>,
}

impl Backend {
    /// Gets the given mock backend.
    pub fn get(name: &str) -> Backend {
        Backend {
            name: name.to_string(),
            jobs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Gets every job executed so far, in order.
    pub fn jobs(&self) -> Vec<RenderJob> {
        self.jobs.lock().clone()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mock)", self.name)
    }
}

#[async_trait]
impl super::Backend for Backend {
    async fn check(&self) -> Result<(), RenderError> {
        if self.name.contains("unavailable") {
            return Err(RenderError::BackendUnavailable(self.to_string()));
        }
        Ok(())
    }

    async fn execute(&self, job: &RenderJob) -> Result<(), RenderError> {
        let span = span!(Level::INFO, "render (mock)");
        async {
            job.graph.check().map_err(RenderError::InvalidGraph)?;
            info!(
                backend = self.name,
                output = ?job.output,
                assets = job.graph.assets().len(),
                nodes = job.graph.nodes().len(),
                duration = job.duration,
                "Rendering."
            );
            self.jobs.lock().push(job.clone());

            if self.name.contains("fail") {
                return Err(RenderError::Backend {
                    path: job.output.clone(),
                    diagnostic: "mock failure".to_string(),
                });
            }

            if let Some(parent) = job.output.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| RenderError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            fs::write(&job.output, b"")
                .await
                .map_err(|source| RenderError::Io {
                    path: job.output.clone(),
                    source,
                })
        }
        .instrument(span)
        .await
    }
}
