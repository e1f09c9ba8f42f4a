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
use std::path::PathBuf;

use crate::config::ConfigError;

/// Errors that abort a render.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("no events to render")]
    NoEvents,

    #[error("invalid render graph: {0}")]
    InvalidGraph(String),

    #[error("render backend failed writing {path}: {diagnostic}")]
    Backend { path: PathBuf, diagnostic: String },

    #[error("pitch render of {source_path} failed: {diagnostic}")]
    PitchRender {
        source_path: PathBuf,
        diagnostic: String,
    },

    #[error("unsupported output format: {0}")]
    Format(String),

    #[error("error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
