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

/// Typed error for configuration load/parse failures so callers can distinguish
/// a bad preset name from an unreadable file without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown mix preset '{name}' (available presets: {})", available.join(", "))]
    UnknownPreset {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("mix config {path} could not be loaded: {source}; available presets: {}", available.join(", "))]
    MixFile {
        path: PathBuf,
        available: Vec<&'static str>,
        #[source]
        source: config::ConfigError,
    },

    #[error("error reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}
