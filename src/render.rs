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
//! Executes compiled graphs.
//!
//! The core only produces backend-agnostic graphs. A [`Backend`] turns a graph into an
//! audio file: the ffmpeg backend runs an ffmpeg subprocess and the mock backend records
//! jobs for tests. The [`Renderer`] drives the whole pipeline for a pattern, including
//! stems.

mod backend;
pub mod error;
mod executor;
pub mod ffmpeg;
mod format;
pub mod mock;

pub use backend::{get_backend, Backend, RenderJob};
pub use error::RenderError;
pub use executor::{RenderReport, Renderer};
pub use format::{BitDepth, OutputFormat};
