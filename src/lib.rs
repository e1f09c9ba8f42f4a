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
//! Renders step-sequenced patterns into mixed audio files.
//!
//! A render resolves a sample for every track, lays the pattern's notes out on an
//! absolute timeline, renders pitched notes through a session cache, compiles the events
//! and the mix configuration into a processing graph and hands that graph to a backend.

pub mod config;
pub mod graph;
pub mod pitch;
pub mod render;
pub mod samples;
#[cfg(test)]
mod testutil;
pub mod timeline;
