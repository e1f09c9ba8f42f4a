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
//! Input documents for a render: the pattern, the mix configuration and the
//! sample metadata.

pub mod error;
pub mod mix;
pub mod pattern;
pub mod presets;
pub mod samples;

pub use error::ConfigError;
pub use mix::{
    CompressorConfig, MasterConfig, MixConfig, MixSource, SendConfig, SidechainConfig,
    TrackConfig,
};
pub use pattern::{NoteEvent, Pattern, Section, TimeSignature, Track, TrackKind};
pub use samples::{InstrumentMetadata, SamplesMetadata};
