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
//! Sample lookup.
//!
//! This module provides:
//! - The General MIDI percussion name table
//! - Ordered, pure candidate-name rules for drum and pitched tracks
//! - A directory-backed resolver that evaluates the rules against the files on disk

mod candidates;
mod drums;
mod resolver;

pub use candidates::{candidates, Candidate, Rule, DRUM_RULES, PITCHED_RULES};
pub use drums::{drum_for_note, standard_drum, DRUM_NOTES};
pub use resolver::{
    SampleKind, SampleResolver, ScannedSample, VariantPolicy, AUDIO_EXTENSIONS,
};
