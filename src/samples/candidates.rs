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
//! Sample name candidates, generated in priority order from a track name.
//!
//! Each rule is a pure function of the track name. The resolver evaluates the
//! candidates in order and the first filesystem hit wins.

use super::drums::standard_drum;

/// A file name candidate, matched case-insensitively against file stems.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidate {
    /// The stem must equal this name.
    Exact(String),
    /// The stem must start with this prefix (a "<prefix>*" glob).
    Prefix(String),
    /// The stem must be "<name>-v<N>" for some variant number N.
    Variant(String),
}

/// A candidate generator.
pub type Rule = fn(&str) -> Vec<Candidate>;

/// Rules for percussion tracks, highest priority first.
pub const DRUM_RULES: &[Rule] = &[
    note_and_standard_name,
    note_and_raw_name,
    standard_name,
    raw_name,
    note_and_standard_name_with_descriptor,
    standard_name_with_descriptor,
];

/// Rules for pitched instrument tracks, highest priority first.
pub const PITCHED_RULES: &[Rule] = &[variant, bare_instrument];

/// Expands the rules into the ordered candidate list for a track.
pub fn candidates(rules: &[Rule], track_name: &str) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = Vec::new();
    for candidate in rules.iter().flat_map(|rule| rule(track_name)) {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// "36-kick"
fn note_and_standard_name(track_name: &str) -> Vec<Candidate> {
    standard_drum(track_name)
        .map(|(note, name)| vec![Candidate::Exact(format!("{}-{}", note, name))])
        .unwrap_or_default()
}

/// "36-BD"
fn note_and_raw_name(track_name: &str) -> Vec<Candidate> {
    standard_drum(track_name)
        .map(|(note, _)| vec![Candidate::Exact(format!("{}-{}", note, track_name))])
        .unwrap_or_default()
}

/// "kick"
fn standard_name(track_name: &str) -> Vec<Candidate> {
    standard_drum(track_name)
        .map(|(_, name)| vec![Candidate::Exact(name.to_string())])
        .unwrap_or_default()
}

/// "hihat_open" and "hihat-open"
fn raw_name(track_name: &str) -> Vec<Candidate> {
    let mut names = vec![Candidate::Exact(track_name.to_string())];
    let swapped = swap_separators(track_name);
    if swapped != track_name {
        names.push(Candidate::Exact(swapped));
    }
    names
}

/// "36-kick-*"
fn note_and_standard_name_with_descriptor(track_name: &str) -> Vec<Candidate> {
    standard_drum(track_name)
        .map(|(note, name)| vec![Candidate::Prefix(format!("{}-{}-", note, name))])
        .unwrap_or_default()
}

/// "kick-*"
fn standard_name_with_descriptor(track_name: &str) -> Vec<Candidate> {
    standard_drum(track_name)
        .map(|(_, name)| vec![Candidate::Prefix(format!("{}-", name))])
        .unwrap_or_default()
}

/// "bass-v2"
fn variant(track_name: &str) -> Vec<Candidate> {
    vec![Candidate::Variant(track_name.to_string())]
}

/// "bass"
fn bare_instrument(track_name: &str) -> Vec<Candidate> {
    vec![Candidate::Exact(track_name.to_string())]
}

/// Swaps underscores and hyphens.
fn swap_separators(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '_' => '-',
            '-' => '_',
            c => c,
        })
        .collect()
}
