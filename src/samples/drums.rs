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
//! General MIDI percussion names used to find drum samples on disk.

/// Percussion MIDI notes and their canonical sample names.
pub const DRUM_NOTES: &[(u8, &str)] = &[
    (36, "kick"),
    (37, "rimshot"),
    (38, "snare"),
    (39, "clap"),
    (42, "hihat"),
    (44, "pedal-hihat"),
    (46, "hihat-open"),
    (49, "crash"),
    (51, "ride"),
    (56, "cowbell"),
    (75, "clave"),
];

/// Alternative track names that refer to a canonical drum.
const ALIASES: &[(&str, &str)] = &[
    ("bd", "kick"),
    ("bass-drum", "kick"),
    ("kick-drum", "kick"),
    ("sd", "snare"),
    ("snare-drum", "snare"),
    ("rim", "rimshot"),
    ("handclap", "clap"),
    ("hh", "hihat"),
    ("hat", "hihat"),
    ("hi-hat", "hihat"),
    ("closed-hihat", "hihat"),
    ("closed-hat", "hihat"),
    ("oh", "hihat-open"),
    ("open-hat", "hihat-open"),
    ("open-hihat", "hihat-open"),
    ("hihat-closed", "hihat"),
    ("pedal-hat", "pedal-hihat"),
    ("cymbal", "crash"),
];

/// Normalizes a track name for lookup: lower case with hyphens as separators.
pub fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '_' | ' ' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Looks up the canonical drum for a track name. Returns the MIDI note and the
/// canonical name.
pub fn standard_drum(track_name: &str) -> Option<(u8, &'static str)> {
    let normalized = normalize(track_name);
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(normalized.as_str());

    DRUM_NOTES
        .iter()
        .find(|(_, name)| *name == canonical)
        .map(|(note, name)| (*note, *name))
}

/// Looks up the canonical drum name for a MIDI note.
pub fn drum_for_note(note: u8) -> Option<&'static str> {
    DRUM_NOTES
        .iter()
        .find(|(drum_note, _)| *drum_note == note)
        .map(|(_, name)| *name)
}
