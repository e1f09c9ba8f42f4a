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
use std::{error::Error, fs, path::Path};

use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::TempDir;

use crate::config::Pattern;

/// Creates a temporary samples directory containing the given files. WAV files get a
/// short real signal, any other file is left empty.
pub fn sample_dir(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().expect("unable to create samples directory");
    for file in files {
        let path = dir.path().join(file);
        let is_wav = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if is_wav {
            write_wav(&path, &ramp(441), 44100).expect("unable to write wav");
        } else {
            fs::write(&path, b"").expect("unable to write sample");
        }
    }
    dir
}

/// Parses and validates a pattern document.
pub fn pattern_from_json(json: &str) -> Pattern {
    let pattern: Pattern = serde_json::from_str(json).expect("invalid pattern json");
    pattern.validate().expect("invalid pattern");
    pattern
}

/// Writes mono 16-bit samples to a wav file.
pub fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) -> Result<(), Box<dyn Error>> {
    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        },
    )?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// A rising ramp of the given length.
fn ramp(len: usize) -> Vec<i16> {
    (0..len)
        .map(|i| ((i * i16::MAX as usize) / len.max(1)) as i16)
        .collect()
}
