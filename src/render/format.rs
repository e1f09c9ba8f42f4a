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
use std::{fmt, str::FromStr};

use super::error::RenderError;

/// PCM bit depth of a rendered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    #[default]
    Sixteen,
    TwentyFour,
}

impl BitDepth {
    /// Gets the number of bits per sample.
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
        }
    }

    /// Gets the little-endian signed PCM codec name for this depth.
    pub fn pcm_codec(self) -> &'static str {
        match self {
            BitDepth::Sixteen => "pcm_s16le",
            BitDepth::TwentyFour => "pcm_s24le",
        }
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = RenderError;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        match bits {
            16 => Ok(BitDepth::Sixteen),
            24 => Ok(BitDepth::TwentyFour),
            _ => Err(RenderError::Format(format!(
                "unsupported bit depth: {} (expected 16 or 24)",
                bits
            ))),
        }
    }
}

impl FromStr for BitDepth {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits = s
            .trim()
            .parse::<u16>()
            .map_err(|_| RenderError::Format(format!("unsupported bit depth: {}", s)))?;
        BitDepth::try_from(bits)
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// The format of every file a render writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    pub bit_depth: BitDepth,
}

impl OutputFormat {
    /// Creates a new OutputFormat
    pub fn new(sample_rate: u32, bit_depth: BitDepth) -> Result<Self, RenderError> {
        if sample_rate == 0 {
            return Err(RenderError::Format(
                "sample rate must be greater than 0".to_string(),
            ));
        }

        Ok(OutputFormat {
            sample_rate,
            bit_depth,
        })
    }
}

impl Default for OutputFormat {
    /// 44.1kHz, 16-bit
    fn default() -> Self {
        OutputFormat {
            sample_rate: 44100,
            bit_depth: BitDepth::Sixteen,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz {}", self.sample_rate, self.bit_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_depth_from_str() {
        assert_eq!(BitDepth::from_str("16").unwrap(), BitDepth::Sixteen);
        assert_eq!(BitDepth::from_str(" 24 ").unwrap(), BitDepth::TwentyFour);
    }

    #[test]
    fn test_bit_depth_from_str_invalid() {
        assert!(BitDepth::from_str("32").is_err());
        assert!(BitDepth::from_str("").is_err());
        assert!(BitDepth::from_str("float").is_err());
    }

    #[test]
    fn test_bit_depth_codec() {
        assert_eq!(BitDepth::Sixteen.pcm_codec(), "pcm_s16le");
        assert_eq!(BitDepth::TwentyFour.pcm_codec(), "pcm_s24le");
        assert_eq!(format!("{}", BitDepth::TwentyFour), "24-bit");
    }

    #[test]
    fn test_output_format_new() {
        let format = OutputFormat::new(48000, BitDepth::TwentyFour).unwrap();
        assert_eq!(format.sample_rate, 48000);
        assert_eq!(format.bit_depth, BitDepth::TwentyFour);

        assert!(matches!(
            OutputFormat::new(0, BitDepth::Sixteen),
            Err(RenderError::Format(_))
        ));
    }

    #[test]
    fn test_output_format_default() {
        let format = OutputFormat::default();
        assert_eq!(format.sample_rate, 44100);
        assert_eq!(format.bit_depth, BitDepth::Sixteen);
        assert_eq!(format.to_string(), "44100 Hz 16-bit");
    }
}
