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
//! Level conversions.

/// The floor used for silence instead of negative infinity.
pub const SILENCE_DB: f64 = -60.0;

/// Converts a linear gain to dB. Gains at or below zero map to the silence floor and
/// gains at or above unity map to 0 dB.
pub fn gain_to_db(gain: f64) -> f64 {
    if gain.is_nan() || gain <= 0.0 {
        SILENCE_DB
    } else if gain >= 1.0 {
        0.0
    } else {
        (20.0 * gain.log10()).max(SILENCE_DB)
    }
}

/// Converts a wet/dry ratio to dB, using the same floor as [`gain_to_db`].
pub fn ratio_to_db(ratio: f64) -> f64 {
    gain_to_db(ratio)
}

/// Converts dB to a linear amplitude factor.
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_to_db_bounds() {
        assert_eq!(gain_to_db(1.0), 0.0);
        assert_eq!(gain_to_db(1.5), 0.0);
        assert_eq!(gain_to_db(0.0), -60.0);
        assert_eq!(gain_to_db(-0.5), -60.0);
        assert_eq!(gain_to_db(f64::NAN), -60.0);
        assert_eq!(gain_to_db(1e-9), -60.0);
        assert!((gain_to_db(0.5) - (-6.0206)).abs() < 1e-3);
    }

    #[test]
    fn test_gain_to_db_is_monotonic() {
        let mut previous = gain_to_db(0.0);
        for i in 1..=1000 {
            let db = gain_to_db(i as f64 / 1000.0);
            assert!(db >= previous, "gain_to_db decreased at {}", i);
            previous = db;
        }
    }

    #[test]
    fn test_ratio_to_db() {
        assert_eq!(ratio_to_db(0.0), -60.0);
        assert_eq!(ratio_to_db(1.0), 0.0);
        assert!((ratio_to_db(0.1) - (-20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_db_to_linear() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-12);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-12);
        assert!((db_to_linear(gain_to_db(0.25)) - 0.25).abs() < 1e-12);
    }
}
