//! Outcome model: the drawn number and the color side it maps to.
//!
//! Numbers 1–36 are split into two fixed 18-element sets using the
//! European wheel layout. Zero is not part of the draw.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{SpinmatchError, constants};

/// The two sides a stake can be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Red,
    Black,
}

impl Side {
    /// Both sides, in the order the full matching pass walks them.
    pub const ALL: [Side; 2] = [Side::Red, Side::Black];

    /// The side a stake on `self` is matched against.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Black => write!(f, "black"),
        }
    }
}

impl FromStr for Side {
    type Err = SpinmatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "black" => Ok(Self::Black),
            other => Err(SpinmatchError::InvalidSide(other.to_string())),
        }
    }
}

/// Numbers that land on red. Everything else in 1–36 is black.
pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// A drawn number in `[1, 36]`.
///
/// Construction goes through [`Outcome::new`], so every value in
/// circulation is in range and [`Outcome::side`] is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Outcome(u8);

impl Outcome {
    /// # Errors
    /// Returns `OutcomeOutOfRange` for 0 or anything above 36.
    pub fn new(number: u8) -> Result<Self, SpinmatchError> {
        if (constants::MIN_OUTCOME..=constants::MAX_OUTCOME).contains(&number) {
            Ok(Self(number))
        } else {
            Err(SpinmatchError::OutcomeOutOfRange(number))
        }
    }

    #[must_use]
    pub fn number(self) -> u8 {
        self.0
    }

    /// The color this number maps to.
    #[must_use]
    pub fn side(self) -> Side {
        if RED_NUMBERS.contains(&self.0) {
            Side::Red
        } else {
            Side::Black
        }
    }

    /// Whether a stake on `side` wins against this outcome.
    #[must_use]
    pub fn wins(self, side: Side) -> bool {
        self.side() == side
    }
}

impl TryFrom<u8> for Outcome {
    type Error = SpinmatchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Outcome> for u8 {
    fn from(value: Outcome) -> Self {
        value.0
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.side())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_total_and_disjoint() {
        let mut red = 0;
        let mut black = 0;
        for n in 1..=36 {
            match Outcome::new(n).unwrap().side() {
                Side::Red => red += 1,
                Side::Black => black += 1,
            }
        }
        assert_eq!(red, 18);
        assert_eq!(black, 18);
    }

    #[test]
    fn zero_and_above_36_rejected() {
        assert!(matches!(
            Outcome::new(0),
            Err(SpinmatchError::OutcomeOutOfRange(0))
        ));
        assert!(Outcome::new(37).is_err());
    }

    #[test]
    fn known_colors() {
        assert_eq!(Outcome::new(1).unwrap().side(), Side::Red);
        assert_eq!(Outcome::new(2).unwrap().side(), Side::Black);
        assert_eq!(Outcome::new(36).unwrap().side(), Side::Red);
        assert_eq!(Outcome::new(35).unwrap().side(), Side::Black);
    }

    #[test]
    fn opposite_is_an_involution() {
        for side in Side::ALL {
            assert_ne!(side, side.opposite());
            assert_eq!(side, side.opposite().opposite());
        }
    }

    #[test]
    fn side_parses_case_insensitively() {
        assert_eq!("RED".parse::<Side>().unwrap(), Side::Red);
        assert_eq!(" black ".parse::<Side>().unwrap(), Side::Black);
        assert!("green".parse::<Side>().is_err());
    }

    #[test]
    fn outcome_serde_rejects_out_of_range() {
        let ok: Outcome = serde_json::from_str("17").unwrap();
        assert_eq!(ok.number(), 17);
        assert!(serde_json::from_str::<Outcome>("0").is_err());
    }

    #[test]
    fn side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Black).unwrap(), "\"black\"");
    }
}
