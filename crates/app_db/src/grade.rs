//! Grade codes as persisted and exchanged

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A letter grade assigned to an image. Absence of a grade means unrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "a")]
    A,
    #[serde(rename = "b")]
    B,
    #[serde(rename = "c")]
    C,
    #[serde(rename = "d")]
    D,
    #[serde(rename = "f")]
    F,
}

impl Grade {
    /// All grades in display order
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    /// Persisted code ("a".."f")
    pub fn code(self) -> &'static str {
        match self {
            Grade::A => "a",
            Grade::B => "b",
            Grade::C => "c",
            Grade::D => "d",
            Grade::F => "f",
        }
    }

    /// Display label ("A".."F")
    pub fn label(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// Parse a persisted code. Only the exact lowercase codes are valid.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "a" => Some(Grade::A),
            "b" => Some(Grade::B),
            "c" => Some(Grade::C),
            "d" => Some(Grade::D),
            "f" => Some(Grade::F),
            _ => None,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lenient parse for user input: accepts either case
impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::from_code(&s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("invalid grade '{}': expected one of a, b, c, d, f", s))
    }
}
