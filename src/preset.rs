// ABOUTME: The four ordered popover size presets and their persisted string tokens
// ABOUTME: Index arithmetic here is what the resize gesture interpolates and snaps over

use crate::geometry::Size;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SizePreset {
    Small,
    SmallMid,
    #[default]
    Mid,
    Large,
}

impl SizePreset {
    /// All presets in increasing size order; position equals `index()`.
    pub const ALL: [SizePreset; 4] = [
        SizePreset::Small,
        SizePreset::SmallMid,
        SizePreset::Mid,
        SizePreset::Large,
    ];

    pub const MAX_INDEX: usize = 3;

    pub fn index(self) -> usize {
        match self {
            SizePreset::Small => 0,
            SizePreset::SmallMid => 1,
            SizePreset::Mid => 2,
            SizePreset::Large => 3,
        }
    }

    /// Out-of-range indices clamp to the nearest end.
    pub fn from_index(index: i64) -> Self {
        Self::ALL[index.clamp(0, Self::MAX_INDEX as i64) as usize]
    }

    pub fn content_size(self) -> Size {
        match self {
            SizePreset::Small => Size::new(360.0, 520.0),
            SizePreset::SmallMid => Size::new(390.0, 580.0),
            SizePreset::Mid => Size::new(420.0, 640.0),
            SizePreset::Large => Size::new(480.0, 740.0),
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            SizePreset::Small => "small",
            SizePreset::SmallMid => "smallMid",
            SizePreset::Mid => "mid",
            SizePreset::Large => "large",
        }
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPreset(pub String);

impl fmt::Display for UnknownPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown size preset token: {:?}", self.0)
    }
}

impl std::error::Error for UnknownPreset {}

impl FromStr for SizePreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.token() == s)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
