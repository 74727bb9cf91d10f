//! GEOID building blocks.
//!
//! A block-group GEOID is the fixed-width concatenation
//! `state(2) + county(3) + tract(6) + block group(1)`, always 12 digits.

use std::fmt;

use serde::Serialize;

/// One level of the block-group geography hierarchy, in GEOID order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    State,
    County,
    Tract,
    BlockGroup,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::State, Level::County, Level::Tract, Level::BlockGroup];

    /// Name used by the Census API (`for=` / `in=` predicates and label segments).
    pub fn api_name(self) -> &'static str {
        match self {
            Level::State => "state",
            Level::County => "county",
            Level::Tract => "tract",
            Level::BlockGroup => "block group",
        }
    }

    /// Output column header.
    pub fn column(self) -> &'static str {
        match self {
            Level::State => "STATE",
            Level::County => "COUNTY",
            Level::Tract => "TRACT",
            Level::BlockGroup => "BLOCK_GROUP",
        }
    }

    /// Number of digits this level contributes to the GEOID.
    pub fn width(self) -> usize {
        match self {
            Level::State => 2,
            Level::County => 3,
            Level::Tract => 6,
            Level::BlockGroup => 1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Level::State => 0,
            Level::County => 1,
            Level::Tract => 2,
            Level::BlockGroup => 3,
        }
    }

    /// Case-insensitive lookup of a segment name (`"Block Group"` == `"block group"`).
    pub fn from_api_name(name: &str) -> Option<Level> {
        let name = name.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.api_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Why a label or code could not be turned into GEOID parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoidError {
    /// Label has no `level:code` segments at all.
    Empty,
    /// A segment is not of the form `level:code`.
    MalformedSegment(String),
    /// A segment names a level outside the block-group schema.
    UnknownLevel(String),
    /// A level appears more than once.
    DuplicateLevel(Level),
    /// Levels are not in `state > county > tract > block group` order.
    OutOfOrder { expected: Level, found: Level },
    /// Fewer than four levels were present.
    MissingLevel(Level),
    /// A code is not all digits of the level's width.
    BadCode { level: Level, code: String },
    /// The label declares a summary level other than block group (150).
    SummaryLevel(String),
    /// A bare GEOID is not 12 ASCII digits.
    BadGeoid(String),
}

impl fmt::Display for GeoidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoidError::Empty => write!(f, "no geography segments found"),
            GeoidError::MalformedSegment(seg) => {
                write!(f, "segment '{seg}' is not of the form `level:code`")
            }
            GeoidError::UnknownLevel(name) => write!(f, "unknown geography level '{name}'"),
            GeoidError::DuplicateLevel(level) => write!(f, "level `{level}` appears more than once"),
            GeoidError::OutOfOrder { expected, found } => {
                write!(f, "expected `{expected}` segment, found `{found}`")
            }
            GeoidError::MissingLevel(level) => write!(f, "missing `{level}` segment"),
            GeoidError::BadCode { level, code } => write!(
                f,
                "`{level}` code '{code}' must be exactly {} digits",
                level.width()
            ),
            GeoidError::SummaryLevel(code) => {
                write!(f, "summary level {code} is not block group (150)")
            }
            GeoidError::BadGeoid(raw) => write!(f, "GEOID '{raw}' must be {} digits", Geoid::LEN),
        }
    }
}

impl std::error::Error for GeoidError {}

/// The four hierarchical codes of a block group.
///
/// Only built through [`GeoidParts::from_codes`] or [`Geoid::parts`], so every
/// code always has its level's width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GeoidParts {
    state: String,
    county: String,
    tract: String,
    block_group: String,
}

impl GeoidParts {
    /// Build parts from structured codes, validating each width.
    pub fn from_codes(
        state: &str,
        county: &str,
        tract: &str,
        block_group: &str,
    ) -> Result<Self, GeoidError> {
        Ok(Self {
            state: check_code(Level::State, state)?,
            county: check_code(Level::County, county)?,
            tract: check_code(Level::Tract, tract)?,
            block_group: check_code(Level::BlockGroup, block_group)?,
        })
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn county(&self) -> &str {
        &self.county
    }

    pub fn tract(&self) -> &str {
        &self.tract
    }

    pub fn block_group(&self) -> &str {
        &self.block_group
    }

    pub fn get(&self, level: Level) -> &str {
        match level {
            Level::State => &self.state,
            Level::County => &self.county,
            Level::Tract => &self.tract,
            Level::BlockGroup => &self.block_group,
        }
    }

    pub fn geoid(&self) -> Geoid {
        Geoid(format!(
            "{}{}{}{}",
            self.state, self.county, self.tract, self.block_group
        ))
    }
}

pub(crate) fn check_code(level: Level, code: &str) -> Result<String, GeoidError> {
    let code = code.trim();
    if code.len() != level.width() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GeoidError::BadCode {
            level,
            code: code.to_string(),
        });
    }
    Ok(code.to_string())
}

/// A validated 12-digit block-group GEOID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Geoid(String);

impl Geoid {
    pub const LEN: usize = 12;

    pub fn parse(raw: &str) -> Result<Self, GeoidError> {
        let raw = raw.trim();
        if raw.len() != Self::LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GeoidError::BadGeoid(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into its fixed-width parts.
    pub fn parts(&self) -> GeoidParts {
        // Length and ASCII-ness are guaranteed by construction.
        let s = self.0.as_str();
        GeoidParts {
            state: s[0..2].to_string(),
            county: s[2..5].to_string(),
            tract: s[5..11].to_string(),
            block_group: s[11..12].to_string(),
        }
    }
}

impl fmt::Display for Geoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
