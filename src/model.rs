use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TaskId = String;

pub const DEFAULT_TAG: &str = "general";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub rank: Rank,
    /// Raw timestamp as assigned by the store. Kept verbatim so unparsable
    /// values still round-trip.
    pub created_at: String,
}

/// Priority level, 0 (lowest) to 2 (highest).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rank(u8);

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("rank {0} out of range (expected 0..=2)")]
pub struct RankError(pub i64);

impl Rank {
    pub const MIN: Rank = Rank(0);
    pub const MAX: Rank = Rank(2);

    pub fn new(value: i64) -> Result<Self, RankError> {
        if (Self::MIN.0 as i64..=Self::MAX.0 as i64).contains(&value) {
            Ok(Rank(value as u8))
        } else {
            Err(RankError(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn raise(self) -> Self {
        Rank((self.0 + 1).min(Self::MAX.0))
    }

    pub fn lower(self) -> Self {
        Rank(self.0.saturating_sub(1))
    }
}

impl TryFrom<u8> for Rank {
    type Error = RankError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rank::new(value as i64)
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> u8 {
        rank.0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Candidate task content held by the edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub tag: String,
    pub rank: Rank,
}

impl Default for Draft {
    fn default() -> Self {
        Draft {
            text: String::new(),
            tag: default_tag(),
            rank: Rank::default(),
        }
    }
}

impl Draft {
    pub fn from_task(task: &Task) -> Self {
        Draft {
            text: task.text.clone(),
            tag: task.tag.clone(),
            rank: task.rank,
        }
        .normalized()
    }

    pub fn normalized(mut self) -> Self {
        if self.tag.is_empty() {
            self.tag = default_tag();
        }
        self
    }
}

pub fn is_submittable(draft: &Draft) -> bool {
    !draft.text.is_empty()
}

impl Task {
    pub fn created(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.created_at)
    }

    pub fn created_on(&self) -> Option<NaiveDate> {
        self.created().map(|dt| dt.date())
    }
}

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parses a stored timestamp into local wall-clock time.
///
/// Offset-carrying values are converted to the local zone; naive values are
/// taken as already local, and a bare date means local midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Display pair `(D/MM/YY, HH:mm)`, or `N/A` for both when unparsable.
pub fn format_created(raw: &str) -> (String, String) {
    match parse_timestamp(raw) {
        Some(dt) => (
            dt.format("%-d/%m/%y").to_string(),
            dt.format("%H:%M").to_string(),
        ),
        None => ("N/A".to_string(), "N/A".to_string()),
    }
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}
