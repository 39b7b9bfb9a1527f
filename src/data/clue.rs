// src/data/clue.rs

//! A [`Clue`] is one concrete [`Pattern`] match extracted from one log line.
//!
//! [`Pattern`]: crate::data::pattern::Pattern

use crate::common::{FileOffset, LineSource};
use crate::data::pattern::{GroupIndex, PatternName};
use crate::data::value::{Value, Values};

use std::collections::BTreeMap;
use std::fmt;

use ::serde::{Deserialize, Serialize};

/// A matched line with its typed group values and where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Clue {
    /// Converted capture group values, index 0 is group 1.
    pub values: Values,
    pub raw_line: String,
    /// Offset of the first byte of the line.
    pub byte_offset: FileOffset,
    pub source: LineSource,
}

/// Collected clues keyed by the name of the pattern that produced them.
pub type CluesByPattern = BTreeMap<PatternName, Vec<Clue>>;

impl Clue {
    pub fn new(
        values: Values,
        raw_line: &str,
        byte_offset: FileOffset,
        source: LineSource,
    ) -> Clue {
        Clue {
            values,
            raw_line: String::from(raw_line),
            byte_offset,
            source,
        }
    }

    /// The value of the 1-based capture group `group_index`.
    #[inline(always)]
    pub fn value(
        &self,
        group_index: GroupIndex,
    ) -> Option<&Value> {
        match group_index {
            0 => None,
            _ => self.values.get(group_index - 1),
        }
    }
}

impl fmt::Display for Clue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}: {:?}", self.source, self.byte_offset, self.raw_line)
    }
}

/// The log line whose causes are investigated, as supplied by the caller.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EffectObservation {
    /// Offset of the first byte of the line.
    pub byte_offset: FileOffset,
    pub line_content: String,
    pub source: LineSource,
}

impl EffectObservation {
    pub fn new(
        byte_offset: FileOffset,
        line_content: &str,
        source: LineSource,
    ) -> EffectObservation {
        EffectObservation {
            byte_offset,
            line_content: String::from(line_content),
            source,
        }
    }
}
