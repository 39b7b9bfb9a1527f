// src/data/pattern.rs

//! Implements [`Pattern`], a named regular expression with typed capture
//! groups, and [`PatternDef`], its serializable form.
//!
//! Capture groups are addressed by 1-based [`GroupIndex`], the same numbering
//! the regular expression uses. A `Pattern` matches a line only at the
//! line's first byte; it need not consume the whole line.

use crate::data::value::{ScalarType, Value, Values};
#[allow(unused_imports)]
use crate::debug::printers::{de_err, de_wrn};
use crate::error::{Error, Result};

use std::collections::BTreeMap;
use std::fmt;

use ::regex::Regex;
use ::serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// 1-based index of a capture group.
pub type GroupIndex = usize;

/// Name of a [`Pattern`]; unique within a `RuleBase`.
pub type PatternName = String;

/// Declared [`ScalarType`] per capture group. Undeclared groups are
/// [`ScalarType::String`].
pub type CaptureTypes = BTreeMap<GroupIndex, ScalarType>;

/// Wrap a regex so it only matches at the start of the text.
pub(crate) fn regex_anchored(regex: &str) -> String {
    format!(r"\A(?:{})", regex)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PatternDef
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Serializable definition of a [`Pattern`].
///
/// Loading and saving `PatternDef` files is done elsewhere; this crate only
/// converts between `PatternDef` and [`Pattern`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PatternDef {
    pub name: PatternName,
    pub regex: String,
    /// group index → scalar type name (`string`, `int`, `float`, `date`)
    #[serde(default)]
    pub capture_types: BTreeMap<GroupIndex, String>,
    #[serde(default)]
    pub primary_key_groups: Vec<GroupIndex>,
    pub log_type: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pattern
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A named regular expression with typed capture groups and a primary key.
///
/// Immutable once created.
#[derive(Clone)]
pub struct Pattern {
    name: PatternName,
    /// The regular expression as written.
    regex_str: String,
    /// `regex_str` anchored to the start of the line.
    regex: Regex,
    /// Count of capture groups in `regex_str`.
    group_count: usize,
    capture_types: CaptureTypes,
    primary_key_groups: Vec<GroupIndex>,
    log_type: String,
}

impl fmt::Debug for Pattern {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name)
            .field("regex", &self.regex_str)
            .field("group_count", &self.group_count)
            .field("capture_types", &self.capture_types)
            .field("primary_key_groups", &self.primary_key_groups)
            .field("log_type", &self.log_type)
            .finish()
    }
}

impl PartialEq for Pattern {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.name == other.name
            && self.regex_str == other.regex_str
            && self.capture_types == other.capture_types
            && self.primary_key_groups == other.primary_key_groups
            && self.log_type == other.log_type
    }
}

impl Eq for Pattern {}

impl Pattern {
    /// Create a new `Pattern`.
    ///
    /// Fails with [`Error::InvalidRegex`] if `regex` does not compile, and
    /// with [`Error::InvalidPrimaryKey`] if a primary key group or a typed
    /// group is not a capture group of `regex`.
    pub fn new(
        name: &str,
        regex: &str,
        capture_types: CaptureTypes,
        primary_key_groups: Vec<GroupIndex>,
        log_type: &str,
    ) -> Result<Pattern> {
        defn!("({:?}, {:?})", name, regex);
        // compile the bare regex first; a fragment like `a)|(b` only
        // compiles once wrapped
        let regex_bare = match Regex::new(regex) {
            Ok(val) => val,
            Err(source) => {
                defx!("bad regex {:?}", regex);
                return Err(Error::InvalidRegex { name: String::from(name), source });
            }
        };
        let group_count: usize = regex_bare.captures_len() - 1;
        let regex_a = match Regex::new(&regex_anchored(regex)) {
            Ok(val) => val,
            Err(source) => {
                defx!("bad anchored regex {:?}", regex);
                return Err(Error::InvalidRegex { name: String::from(name), source });
            }
        };
        for group_index in primary_key_groups
            .iter()
            .chain(capture_types.keys())
        {
            if *group_index == 0 || *group_index > group_count {
                defx!("bad group index {}", group_index);
                return Err(Error::InvalidPrimaryKey {
                    name: String::from(name),
                    group_index: *group_index,
                    group_count,
                });
            }
        }
        defx!("group_count {}", group_count);

        Ok(Pattern {
            name: PatternName::from(name),
            regex_str: String::from(regex),
            regex: regex_a,
            group_count,
            capture_types,
            primary_key_groups,
            log_type: String::from(log_type),
        })
    }

    /// Create a `Pattern` from its serializable definition.
    ///
    /// An unknown scalar type name is [`Error::UnsupportedConverter`].
    pub fn from_def(def: &PatternDef) -> Result<Pattern> {
        let mut capture_types = CaptureTypes::new();
        for (group_index, type_name) in def.capture_types.iter() {
            capture_types.insert(*group_index, type_name.parse::<ScalarType>()?);
        }

        Pattern::new(
            &def.name,
            &def.regex,
            capture_types,
            def.primary_key_groups.clone(),
            &def.log_type,
        )
    }

    pub fn to_def(&self) -> PatternDef {
        PatternDef {
            name: self.name.clone(),
            regex: self.regex_str.clone(),
            capture_types: self
                .capture_types
                .iter()
                .map(|(group_index, scalar_type)| (*group_index, String::from(scalar_type.as_str())))
                .collect(),
            primary_key_groups: self.primary_key_groups.clone(),
            log_type: self.log_type.clone(),
        }
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The regular expression as written, not anchored.
    #[inline(always)]
    pub fn regex_str(&self) -> &str {
        &self.regex_str
    }

    #[inline(always)]
    pub fn log_type(&self) -> &str {
        &self.log_type
    }

    #[inline(always)]
    pub const fn group_count(&self) -> usize {
        self.group_count
    }

    #[inline(always)]
    pub const fn capture_types(&self) -> &CaptureTypes {
        &self.capture_types
    }

    #[inline(always)]
    pub fn primary_key_groups(&self) -> &[GroupIndex] {
        &self.primary_key_groups
    }

    /// Declared type of group at `group_index`.
    pub fn scalar_type(
        &self,
        group_index: GroupIndex,
    ) -> ScalarType {
        self.capture_types
            .get(&group_index)
            .copied()
            .unwrap_or_default()
    }

    /// Is `group_index` a capture group of this pattern?
    #[inline(always)]
    pub const fn has_group(
        &self,
        group_index: GroupIndex,
    ) -> bool {
        group_index >= 1 && group_index <= self.group_count
    }

    /// Convert the texts of all capture groups, in group order, to typed
    /// [`Values`]. A group that did not participate is [`Value::Null`].
    ///
    /// The first text that fails conversion is an [`Error::Conversion`].
    pub fn convert_groups<'a, I>(
        &self,
        texts: I,
    ) -> Result<Values>
    where
        I: Iterator<Item = Option<&'a str>>,
    {
        let mut values = Values::with_capacity(self.group_count);
        for (index, text) in texts.enumerate() {
            let group_index: GroupIndex = index + 1;
            let text = match text {
                Some(val) => val,
                None => {
                    values.push(Value::Null);
                    continue;
                }
            };
            let scalar_type = self.scalar_type(group_index);
            match scalar_type.convert(text) {
                Some(value) => values.push(value),
                None => {
                    defñ!("pattern {:?} group {} failed convert {:?} to {}", self.name, group_index, text, scalar_type);
                    return Err(Error::Conversion {
                        pattern: self.name.clone(),
                        group_index,
                        text: String::from(text),
                        scalar_type: scalar_type.as_str(),
                    });
                }
            }
        }
        debug_assert_eq!(values.len(), self.group_count, "pattern {:?} converted wrong count of groups", self.name);

        Ok(values)
    }

    /// Match this one pattern against `line`.
    ///
    /// `None` is no match. `Some(Err)` is a match whose groups failed
    /// conversion.
    pub fn match_line(
        &self,
        line: &str,
    ) -> Option<Result<Values>> {
        let captures = self.regex.captures(line)?;
        Some(self.convert_groups(
            (1..=self.group_count).map(|group_index| captures.get(group_index).map(|m| m.as_str())),
        ))
    }

    /// The values at the primary key groups, in primary key order.
    pub fn primary_key_values<'a>(
        &self,
        values: &'a Values,
    ) -> Vec<&'a Value> {
        self.primary_key_groups
            .iter()
            .filter_map(|group_index| values.get(group_index - 1))
            .collect()
    }
}
