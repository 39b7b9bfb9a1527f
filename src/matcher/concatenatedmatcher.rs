// src/matcher/concatenatedmatcher.rs

//! Implements [`ConcatenatedMatcher`], which matches all the [`Pattern`s] of
//! one log type against a line using two combined regular expressions.
//!
//! The patterns are joined into one alternation, each pattern wrapped in its
//! own capturing group, anchored at the start of the line:
//!
//! ```text
//! \A(?:(P0)|(P1)|…|(Pn))
//! ```
//!
//! The regex engine is leftmost-first so the `forward` alternation reports the
//! first pattern `Pi`, in canonical order, that matches. The `backward`
//! alternation lists the patterns in reverse order and so reports the last
//! pattern `Pj` that matches. Only the patterns strictly between `i` and `j`
//! need to be tested one at a time. For the common case of zero or one
//! matching pattern the line is scanned twice no matter how many patterns
//! the log type has.
//!
//! [`Pattern`s]: crate::data::pattern::Pattern

use crate::common::{FileOffset, LineSource};
use crate::data::clue::Clue;
use crate::data::pattern::{Pattern, PatternName};
use crate::data::value::Values;
#[allow(unused_imports)]
use crate::debug::printers::{de_err, de_wrn, str_to_String_noraw};
use crate::error::{Error, Result};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[allow(unused_imports)]
use ::more_asserts::{debug_assert_le, debug_assert_lt};
use ::regex::{Captures, Regex};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Thread-safe [Atomic Reference Counting Pointer] to a [`Pattern`].
///
/// [Atomic Reference Counting Pointer]: std::sync::Arc
pub type PatternP = Arc<Pattern>;

/// Canonical position of a [`Pattern`] within a [`ConcatenatedMatcher`].
pub type PatternIndex = usize;

/// Result of one pattern matching one line.
pub type PatternMatch = (PatternIndex, Result<Values>);

/// Clues found on one line keyed by pattern name, and the conversion
/// errors of patterns that matched but whose groups could not be converted.
pub type LineClues = (BTreeMap<PatternName, Clue>, Vec<Error>);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Alternation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One combined regex and the bookkeeping to find which alternative matched.
struct Alternation {
    regex: Regex,
    /// Canonical `PatternIndex` of each alternative, in alternation order.
    order: Vec<PatternIndex>,
    /// Capture group number of the wrapping group, indexed by `PatternIndex`.
    group_at: Vec<usize>,
}

impl Alternation {
    fn new(
        patterns: &[PatternP],
        order: Vec<PatternIndex>,
    ) -> std::result::Result<Alternation, ::regex::Error> {
        let mut regex_s = String::from(r"\A(?:");
        let mut group_at: Vec<usize> = vec![0; patterns.len()];
        let mut group_next: usize = 1;
        for (alt_index, pattern_index) in order.iter().enumerate() {
            if alt_index != 0 {
                regex_s.push('|');
            }
            let pattern = &patterns[*pattern_index];
            regex_s.push('(');
            regex_s.push_str(pattern.regex_str());
            regex_s.push(')');
            group_at[*pattern_index] = group_next;
            // offsets come from the compiled pattern's group count, not from
            // counting parentheses
            group_next += 1 + pattern.group_count();
        }
        regex_s.push(')');
        let regex = Regex::new(&regex_s)?;
        debug_assert_eq!(
            regex.captures_len(),
            group_next,
            "combined regex has {} groups, expected {}",
            regex.captures_len(),
            group_next,
        );

        Ok(Alternation { regex, order, group_at })
    }

    /// The alternative that participated in `captures`.
    fn matched(
        &self,
        captures: &Captures,
    ) -> Option<PatternIndex> {
        self.order
            .iter()
            .copied()
            .find(|pattern_index| captures.get(self.group_at[*pattern_index]).is_some())
    }

    /// Convert the sub-groups of `pattern` found in `captures`.
    fn extract(
        &self,
        captures: &Captures,
        pattern_index: PatternIndex,
        pattern: &Pattern,
    ) -> Result<Values> {
        let group_base: usize = self.group_at[pattern_index];
        pattern.convert_groups(
            (1..=pattern.group_count()).map(|group_index| captures.get(group_base + group_index).map(|m| m.as_str())),
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ConcatenatedMatcher
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Matches every [`Pattern`] of one log type against a line.
///
/// Read-only once created; shared between scan threads as
/// `Arc<ConcatenatedMatcher>`.
pub struct ConcatenatedMatcher {
    log_type: String,
    /// Patterns in canonical order.
    patterns: Vec<PatternP>,
    /// `None` when the combined regexes could not be compiled; every pattern
    /// is then tested one at a time.
    forward: Option<Alternation>,
    backward: Option<Alternation>,
}

impl fmt::Debug for ConcatenatedMatcher {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("ConcatenatedMatcher")
            .field("log_type", &self.log_type)
            .field("patterns", &self.patterns.iter().map(|p| p.name()).collect::<Vec<&str>>())
            .field("concatenated", &self.is_concatenated())
            .finish()
    }
}

impl ConcatenatedMatcher {
    /// Create a new `ConcatenatedMatcher` over `patterns` in the given
    /// (canonical) order.
    ///
    /// All `patterns` must share one log type, else
    /// [`Error::MixedLogTypes`].
    pub fn new(patterns: Vec<PatternP>) -> Result<ConcatenatedMatcher> {
        defn!("({} patterns)", patterns.len());
        let log_type: String = match patterns.first() {
            Some(pattern) => String::from(pattern.log_type()),
            None => String::new(),
        };
        for pattern in patterns.iter() {
            if pattern.log_type() != log_type {
                defx!("pattern {:?} log_type {:?} != {:?}", pattern.name(), pattern.log_type(), log_type);
                return Err(Error::MixedLogTypes {
                    name: String::from(pattern.name()),
                    expected: log_type,
                    found: String::from(pattern.log_type()),
                });
            }
        }
        if patterns.is_empty() {
            defx!("no patterns");
            return Ok(ConcatenatedMatcher { log_type, patterns, forward: None, backward: None });
        }

        let order_forward: Vec<PatternIndex> = (0..patterns.len()).collect();
        let order_backward: Vec<PatternIndex> = (0..patterns.len()).rev().collect();
        let alternations = Alternation::new(&patterns, order_forward)
            .and_then(|forward| Ok((forward, Alternation::new(&patterns, order_backward)?)));
        let (forward, backward) = match alternations {
            Ok((forward, backward)) => (Some(forward), Some(backward)),
            Err(_err) => {
                // e.g. two patterns declare the same named group
                de_wrn!(
                    "log type {:?} patterns cannot be combined, each pattern will be tried alone; {}",
                    log_type,
                    _err
                );
                (None, None)
            }
        };
        defx!("log_type {:?}, concatenated {}", log_type, forward.is_some());

        Ok(ConcatenatedMatcher { log_type, patterns, forward, backward })
    }

    #[inline(always)]
    pub fn log_type(&self) -> &str {
        &self.log_type
    }

    #[inline(always)]
    pub fn patterns(&self) -> &[PatternP] {
        &self.patterns
    }

    /// Were the combined regexes compiled? If not then every pattern is
    /// tried alone.
    #[inline(always)]
    pub const fn is_concatenated(&self) -> bool {
        self.forward.is_some() && self.backward.is_some()
    }

    /// Find every pattern matching `line`, in canonical order.
    pub fn match_line(
        &self,
        line: &str,
    ) -> Vec<PatternMatch> {
        let (forward, backward) = match (&self.forward, &self.backward) {
            (Some(f), Some(b)) => (f, b),
            _ => return self.match_line_each(line),
        };
        defn!("({:?})", str_to_String_noraw(line));

        let captures_f = match forward.regex.captures(line) {
            Some(val) => val,
            None => {
                defx!("no match");
                return Vec::with_capacity(0);
            }
        };
        let index_f: PatternIndex = match forward.matched(&captures_f) {
            Some(val) => val,
            None => {
                de_err!("forward regex matched but no alternative participated; {:?}", line);
                return self.match_line_each(line);
            }
        };
        let values_f = forward.extract(&captures_f, index_f, &self.patterns[index_f]);

        // the backward alternation must match wherever the forward one did
        let index_b: PatternIndex = match backward
            .regex
            .captures(line)
            .and_then(|captures_b| {
                backward
                    .matched(&captures_b)
                    .map(|index_b| (index_b, captures_b))
            }) {
            Some((index_b, captures_b)) if index_b != index_f => {
                debug_assert_lt!(index_f, index_b, "forward match {} after backward match {}", index_f, index_b);
                let values_b = backward.extract(&captures_b, index_b, &self.patterns[index_b]);
                let mut matches: Vec<PatternMatch> = Vec::with_capacity(2 + index_b - index_f - 1);
                matches.push((index_f, values_f));
                for index_between in (index_f + 1)..index_b {
                    if let Some(values) = self.patterns[index_between].match_line(line) {
                        matches.push((index_between, values));
                    }
                }
                matches.push((index_b, values_b));
                defx!("return {} matches; forward {}, backward {}", matches.len(), index_f, index_b);
                return matches;
            }
            Some((index_b, _)) => index_b,
            None => {
                de_err!("backward regex failed where forward regex matched; {:?}", line);
                index_f
            }
        };
        defx!("return 1 match; forward {}, backward {}", index_f, index_b);

        vec![(index_f, values_f)]
    }

    /// Try every pattern alone against `line`.
    ///
    /// Gives the same result as [`match_line`] and is used when the combined
    /// regexes cannot be compiled.
    ///
    /// [`match_line`]: ConcatenatedMatcher::match_line
    pub fn match_line_each(
        &self,
        line: &str,
    ) -> Vec<PatternMatch> {
        self.patterns
            .iter()
            .enumerate()
            .filter_map(|(pattern_index, pattern)| {
                pattern
                    .match_line(line)
                    .map(|values| (pattern_index, values))
            })
            .collect()
    }

    /// Match `line` and wrap each successful match in a [`Clue`].
    ///
    /// A pattern whose groups fail conversion is left out and its
    /// [`Error::Conversion`] returned; other patterns on the line are kept.
    pub fn get_clues(
        &self,
        line: &str,
        byte_offset: FileOffset,
        source: &LineSource,
    ) -> LineClues {
        let mut clues: BTreeMap<PatternName, Clue> = BTreeMap::new();
        let mut errors: Vec<Error> = Vec::new();
        for (pattern_index, result) in self.match_line(line) {
            match result {
                Ok(values) => {
                    clues.insert(
                        PatternName::from(self.patterns[pattern_index].name()),
                        Clue::new(values, line, byte_offset, source.clone()),
                    );
                }
                Err(err) => {
                    defñ!("conversion error {}", err);
                    errors.push(err);
                }
            }
        }

        (clues, errors)
    }
}
