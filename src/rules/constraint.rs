// src/rules/constraint.rs

//! Implements [`Constraint`], a predicate over the capture group values of
//! an effect [`Clue`] and its candidate cause `Clue`s.
//!
//! [`Clue`]: crate::data::clue::Clue

use crate::data::clue::Clue;
use crate::data::datetime::seconds_between;
use crate::data::pattern::GroupIndex;
use crate::data::value::Value;
use crate::error::{Error, Result};

use std::fmt;

use ::serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Index of a clue within a rule; `0` is the effect, `i ≥ 1` is the i-th
/// cause in canonical order.
pub type ClueIndex = usize;

/// The clue index of the effect.
pub const EFFECT_CLUE_INDEX: ClueIndex = 0;

/// A coordinate: one capture group of one clue of a rule.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ClueGroup {
    pub clue_index: ClueIndex,
    pub group_index: GroupIndex,
}

impl ClueGroup {
    pub const fn new(
        clue_index: ClueIndex,
        group_index: GroupIndex,
    ) -> ClueGroup {
        ClueGroup {
            clue_index,
            group_index,
        }
    }
}

impl fmt::Display for ClueGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.clue_index, self.group_index)
    }
}

/// One clue per slot of a rule, index 0 is the effect. A `None` slot is a
/// cause that had no clues.
pub type Combination<'a> = [Option<&'a Clue>];

/// The closed set of constraint kinds.
///
/// Deltas are inclusive. An absent `min_delta` or `max_delta` leaves that
/// side open.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// `min_delta ≤ later - earlier ≤ max_delta`, in seconds, over `date`
    /// values.
    Time {
        earlier: ClueGroup,
        later: ClueGroup,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_delta: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_delta: Option<f64>,
    },
    /// All values are equal.
    Identical { groups: Vec<ClueGroup> },
    /// All values are pairwise distinct.
    Different { groups: Vec<ClueGroup> },
    /// `min_delta ≤ greater - lower ≤ max_delta` over `int` or `float`
    /// values.
    ValueDelta {
        lower: ClueGroup,
        greater: ClueGroup,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_delta: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_delta: Option<f64>,
    },
    /// Every value equals `value` converted to that value's type.
    Const { groups: Vec<ClueGroup>, value: String },
}

/// Is `delta` within the inclusive, optionally open, range?
fn delta_in_range(
    delta: f64,
    min_delta: &Option<f64>,
    max_delta: &Option<f64>,
) -> bool {
    if let Some(min) = min_delta {
        if delta < *min {
            return false;
        }
    }
    if let Some(max) = max_delta {
        if delta > *max {
            return false;
        }
    }

    true
}

impl Constraint {
    pub const fn name(&self) -> &'static str {
        match self {
            Constraint::Time { .. } => "time",
            Constraint::Identical { .. } => "identical",
            Constraint::Different { .. } => "different",
            Constraint::ValueDelta { .. } => "value_delta",
            Constraint::Const { .. } => "const",
        }
    }

    /// All coordinates referenced by this constraint.
    pub fn clue_groups(&self) -> Vec<ClueGroup> {
        match self {
            Constraint::Time { earlier, later, .. } => vec![*earlier, *later],
            Constraint::ValueDelta { lower, greater, .. } => vec![*lower, *greater],
            Constraint::Identical { groups }
            | Constraint::Different { groups }
            | Constraint::Const { groups, .. } => groups.clone(),
        }
    }

    /// Rewrite every `clue_index` with `remap`.
    pub fn remap_clue_indexes<F>(
        &mut self,
        remap: F,
    )
    where
        F: Fn(ClueIndex) -> ClueIndex,
    {
        match self {
            Constraint::Time { earlier, later, .. } => {
                earlier.clue_index = remap(earlier.clue_index);
                later.clue_index = remap(later.clue_index);
            }
            Constraint::ValueDelta { lower, greater, .. } => {
                lower.clue_index = remap(lower.clue_index);
                greater.clue_index = remap(greater.clue_index);
            }
            Constraint::Identical { groups }
            | Constraint::Different { groups }
            | Constraint::Const { groups, .. } => {
                for group in groups.iter_mut() {
                    group.clue_index = remap(group.clue_index);
                }
            }
        }
    }

    /// How many seconds before the effect's time the cause at `clue_index`
    /// may occur, if this is a `Time` constraint linking the two.
    ///
    /// The coordinates must be the effect's and the cause's time groups;
    /// which groups is not checked here.
    pub fn seconds_before_effect(
        &self,
        clue_index: ClueIndex,
    ) -> Option<f64> {
        match self {
            Constraint::Time { earlier, later, max_delta, .. }
                if earlier.clue_index == clue_index && later.clue_index == EFFECT_CLUE_INDEX =>
            {
                *max_delta
            }
            Constraint::Time { earlier, later, min_delta, .. }
                if earlier.clue_index == EFFECT_CLUE_INDEX && later.clue_index == clue_index =>
            {
                min_delta.map(|min| -min)
            }
            _ => None,
        }
    }

    /// Evaluate this constraint against one `combination`.
    ///
    /// Returns `Ok(None)` if a referenced slot is empty (the cause had no
    /// clues), `Ok(Some(passed))` otherwise.
    /// A coordinate outside the combination, or a group value of the wrong
    /// type, is an error.
    pub fn check(
        &self,
        combination: &Combination,
    ) -> Result<Option<bool>> {
        let mut values: Vec<&Value> = Vec::with_capacity(2);
        for clue_group in self.clue_groups() {
            let slot: &Option<&Clue> = match combination.get(clue_group.clue_index) {
                Some(val) => val,
                None => {
                    return Err(Error::UnknownCoordinate {
                        effect: String::new(),
                        clue_index: clue_group.clue_index,
                        group_index: clue_group.group_index,
                    });
                }
            };
            let clue: &Clue = match slot {
                Some(val) => val,
                None => {
                    defñ!("{} references empty slot {}", self.name(), clue_group);
                    return Ok(None);
                }
            };
            match clue.value(clue_group.group_index) {
                Some(value) => values.push(value),
                None => {
                    return Err(Error::UnknownCoordinate {
                        effect: String::new(),
                        clue_index: clue_group.clue_index,
                        group_index: clue_group.group_index,
                    });
                }
            }
        }

        self.check_values(&values).map(Some)
    }

    /// Evaluate this constraint over the resolved values, in the order of
    /// [`clue_groups`].
    ///
    /// [`clue_groups`]: Constraint::clue_groups
    pub fn check_values(
        &self,
        values: &[&Value],
    ) -> Result<bool> {
        // a group that did not participate in its match fails every
        // constraint except `identical` and `different`
        match self {
            Constraint::Time { min_delta, max_delta, .. } => {
                debug_assert_eq!(values.len(), 2);
                if values.iter().any(|v| v.is_null()) {
                    return Ok(false);
                }
                let (earlier, later) = match (values[0].as_datetime(), values[1].as_datetime()) {
                    (Some(e), Some(l)) => (e, l),
                    _ => return Err(self.type_error(values)),
                };
                let delta: f64 = seconds_between(earlier, later);
                defñ!("time delta {} min {:?} max {:?}", delta, min_delta, max_delta);

                Ok(delta_in_range(delta, min_delta, max_delta))
            }
            Constraint::ValueDelta { min_delta, max_delta, .. } => {
                debug_assert_eq!(values.len(), 2);
                if values.iter().any(|v| v.is_null()) {
                    return Ok(false);
                }
                let (lower, greater) = match (values[0].as_f64(), values[1].as_f64()) {
                    (Some(lo), Some(gr)) => (lo, gr),
                    _ => return Err(self.type_error(values)),
                };

                Ok(delta_in_range(greater - lower, min_delta, max_delta))
            }
            Constraint::Identical { .. } => {
                Ok(values.windows(2).all(|pair| pair[0] == pair[1]))
            }
            Constraint::Different { .. } => {
                for (index, value) in values.iter().enumerate() {
                    if values[index + 1..].contains(value) {
                        return Ok(false);
                    }
                }

                Ok(true)
            }
            Constraint::Const { value: literal, .. } => {
                for value in values.iter() {
                    if value.is_null() {
                        return Ok(false);
                    }
                    match value.literal_like(literal) {
                        Some(ref converted) if converted == *value => {}
                        _ => return Ok(false),
                    }
                }

                Ok(true)
            }
        }
    }

    fn type_error(
        &self,
        values: &[&Value],
    ) -> Error {
        Error::ConstraintType {
            constraint: self.name(),
            values: values
                .iter()
                .map(|v| format!("{}:{}", v.type_name(), v))
                .collect::<Vec<String>>()
                .join(", "),
        }
    }
}
