// src/investigation/result.rs

//! The output of an investigation.

use crate::common::Count;
use crate::data::clue::Clue;
use crate::data::pattern::PatternName;
use crate::error::{Error, ErrorCategory};
use crate::rules::constraint::Constraint;

use std::fmt;

/// One accepted combination of cause lines for one rule.
#[derive(Clone, Debug, PartialEq)]
pub struct InvestigationResult {
    /// Name of the rule's effect pattern.
    pub effect_name: PatternName,
    /// Cause clues in canonical order; the effect is not included.
    pub lines: Vec<Clue>,
    /// Under `and` composition every constraint of the rule, under `or`
    /// only the constraints that passed.
    pub satisfied_constraints: Vec<Constraint>,
}

impl fmt::Display for InvestigationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "effect {:?}, {} cause lines:", self.effect_name, self.lines.len())?;
        for clue in self.lines.iter() {
            writeln!(f, "  {}", clue)?;
        }

        Ok(())
    }
}

/// Statistics about one investigation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SummaryInvestigation {
    /// Rules whose effect matched the effect line.
    pub rules_selected: Count,
    /// Investigation steps, one per cause log type.
    pub steps: Count,
    /// File locations scanned to completion.
    pub files_scanned: Count,
    pub lines_read: Count,
    pub clues_found: Count,
    pub results: Count,
    pub errors: Count,
}

/// Everything an investigation produced.
#[derive(Debug, Default)]
pub struct InvestigationOutcome {
    /// Possibly empty; empty means no cause was found under the current rules.
    pub results: Vec<InvestigationResult>,
    /// Non-fatal errors met along the way.
    pub errors: Vec<Error>,
    pub summary: SummaryInvestigation,
}

impl InvestigationOutcome {
    /// Errors of one category.
    pub fn errors_of(
        &self,
        category: ErrorCategory,
    ) -> impl Iterator<Item = &Error> {
        self.errors
            .iter()
            .filter(move |err| err.category() == category)
    }
}
