// src/rules/verifier.rs

//! Implements [`Verifier`], the combinatorial search for cause [`Clue`]
//! combinations that satisfy a [`Rule`].
//!
//! A cause pattern that occurs `k` times in a rule fills its `k` slots with
//! every k-permutation, without replacement, of that pattern's clues. The
//! slot groups of all cause patterns are then combined as a cartesian
//! product. Each combination, with the effect clue at slot `0`, is checked
//! against the rule's constraints.
//!
//! A cause pattern with fewer than `k` clues is inapplicable; its slots stay
//! empty. A constraint referencing an empty slot fails under
//! [`Composition::And`] and is ignored under [`Composition::Or`].
//!
//! [`Clue`]: crate::data::clue::Clue

use crate::data::clue::{Clue, CluesByPattern};
use crate::error::{Error, Result};
use crate::investigation::result::InvestigationResult;
use crate::rules::constraint::Constraint;
use crate::rules::rule::{Composition, Rule};

use std::iter::{Map, Once};
use std::slice::Iter;

use ::itertools::structs::Permutations;
use ::itertools::{Either, Itertools};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// The choices for the slots of one cause pattern: every k-permutation of
/// its clues or, if inapplicable, `k` empty slots. Permutations are generated
/// as the product advances.
type SlotChoices<'a> = Either<
    Map<Permutations<Iter<'a, Clue>>, fn(Vec<&'a Clue>) -> Vec<Option<&'a Clue>>>,
    Once<Vec<Option<&'a Clue>>>,
>;

fn filled_slots(permutation: Vec<&Clue>) -> Vec<Option<&Clue>> {
    permutation
        .into_iter()
        .map(Some)
        .collect()
}

/// Stateless constraint verifier.
pub struct Verifier;

impl Verifier {
    /// Find every combination of `clues` that satisfies `rule` for the effect
    /// clue `effect`.
    ///
    /// Results are in combination order; the effect is not in
    /// [`InvestigationResult::lines`]. A constraint evaluated over values of
    /// the wrong type is [`Error::ConstraintType`], a configuration error
    /// for the whole rule.
    pub fn verify(
        rule: &Rule,
        effect: &Clue,
        clues: &CluesByPattern,
    ) -> Result<Vec<InvestigationResult>> {
        defn!("(rule for {:?})", rule.effect().name());
        let empty: Vec<Clue> = Vec::with_capacity(0);
        let mut slot_choices: Vec<SlotChoices> = Vec::new();
        let mut applicable: usize = 0;
        for (name, count) in rule.frequency() {
            let candidates: &Vec<Clue> = clues.get(&name).unwrap_or(&empty);
            if candidates.len() < count {
                defo!("cause {:?} needs {} clues, has {}; inapplicable", name, count, candidates.len());
                slot_choices.push(Either::Right(std::iter::once(vec![None; count])));
                continue;
            }
            defo!("cause {:?} takes permutations of {} from {} clues", name, count, candidates.len());
            applicable += 1;
            slot_choices.push(Either::Left(
                candidates
                    .iter()
                    .permutations(count)
                    .map(filled_slots as fn(_) -> _),
            ));
        }
        if applicable == 0 {
            defx!("no applicable causes; return 0 results");
            return Ok(Vec::with_capacity(0));
        }

        let mut results: Vec<InvestigationResult> = Vec::new();
        for product in slot_choices.into_iter().multi_cartesian_product() {
            let mut combination: Vec<Option<&Clue>> = Vec::with_capacity(1 + rule.causes().len());
            combination.push(Some(effect));
            for slots in product.into_iter() {
                combination.extend(slots);
            }
            debug_assert_eq!(combination.len(), 1 + rule.causes().len());
            if let Some(satisfied) = Verifier::check_combination(rule, &combination)? {
                results.push(InvestigationResult {
                    effect_name: String::from(rule.effect().name()),
                    lines: combination[1..]
                        .iter()
                        .flatten()
                        .map(|c| (*c).clone())
                        .collect(),
                    satisfied_constraints: satisfied,
                });
            }
        }
        defx!("return {} results", results.len());

        Ok(results)
    }

    /// Check one combination; `Some` holds the constraints to attach to the
    /// accepted combination.
    fn check_combination(
        rule: &Rule,
        combination: &[Option<&Clue>],
    ) -> Result<Option<Vec<Constraint>>> {
        let mut satisfied: Vec<Constraint> = Vec::with_capacity(rule.constraints().len());
        for constraint in rule.constraints().iter() {
            let passed: Option<bool> = match constraint.check(combination) {
                Ok(val) => val,
                Err(Error::UnknownCoordinate { clue_index, group_index, .. }) => {
                    return Err(Error::UnknownCoordinate {
                        effect: String::from(rule.effect().name()),
                        clue_index,
                        group_index,
                    });
                }
                Err(err) => return Err(err),
            };
            match (rule.composition(), passed) {
                (Composition::And, Some(true)) => satisfied.push(constraint.clone()),
                (Composition::And, _) => return Ok(None),
                (Composition::Or, Some(true)) => satisfied.push(constraint.clone()),
                (Composition::Or, _) => {}
            }
        }
        if rule.composition() == Composition::Or && satisfied.is_empty() {
            return Ok(None);
        }

        Ok(Some(satisfied))
    }
}
