// src/rules/rule.rs

//! Implements [`Rule`]: an effect [`Pattern`], the cause `Pattern`s that may
//! explain it, and the [`Constraint`s] linking their values.
//!
//! Causes are kept in canonical order, sorted by pattern name, so that
//! repeated causes (multiplicities) sit next to each other. Constraint
//! coordinates address that canonical order: clue index `0` is the effect,
//! clue index `i` is the i-th sorted cause.
//!
//! [`Pattern`]: crate::data::pattern::Pattern
//! [`Constraint`s]: crate::rules::constraint::Constraint

use crate::data::pattern::{Pattern, PatternName};
use crate::error::{Error, Result};
use crate::matcher::concatenatedmatcher::PatternP;
use crate::rules::constraint::{ClueIndex, Constraint, EFFECT_CLUE_INDEX};

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use ::itertools::Itertools;
use ::serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// How the constraints of a [`Rule`] combine.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    /// every constraint must pass
    #[default]
    And,
    /// at least one constraint must pass
    Or,
}

/// Serializable definition of a [`Rule`]; patterns are referenced by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    pub effect: PatternName,
    pub causes: Vec<PatternName>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub composition: Composition,
}

/// An effect, its possible causes, and the constraints between them.
#[derive(Clone)]
pub struct Rule {
    effect: PatternP,
    /// sorted by name
    causes: Vec<PatternP>,
    constraints: Vec<Constraint>,
    composition: Composition,
}

impl fmt::Debug for Rule {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("Rule")
            .field("effect", &self.effect.name())
            .field("causes", &self.causes.iter().map(|p| p.name()).collect::<Vec<&str>>())
            .field("constraints", &self.constraints)
            .field("composition", &self.composition)
            .finish()
    }
}

impl Rule {
    /// Create a new `Rule`.
    ///
    /// `causes` are in authoring order and `constraints` address that order.
    /// The causes are stably sorted by name and every constraint's clue index
    /// is remapped to the sorted order; the effect stays clue index `0`.
    ///
    /// Every coordinate must exist, else [`Error::UnknownCoordinate`].
    pub fn new(
        effect: PatternP,
        causes: Vec<PatternP>,
        constraints: Vec<Constraint>,
        composition: Composition,
    ) -> Result<Rule> {
        defn!("(effect {:?}, {} causes, {} constraints)", effect.name(), causes.len(), constraints.len());
        let mut indexed: Vec<(ClueIndex, PatternP)> = causes
            .into_iter()
            .enumerate()
            .map(|(index, pattern)| (index + 1, pattern))
            .collect();
        // `sort_by` is stable
        indexed.sort_by(|a, b| a.1.name().cmp(b.1.name()));

        // authoring clue index → canonical clue index
        let mut remap: Vec<ClueIndex> = vec![EFFECT_CLUE_INDEX; indexed.len() + 1];
        for (position, (index_authored, _)) in indexed.iter().enumerate() {
            remap[*index_authored] = position + 1;
        }
        let causes: Vec<PatternP> = indexed
            .into_iter()
            .map(|(_, pattern)| pattern)
            .collect();

        let mut constraints = constraints;
        for constraint in constraints.iter_mut() {
            // out of range indexes are left as they are for `validate`
            constraint.remap_clue_indexes(|clue_index| match remap.get(clue_index) {
                Some(remapped) => *remapped,
                None => clue_index,
            });
        }

        let rule = Rule {
            effect,
            causes,
            constraints,
            composition,
        };
        rule.validate()?;
        defx!("{:?}", rule);

        Ok(rule)
    }

    /// Create a `Rule` from its serializable definition, resolving pattern
    /// names with `patterns`.
    ///
    /// A stored rule is already in canonical order so the remapping in
    /// [`Rule::new`] leaves it unchanged.
    pub fn from_def(
        def: &RuleDef,
        patterns: &BTreeMap<PatternName, PatternP>,
    ) -> Result<Rule> {
        let lookup = |name: &PatternName| -> Result<PatternP> {
            match patterns.get(name) {
                Some(pattern) => Ok(pattern.clone()),
                None => Err(Error::UnknownPattern(name.clone())),
            }
        };
        let effect = lookup(&def.effect)?;
        let causes = def
            .causes
            .iter()
            .map(lookup)
            .collect::<Result<Vec<PatternP>>>()?;

        Rule::new(effect, causes, def.constraints.clone(), def.composition)
    }

    pub fn to_def(&self) -> RuleDef {
        RuleDef {
            effect: PatternName::from(self.effect.name()),
            causes: self
                .causes
                .iter()
                .map(|p| PatternName::from(p.name()))
                .collect(),
            constraints: self.constraints.clone(),
            composition: self.composition,
        }
    }

    /// Check every constraint coordinate refers to an existing clue and
    /// capture group.
    fn validate(&self) -> Result<()> {
        for constraint in self.constraints.iter() {
            for clue_group in constraint.clue_groups() {
                let exists: bool = match self.pattern_at(clue_group.clue_index) {
                    Some(pattern) => pattern.has_group(clue_group.group_index),
                    None => false,
                };
                if !exists {
                    defñ!("rule for {:?} bad coordinate {}", self.effect.name(), clue_group);
                    return Err(Error::UnknownCoordinate {
                        effect: PatternName::from(self.effect.name()),
                        clue_index: clue_group.clue_index,
                        group_index: clue_group.group_index,
                    });
                }
            }
        }

        Ok(())
    }

    #[inline(always)]
    pub fn effect(&self) -> &PatternP {
        &self.effect
    }

    /// Causes in canonical order.
    #[inline(always)]
    pub fn causes(&self) -> &[PatternP] {
        &self.causes
    }

    #[inline(always)]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[inline(always)]
    pub const fn composition(&self) -> Composition {
        self.composition
    }

    /// The pattern at `clue_index`; `0` is the effect.
    pub fn pattern_at(
        &self,
        clue_index: ClueIndex,
    ) -> Option<&Pattern> {
        match clue_index {
            EFFECT_CLUE_INDEX => Some(self.effect.as_ref()),
            _ => self
                .causes
                .get(clue_index - 1)
                .map(|p| p.as_ref()),
        }
    }

    /// Each distinct cause pattern name and how many times it occurs, in
    /// canonical order.
    pub fn frequency(&self) -> Vec<(PatternName, usize)> {
        self.causes
            .iter()
            .map(|p| p.name())
            .dedup_with_count()
            .map(|(count, name)| (PatternName::from(name), count))
            .collect()
    }

    /// Each distinct cause pattern name and the clue indexes of its slots.
    pub fn cause_slots(&self) -> Vec<(PatternName, Range<ClueIndex>)> {
        let mut start: ClueIndex = 1;
        self.frequency()
            .into_iter()
            .map(|(name, count)| {
                let range = start..start + count;
                start += count;
                (name, range)
            })
            .collect()
    }
}
