// src/investigation/rulebase.rs

//! Implements [`RuleBase`], the patterns, rules and log types of one
//! configuration, with the groupings an investigation needs computed once
//! at construction.

use crate::common::LineSource;
use crate::data::pattern::{Pattern, PatternDef, PatternName};
use crate::error::{Error, Result};
use crate::investigation::config::InvestigationConfig;
use crate::investigation::logtype::LogType;
use crate::matcher::concatenatedmatcher::{ConcatenatedMatcher, PatternP};
use crate::rules::rule::{Rule, RuleDef};

use std::collections::BTreeMap;
use std::sync::Arc;

use ::serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Thread-safe [Atomic Reference Counting Pointer] to a [`Rule`].
///
/// [Atomic Reference Counting Pointer]: std::sync::Arc
pub type RuleP = Arc<Rule>;

/// Serializable definition of a whole [`RuleBase`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleBaseDef {
    #[serde(default)]
    pub patterns: Vec<PatternDef>,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
    #[serde(default)]
    pub log_types: Vec<LogType>,
}

/// Patterns, rules and log types, read-only once created.
#[derive(Debug, Default)]
pub struct RuleBase {
    /// every pattern referenced by a rule, by name
    patterns: BTreeMap<PatternName, PatternP>,
    rules: Vec<RuleP>,
    log_types: BTreeMap<String, LogType>,
    /// effect pattern name → rules with that effect
    rules_by_effect: BTreeMap<PatternName, Vec<RuleP>>,
    /// log type name → matcher over the effect patterns of that log type
    effect_matchers: BTreeMap<String, Arc<ConcatenatedMatcher>>,
}

impl RuleBase {
    /// Create a new `RuleBase`.
    ///
    /// Returns the `RuleBase` of every valid rule, and an error for each
    /// rule left out. A rule is left out if it uses a pattern name already
    /// used by a different pattern ([`Error::DuplicatePatternName`]).
    pub fn new(
        rules: Vec<Rule>,
        log_types: Vec<LogType>,
    ) -> (RuleBase, Vec<Error>) {
        defn!("({} rules, {} log types)", rules.len(), log_types.len());
        let mut errors: Vec<Error> = Vec::new();
        let mut patterns: BTreeMap<PatternName, PatternP> = BTreeMap::new();
        let mut rules_valid: Vec<RuleP> = Vec::with_capacity(rules.len());

        'rules: for rule in rules.into_iter() {
            let mut rule_patterns: Vec<&PatternP> = vec![rule.effect()];
            rule_patterns.extend(rule.causes().iter());
            for pattern in rule_patterns.iter() {
                if let Some(known) = patterns.get(pattern.name()) {
                    if known.as_ref() != pattern.as_ref() {
                        defo!("duplicate pattern name {:?}", pattern.name());
                        errors.push(Error::DuplicatePatternName(PatternName::from(pattern.name())));
                        continue 'rules;
                    }
                }
            }
            for pattern in rule_patterns.into_iter() {
                patterns
                    .entry(PatternName::from(pattern.name()))
                    .or_insert_with(|| pattern.clone());
            }
            rules_valid.push(Arc::new(rule));
        }

        let mut rules_by_effect: BTreeMap<PatternName, Vec<RuleP>> = BTreeMap::new();
        for rule in rules_valid.iter() {
            rules_by_effect
                .entry(PatternName::from(rule.effect().name()))
                .or_default()
                .push(rule.clone());
        }

        // effect patterns grouped by log type, sorted by name
        let mut effects_by_log_type: BTreeMap<String, BTreeMap<PatternName, PatternP>> = BTreeMap::new();
        for rule in rules_valid.iter() {
            let effect = rule.effect();
            effects_by_log_type
                .entry(String::from(effect.log_type()))
                .or_default()
                .entry(PatternName::from(effect.name()))
                .or_insert_with(|| effect.clone());
        }
        let mut effect_matchers: BTreeMap<String, Arc<ConcatenatedMatcher>> = BTreeMap::new();
        for (log_type, effects) in effects_by_log_type.into_iter() {
            match ConcatenatedMatcher::new(effects.into_values().collect()) {
                Ok(matcher) => {
                    effect_matchers.insert(log_type, Arc::new(matcher));
                }
                Err(err) => errors.push(err),
            }
        }

        let log_types: BTreeMap<String, LogType> = log_types
            .into_iter()
            .map(|lt| (lt.name.clone(), lt))
            .collect();
        defx!("{} rules valid, {} errors", rules_valid.len(), errors.len());

        (
            RuleBase {
                patterns,
                rules: rules_valid,
                log_types,
                rules_by_effect,
                effect_matchers,
            },
            errors,
        )
    }

    /// Create a `RuleBase` from its serializable definition.
    ///
    /// Invalid patterns and the rules using them are left out, each with
    /// an error.
    pub fn from_def(def: &RuleBaseDef) -> (RuleBase, Vec<Error>) {
        defn!();
        let mut errors: Vec<Error> = Vec::new();
        let mut patterns: BTreeMap<PatternName, PatternP> = BTreeMap::new();
        for pattern_def in def.patterns.iter() {
            if patterns.contains_key(&pattern_def.name) {
                errors.push(Error::DuplicatePatternName(pattern_def.name.clone()));
                continue;
            }
            match Pattern::from_def(pattern_def) {
                Ok(pattern) => {
                    patterns.insert(pattern_def.name.clone(), Arc::new(pattern));
                }
                Err(err) => errors.push(err),
            }
        }
        let mut rules: Vec<Rule> = Vec::with_capacity(def.rules.len());
        for rule_def in def.rules.iter() {
            match Rule::from_def(rule_def, &patterns) {
                Ok(rule) => rules.push(rule),
                Err(err) => errors.push(err),
            }
        }
        let (rulebase, errors_new) = RuleBase::new(rules, def.log_types.clone());
        errors.extend(errors_new);
        defx!("{} errors", errors.len());

        (rulebase, errors)
    }

    pub fn to_def(&self) -> RuleBaseDef {
        RuleBaseDef {
            patterns: self
                .patterns
                .values()
                .map(|p| p.to_def())
                .collect(),
            rules: self
                .rules
                .iter()
                .map(|r| r.to_def())
                .collect(),
            log_types: self.log_types.values().cloned().collect(),
        }
    }

    #[inline(always)]
    pub fn rules(&self) -> &[RuleP] {
        &self.rules
    }

    #[inline(always)]
    pub fn patterns(&self) -> &BTreeMap<PatternName, PatternP> {
        &self.patterns
    }

    pub fn pattern(
        &self,
        name: &str,
    ) -> Result<&PatternP> {
        self.patterns
            .get(name)
            .ok_or_else(|| Error::UnknownPattern(PatternName::from(name)))
    }

    pub fn log_type(
        &self,
        name: &str,
    ) -> Option<&LogType> {
        self.log_types.get(name)
    }

    /// Rules whose effect is the pattern `name`.
    pub fn rules_with_effect(
        &self,
        name: &str,
    ) -> &[RuleP] {
        match self.rules_by_effect.get(name) {
            Some(rules) => rules,
            None => &[],
        }
    }

    /// Matcher over the effect patterns of `log_type`.
    pub fn effect_matcher(
        &self,
        log_type: &str,
    ) -> Option<&Arc<ConcatenatedMatcher>> {
        self.effect_matchers.get(log_type)
    }

    /// The log type whose locators cover `source`, otherwise the log type of
    /// the first effect pattern, by log type name, matching `line`.
    pub fn effect_log_type(
        &self,
        source: &LineSource,
        line: &str,
        config: &InvestigationConfig,
    ) -> Option<String> {
        if let Some(log_type) = self
            .log_types
            .values()
            .find(|lt| lt.covers(source, config))
        {
            defñ!("log type {:?} covers {}", log_type.name, source);
            return Some(log_type.name.clone());
        }
        for (log_type, matcher) in self.effect_matchers.iter() {
            if !matcher.match_line(line).is_empty() {
                defñ!("log type {:?} effect pattern matches", log_type);
                return Some(log_type.clone());
            }
        }
        defñ!("no log type for {}", source);

        None
    }
}
