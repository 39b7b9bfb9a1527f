// src/investigation/plan.rs

//! Implements [`InvestigationPlan`]: which rules apply to an effect line, and
//! one [`InvestigationStep`] per log type whose files must be scanned for
//! causes.

use crate::data::clue::{Clue, EffectObservation};
use crate::data::datetime::{
    datetime_minus_seconds,
    dt_pass_filters,
    DateTimeL,
    DateTimeLOpt,
    DATETIME_MIN,
};
use crate::data::pattern::PatternName;
use crate::data::value::Value;
use crate::error::Error;
use crate::investigation::config::InvestigationConfig;
use crate::investigation::rulebase::{RuleBase, RuleP};
use crate::matcher::concatenatedmatcher::{ConcatenatedMatcher, PatternP};
use crate::rules::rule::Composition;

use std::collections::BTreeMap;
use std::sync::Arc;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// InvestigationStep
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A bounded scan of the files of one log type.
#[derive(Debug)]
pub struct InvestigationStep {
    log_type: String,
    /// Matches the cause patterns of this log type.
    matcher: Arc<ConcatenatedMatcher>,
    /// `None` when the effect line had no datetime; the scan is then not
    /// bounded above by time.
    effect_time: DateTimeLOpt,
    earliest_cause_time: DateTimeL,
}

impl InvestigationStep {
    pub fn new(
        log_type: &str,
        matcher: Arc<ConcatenatedMatcher>,
        effect_time: DateTimeLOpt,
        earliest_cause_time: Option<DateTimeL>,
    ) -> InvestigationStep {
        InvestigationStep {
            log_type: String::from(log_type),
            matcher,
            effect_time,
            earliest_cause_time: earliest_cause_time.unwrap_or(*DATETIME_MIN),
        }
    }

    #[inline(always)]
    pub fn log_type(&self) -> &str {
        &self.log_type
    }

    #[inline(always)]
    pub fn matcher(&self) -> &Arc<ConcatenatedMatcher> {
        &self.matcher
    }

    #[inline(always)]
    pub const fn effect_time(&self) -> &DateTimeLOpt {
        &self.effect_time
    }

    #[inline(always)]
    pub const fn earliest_cause_time(&self) -> &DateTimeL {
        &self.earliest_cause_time
    }

    /// Is the step bounded below by time?
    pub fn is_bounded(&self) -> bool {
        self.earliest_cause_time > *DATETIME_MIN
    }

    /// `earliest_cause_time ≤ dt ≤ effect_time`
    pub fn is_line_in_time_range(
        &self,
        dt: &DateTimeL,
    ) -> bool {
        dt_pass_filters(dt, &Some(self.earliest_cause_time), &self.effect_time).is_pass()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// InvestigationPlan
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Rules that apply to one effect line, and the steps to collect their
/// causes.
#[derive(Debug, Default)]
pub struct InvestigationPlan {
    effect: EffectObservation,
    /// `None` if no log type matched the effect line.
    effect_log_type: Option<String>,
    /// Effect clues by effect pattern name.
    effect_clues: BTreeMap<PatternName, Clue>,
    /// Rules whose effect matched, in rule base order.
    rules: Vec<RuleP>,
    /// One step per cause log type, by log type name.
    steps: Vec<Arc<InvestigationStep>>,
    effect_time: DateTimeLOpt,
}

/// The datetime of an effect clue: the first `date` value among its primary
/// key groups, else its first `date` value.
fn clue_time(
    clue: &Clue,
    pattern: &PatternP,
) -> DateTimeLOpt {
    let primary_key_dt = pattern
        .primary_key_values(&clue.values)
        .into_iter()
        .find_map(|v| v.as_datetime().copied());
    if primary_key_dt.is_some() {
        return primary_key_dt;
    }

    clue.values
        .iter()
        .find_map(|v: &Value| v.as_datetime().copied())
}

impl InvestigationPlan {
    /// Create the plan for `effect`.
    ///
    /// Returns the plan and the conversion errors of the effect line. A plan
    /// without rules has no steps.
    pub fn new(
        rulebase: &RuleBase,
        effect: &EffectObservation,
        config: &InvestigationConfig,
    ) -> (InvestigationPlan, Vec<Error>) {
        defn!("({:?})", effect);
        let mut plan = InvestigationPlan {
            effect: effect.clone(),
            ..Default::default()
        };
        let log_type = match rulebase.effect_log_type(&effect.source, &effect.line_content, config) {
            Some(val) => val,
            None => {
                defx!("no effect log type");
                return (plan, Vec::with_capacity(0));
            }
        };
        let matcher = match rulebase.effect_matcher(&log_type) {
            Some(val) => val,
            None => {
                defx!("log type {:?} has no effect patterns", log_type);
                plan.effect_log_type = Some(log_type);
                return (plan, Vec::with_capacity(0));
            }
        };
        let (effect_clues, errors) = matcher.get_clues(&effect.line_content, effect.byte_offset, &effect.source);
        plan.effect_log_type = Some(log_type);

        // effect datetime
        for (name, clue) in effect_clues.iter() {
            if let Ok(pattern) = rulebase.pattern(name) {
                if let Some(dt) = clue_time(clue, pattern) {
                    plan.effect_time = Some(dt);
                    break;
                }
            }
        }

        // select rules
        for name in effect_clues.keys() {
            plan.rules
                .extend(rulebase.rules_with_effect(name).iter().cloned());
        }
        plan.effect_clues = effect_clues;

        // cause patterns by log type, sorted by name
        let mut causes_by_log_type: BTreeMap<String, BTreeMap<PatternName, PatternP>> = BTreeMap::new();
        for rule in plan.rules.iter() {
            for cause in rule.causes().iter() {
                causes_by_log_type
                    .entry(String::from(cause.log_type()))
                    .or_default()
                    .entry(PatternName::from(cause.name()))
                    .or_insert_with(|| cause.clone());
            }
        }
        let mut errors = errors;
        for (log_type, causes) in causes_by_log_type.into_iter() {
            let earliest: Option<DateTimeL> = plan.earliest_cause_time(&log_type);
            let matcher = match ConcatenatedMatcher::new(causes.into_values().collect()) {
                Ok(val) => val,
                Err(err) => {
                    errors.push(err);
                    continue;
                }
            };
            defo!("step {:?} earliest {:?} effect_time {:?}", log_type, earliest, plan.effect_time);
            plan.steps.push(Arc::new(InvestigationStep::new(
                &log_type,
                Arc::new(matcher),
                plan.effect_time,
                earliest,
            )));
        }
        defx!("{} rules, {} steps", plan.rules.len(), plan.steps.len());

        (plan, errors)
    }

    /// Earliest time a cause of `log_type` may occur, bounded by the `time`
    /// constraints of `and` rules that link the effect and each such cause.
    ///
    /// `None` if any such cause is not bounded.
    fn earliest_cause_time(
        &self,
        log_type: &str,
    ) -> Option<DateTimeL> {
        let effect_time: &DateTimeL = self.effect_time.as_ref()?;
        let mut seconds_max: Option<f64> = None;
        for rule in self.rules.iter() {
            for (position, cause) in rule.causes().iter().enumerate() {
                if cause.log_type() != log_type {
                    continue;
                }
                if rule.composition() != Composition::And {
                    return None;
                }
                let clue_index = position + 1;
                // every constraint must hold so the tightest bound applies
                let seconds: f64 = rule
                    .constraints()
                    .iter()
                    .filter_map(|c| c.seconds_before_effect(clue_index))
                    .reduce(f64::min)?;
                seconds_max = Some(match seconds_max {
                    Some(max) => max.max(seconds),
                    None => seconds,
                });
            }
        }

        seconds_max.map(|seconds| datetime_minus_seconds(effect_time, seconds))
    }

    #[inline(always)]
    pub const fn effect(&self) -> &EffectObservation {
        &self.effect
    }

    pub fn effect_log_type(&self) -> Option<&str> {
        self.effect_log_type.as_deref()
    }

    #[inline(always)]
    pub const fn effect_clues(&self) -> &BTreeMap<PatternName, Clue> {
        &self.effect_clues
    }

    #[inline(always)]
    pub fn rules(&self) -> &[RuleP] {
        &self.rules
    }

    #[inline(always)]
    pub fn steps(&self) -> &[Arc<InvestigationStep>] {
        &self.steps
    }

    #[inline(always)]
    pub const fn effect_time(&self) -> &DateTimeLOpt {
        &self.effect_time
    }
}
