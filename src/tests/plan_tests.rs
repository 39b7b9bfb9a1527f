// src/tests/plan_tests.rs

#![allow(non_snake_case)]

use crate::common::LineSource;
use crate::data::clue::EffectObservation;
use crate::data::datetime::DATETIME_MIN;
use crate::investigation::config::InvestigationConfig;
use crate::investigation::plan::InvestigationPlan;
use crate::investigation::rulebase::RuleBase;
use crate::rules::constraint::{ClueGroup, Constraint};
use crate::rules::rule::{Composition, Rule};
use crate::tests::common::{
    dt,
    new_PatternP,
    CONTENT3,
    LOG_TYPE_FILESYSTEM,
    LOG_TYPE_HYDRA,
    PATTERN_CONNECTIONERROR,
    PATTERN_DATAMIGRATION,
    PATTERN_LOSTDATA,
    PATTERN_ROOTCAUSE,
};

fn cg(
    clue_index: usize,
    group_index: usize,
) -> ClueGroup {
    ClueGroup::new(clue_index, group_index)
}

fn time_before_effect(
    clue_index: usize,
    max_delta: Option<f64>,
) -> Constraint {
    Constraint::Time { earlier: cg(clue_index, 1), later: cg(0, 1), min_delta: Some(0.0), max_delta }
}

fn effect_content3() -> EffectObservation {
    EffectObservation::new(500, CONTENT3, LineSource::new("localhost", "/var/log/fs.log"))
}

fn new_plan(rules: Vec<Rule>) -> InvestigationPlan {
    let (rulebase, errors) = RuleBase::new(rules, vec![]);
    assert!(errors.is_empty(), "{:?}", errors);
    let (plan, errors) = InvestigationPlan::new(&rulebase, &effect_content3(), &InvestigationConfig::default());
    assert!(errors.is_empty(), "{:?}", errors);

    plan
}

#[test]
fn test_plan_steps_bounded() {
    let plan = new_plan(vec![Rule::new(
        PATTERN_LOSTDATA.clone(),
        vec![PATTERN_CONNECTIONERROR.clone(), PATTERN_DATAMIGRATION.clone()],
        vec![time_before_effect(1, Some(600.0)), time_before_effect(2, Some(120.0))],
        Composition::And,
    )
    .unwrap()]);
    assert_eq!(plan.effect_log_type(), Some(LOG_TYPE_FILESYSTEM));
    assert_eq!(plan.rules().len(), 1);
    assert_eq!(plan.effect_time(), &Some(dt("2015-12-03 12:11:00")));
    assert!(plan.effect_clues().contains_key("lostdata"));
    assert_eq!(plan.steps().len(), 1);
    let step = &plan.steps()[0];
    assert_eq!(step.log_type(), LOG_TYPE_HYDRA);
    assert_eq!(step.matcher().patterns().len(), 2);
    // the loosest cause bound of the log type
    assert_eq!(step.earliest_cause_time(), &dt("2015-12-03 12:01:00"));
    assert!(step.is_bounded());
    assert!(step.is_line_in_time_range(&dt("2015-12-03 12:05:00")));
    assert!(step.is_line_in_time_range(&dt("2015-12-03 12:11:00")));
    assert!(!step.is_line_in_time_range(&dt("2015-12-03 12:00:59")));
    assert!(!step.is_line_in_time_range(&dt("2015-12-03 12:11:01")));
}

/// several time constraints on one cause; the tightest applies
#[test]
fn test_plan_tightest_constraint_per_cause() {
    let plan = new_plan(vec![Rule::new(
        PATTERN_LOSTDATA.clone(),
        vec![PATTERN_CONNECTIONERROR.clone()],
        vec![time_before_effect(1, Some(600.0)), time_before_effect(1, Some(60.0))],
        Composition::And,
    )
    .unwrap()]);
    assert_eq!(plan.steps()[0].earliest_cause_time(), &dt("2015-12-03 12:10:00"));
}

/// a cause without a time bound leaves the log type unbounded
#[test]
fn test_plan_unbounded_cause() {
    let plan = new_plan(vec![Rule::new(
        PATTERN_LOSTDATA.clone(),
        vec![PATTERN_CONNECTIONERROR.clone(), PATTERN_DATAMIGRATION.clone()],
        vec![time_before_effect(1, Some(600.0))],
        Composition::And,
    )
    .unwrap()]);
    let step = &plan.steps()[0];
    assert_eq!(step.earliest_cause_time(), &*DATETIME_MIN);
    assert!(!step.is_bounded());
}

#[test]
fn test_plan_or_unbounded() {
    let plan = new_plan(vec![Rule::new(
        PATTERN_LOSTDATA.clone(),
        vec![PATTERN_CONNECTIONERROR.clone()],
        vec![time_before_effect(1, Some(600.0))],
        Composition::Or,
    )
    .unwrap()]);
    assert!(!plan.steps()[0].is_bounded());
}

/// one step per cause log type, in log type name order
#[test]
fn test_plan_steps_per_log_type() {
    let plan = new_plan(vec![Rule::new(
        PATTERN_LOSTDATA.clone(),
        vec![PATTERN_CONNECTIONERROR.clone(), PATTERN_ROOTCAUSE.clone()],
        vec![],
        Composition::And,
    )
    .unwrap()]);
    let log_types: Vec<&str> = plan
        .steps()
        .iter()
        .map(|s| s.log_type())
        .collect();
    assert_eq!(log_types, vec![LOG_TYPE_FILESYSTEM, LOG_TYPE_HYDRA]);
}

#[test]
fn test_plan_no_match() {
    let (rulebase, _errors) = RuleBase::new(
        vec![Rule::new(PATTERN_LOSTDATA.clone(), vec![PATTERN_CONNECTIONERROR.clone()], vec![], Composition::And).unwrap()],
        vec![],
    );
    let effect = EffectObservation::new(0, "nothing to see", LineSource::new("localhost", "/tmp/x.log"));
    let (plan, errors) = InvestigationPlan::new(&rulebase, &effect, &InvestigationConfig::default());
    assert!(errors.is_empty());
    assert!(plan.rules().is_empty());
    assert!(plan.steps().is_empty());
    assert_eq!(plan.effect_log_type(), None);
}

/// an effect line without a date has no effect time and no time bound
#[test]
fn test_plan_effect_without_date() {
    let effect_pattern = new_PatternP("oops", "app", r"^oops on (\w+)$", &[1], &[]);
    let (rulebase, _errors) = RuleBase::new(
        vec![Rule::new(effect_pattern, vec![PATTERN_CONNECTIONERROR.clone()], vec![], Composition::And).unwrap()],
        vec![],
    );
    let effect = EffectObservation::new(0, "oops on alfa36", LineSource::new("localhost", "/tmp/app.log"));
    let (plan, _errors) = InvestigationPlan::new(&rulebase, &effect, &InvestigationConfig::default());
    assert_eq!(plan.effect_time(), &None);
    assert_eq!(plan.steps().len(), 1);
    assert!(!plan.steps()[0].is_bounded());
    assert!(plan.steps()[0].is_line_in_time_range(&dt("2099-01-01 00:00:00")));
}
