// src/tests/rule_tests.rs

#![allow(non_snake_case)]

use crate::data::pattern::PatternName;
use crate::error::Error;
use crate::matcher::concatenatedmatcher::PatternP;
use crate::rules::constraint::{ClueGroup, Constraint};
use crate::rules::rule::{Composition, Rule, RuleDef};
use crate::tests::common::{
    PATTERN_CONNECTIONERROR,
    PATTERN_DATAMIGRATION,
    PATTERN_LOSTDATA,
};

use std::collections::BTreeMap;

use ::test_case::test_case;

fn cg(
    clue_index: usize,
    group_index: usize,
) -> ClueGroup {
    ClueGroup::new(clue_index, group_index)
}

fn names(patterns: &[PatternP]) -> Vec<&str> {
    patterns.iter().map(|p| p.name()).collect()
}

/// causes are sorted by name and constraint coordinates follow them
#[test]
fn test_new_remaps_clue_indexes() {
    let rule = Rule::new(
        PATTERN_LOSTDATA.clone(),
        vec![PATTERN_DATAMIGRATION.clone(), PATTERN_CONNECTIONERROR.clone()],
        vec![
            Constraint::Identical { groups: vec![cg(1, 2), cg(2, 2), cg(0, 2)] },
            Constraint::Time { earlier: cg(2, 1), later: cg(0, 1), min_delta: None, max_delta: Some(600.0) },
        ],
        Composition::And,
    )
    .unwrap();
    assert_eq!(names(rule.causes()), vec!["connectionerror", "datamigration"]);
    assert_eq!(rule.constraints()[0].clue_groups(), vec![cg(2, 2), cg(1, 2), cg(0, 2)]);
    assert_eq!(rule.constraints()[1].clue_groups(), vec![cg(1, 1), cg(0, 1)]);
    assert_eq!(rule.pattern_at(0).unwrap().name(), "lostdata");
    assert_eq!(rule.pattern_at(1).unwrap().name(), "connectionerror");
    assert_eq!(rule.pattern_at(2).unwrap().name(), "datamigration");
    assert!(rule.pattern_at(3).is_none());
}

/// creating a rule from its own canonical form changes nothing
#[test]
fn test_new_canonical_is_stable() {
    let rule = Rule::new(
        PATTERN_LOSTDATA.clone(),
        vec![PATTERN_DATAMIGRATION.clone(), PATTERN_CONNECTIONERROR.clone()],
        vec![Constraint::Identical { groups: vec![cg(1, 2), cg(2, 2)] }],
        Composition::Or,
    )
    .unwrap();
    let again = Rule::new(
        rule.effect().clone(),
        rule.causes().to_vec(),
        rule.constraints().to_vec(),
        rule.composition(),
    )
    .unwrap();
    assert_eq!(names(again.causes()), names(rule.causes()));
    assert_eq!(again.constraints(), rule.constraints());
}

#[test_case(cg(3, 1); "clue past causes")]
#[test_case(cg(1, 0); "group 0")]
#[test_case(cg(1, 4); "group past connectionerror groups")]
#[test_case(cg(0, 5); "group past effect groups")]
fn test_new_unknown_coordinate(bad: ClueGroup) {
    let result = Rule::new(
        PATTERN_LOSTDATA.clone(),
        vec![PATTERN_CONNECTIONERROR.clone(), PATTERN_DATAMIGRATION.clone()],
        vec![Constraint::Identical { groups: vec![cg(0, 1), bad] }],
        Composition::And,
    );
    match result {
        Err(Error::UnknownCoordinate { effect, .. }) => assert_eq!(effect, "lostdata"),
        result => panic!("expected UnknownCoordinate, got {:?}", result),
    }
}

#[test]
fn test_frequency_and_cause_slots() {
    let rule = Rule::new(
        PATTERN_LOSTDATA.clone(),
        vec![
            PATTERN_DATAMIGRATION.clone(),
            PATTERN_CONNECTIONERROR.clone(),
            PATTERN_DATAMIGRATION.clone(),
        ],
        vec![],
        Composition::And,
    )
    .unwrap();
    assert_eq!(
        rule.frequency(),
        vec![(PatternName::from("connectionerror"), 1), (PatternName::from("datamigration"), 2)],
    );
    assert_eq!(
        rule.cause_slots(),
        vec![(PatternName::from("connectionerror"), 1..2), (PatternName::from("datamigration"), 2..4)],
    );
}

#[test]
fn test_RuleDef_round_trip() {
    let patterns: BTreeMap<PatternName, PatternP> = [&*PATTERN_CONNECTIONERROR, &*PATTERN_DATAMIGRATION, &*PATTERN_LOSTDATA]
        .iter()
        .map(|p| (PatternName::from(p.name()), (*p).clone()))
        .collect();
    let def = RuleDef {
        effect: PatternName::from("lostdata"),
        causes: vec![PatternName::from("datamigration"), PatternName::from("connectionerror")],
        constraints: vec![Constraint::Identical { groups: vec![cg(1, 3), cg(0, 2)] }],
        composition: Composition::And,
    };
    let rule = Rule::from_def(&def, &patterns).unwrap();
    let def_canonical = rule.to_def();
    assert_eq!(def_canonical.causes, vec![PatternName::from("connectionerror"), PatternName::from("datamigration")]);
    assert_eq!(def_canonical.constraints, vec![Constraint::Identical { groups: vec![cg(2, 3), cg(0, 2)] }]);
    let rule_again = Rule::from_def(&def_canonical, &patterns).unwrap();
    assert_eq!(rule_again.to_def(), def_canonical);

    let yaml: String = ::serde_yaml::to_string(&def_canonical).unwrap();
    let def_yaml: RuleDef = ::serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(def_yaml, def_canonical);
}

#[test]
fn test_from_def_unknown_pattern() {
    let patterns: BTreeMap<PatternName, PatternP> = BTreeMap::new();
    let def = RuleDef {
        effect: PatternName::from("lostdata"),
        causes: vec![],
        constraints: vec![],
        composition: Composition::And,
    };
    assert!(matches!(Rule::from_def(&def, &patterns), Err(Error::UnknownPattern(_))));
}

#[test]
fn test_Composition_serde_default() {
    let def: RuleDef = ::serde_yaml::from_str("effect: e\ncauses: [a, b]\n").unwrap();
    assert_eq!(def.composition, Composition::And);
    assert!(def.constraints.is_empty());
    let def: RuleDef = ::serde_yaml::from_str("effect: e\ncauses: []\ncomposition: or\n").unwrap();
    assert_eq!(def.composition, Composition::Or);
}
