// src/investigation/mod.rs

//! The `investigation` module drives a root-cause investigation: from an
//! effect line, through per-log-type backward scans, to the verified
//! [`InvestigationResult`s].
//!
//! A caller builds a [`RuleBase`] once, then runs a [`SearchManager`] for
//! each effect line to investigate.
//!
//! [`InvestigationResult`s]: crate::investigation::result::InvestigationResult
//! [`RuleBase`]: crate::investigation::rulebase::RuleBase
//! [`SearchManager`]: crate::investigation::searcher::SearchManager

pub mod config;
pub mod logtype;
pub mod plan;
pub mod result;
pub mod rulebase;
pub mod searcher;
