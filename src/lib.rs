// src/lib.rs

//! Search backwards through time-ordered log files for the cause lines of an
//! effect log line, driven by declared rules.
//!
//! A [`RuleBase`] holds patterns and rules; each rule says which cause lines
//! explain an effect line and what must hold between their captured values.
//! [`investigate`] matches the effect line, scans the log files of each cause
//! log type backwards from the effect, and returns every cause combination
//! satisfying a rule.
//!
//! [`RuleBase`]: crate::investigation::rulebase::RuleBase
//! [`investigate`]: crate::investigation::searcher::investigate

pub mod common;
pub mod data;
pub mod debug;
pub mod error;
pub mod investigation;
pub mod matcher;
pub mod readers;
pub mod rules;
#[cfg(test)]
pub mod tests;
