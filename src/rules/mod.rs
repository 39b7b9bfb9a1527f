// src/rules/mod.rs

//! The `rules` module is [`Rule`s], their [`Constraint`s], and the
//! [`Verifier`] that finds the cause combinations satisfying them.
//!
//! [`Rule`s]: crate::rules::rule::Rule
//! [`Constraint`s]: crate::rules::constraint::Constraint
//! [`Verifier`]: crate::rules::verifier::Verifier

pub mod constraint;
pub mod rule;
pub mod verifier;
