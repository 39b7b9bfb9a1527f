// src/matcher/mod.rs

//! The `matcher` module finds every [`Pattern`] of one log type that matches
//! a log line.
//!
//! [`Pattern`]: crate::data::pattern::Pattern

pub mod concatenatedmatcher;
