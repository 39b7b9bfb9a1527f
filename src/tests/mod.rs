// src/tests/mod.rs

//! Tests for _lcslib_.
//!
//! Tests are placed at `src/tests/`, inside the `lcslib`, so they have
//! crate-internal visibility. Tests of the public API alone are at top-level
//! path `tests/`.

pub mod blockreader_tests;
pub mod common;
pub mod datetime_tests;
pub mod plan_tests;
pub mod rule_tests;
