// src/data/mod.rs

//! The `data` module is specialized data containers for patterns, typed
//! values and the clues extracted from log lines.

pub mod clue;
pub mod datetime;
pub mod pattern;
pub mod value;
