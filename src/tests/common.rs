// src/tests/common.rs

//! Fixtures shared by the tests: a small set of patterns over two log
//! types, `hydra` and `filesystem`, and the lines they match.

#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

use crate::common::{FileOffset, LineSource};
use crate::data::clue::Clue;
use crate::data::datetime::{datetime_from_str, DateTimeL};
use crate::data::pattern::{CaptureTypes, GroupIndex, Pattern};
use crate::data::value::{ScalarType, Value, Values};
use crate::matcher::concatenatedmatcher::PatternP;

use std::sync::Arc;

use ::lazy_static::lazy_static;

pub const LOG_TYPE_HYDRA: &str = "hydra";
pub const LOG_TYPE_FILESYSTEM: &str = "filesystem";

pub const CONTENT1: &str = "2015-12-03 12:08:09 Connection error occurred on alfa36. Host name: 2";
pub const CONTENT2: &str = "2015-12-03 12:10:10 Data migration from alfa36 to alfa21 failed. Host name: 2";
pub const CONTENT3: &str = "2015-12-03 12:11:00 Data is missing at alfa21. Loss = 567.02 GB. Host name: 101";
pub const CONTENT4: &str = "root cause";

pub const REGEX1: &str = r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) Connection error occurred on (.*)\. Host name: (.*)$";
pub const REGEX2: &str = r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) Data migration from (.*) to (.*) failed\. Host name: (.*)$";
pub const REGEX3: &str = r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) Data is missing at (.*)\. Loss = (.*) GB\. Host name: (.*)$";
pub const REGEX4: &str = r"^root cause$";
pub const REGEX5: &str = r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) Data is missing";

/// helper to create a `PatternP`, panics on error
pub fn new_PatternP(
    name: &str,
    log_type: &str,
    regex: &str,
    primary_key_groups: &[GroupIndex],
    capture_types: &[(GroupIndex, ScalarType)],
) -> PatternP {
    let capture_types: CaptureTypes = capture_types.iter().copied().collect();
    match Pattern::new(name, regex, capture_types, primary_key_groups.to_vec(), log_type) {
        Ok(val) => Arc::new(val),
        Err(err) => panic!("Pattern::new({:?}, {:?}) failed {}", name, regex, err),
    }
}

lazy_static! {
    pub static ref PATTERN_CONNECTIONERROR: PatternP =
        new_PatternP("connectionerror", LOG_TYPE_HYDRA, REGEX1, &[1], &[(1, ScalarType::Date)]);
    pub static ref PATTERN_DATAMIGRATION: PatternP =
        new_PatternP("datamigration", LOG_TYPE_HYDRA, REGEX2, &[1], &[(1, ScalarType::Date)]);
    pub static ref PATTERN_LOSTDATA: PatternP =
        new_PatternP("lostdata", LOG_TYPE_FILESYSTEM, REGEX3, &[1], &[(1, ScalarType::Date)]);
    pub static ref PATTERN_ROOTCAUSE: PatternP =
        new_PatternP("rootcause", LOG_TYPE_FILESYSTEM, REGEX4, &[], &[]);
    pub static ref PATTERN_DATE: PatternP =
        new_PatternP("date", LOG_TYPE_FILESYSTEM, REGEX5, &[1], &[(1, ScalarType::Date)]);
    pub static ref SOURCE_DUMMY: LineSource = LineSource::new("localhost", "/dev/null");
}

/// helper to parse a datetime, panics on error
pub fn dt(data: &str) -> DateTimeL {
    match datetime_from_str(data) {
        Some(val) => val,
        None => panic!("datetime_from_str({:?}) failed", data),
    }
}

pub fn vdate(data: &str) -> Value {
    Value::Date(dt(data))
}

pub fn vstr(data: &str) -> Value {
    Value::String(String::from(data))
}

/// helper to create a `Clue` from the line `line` matched by `pattern`
pub fn new_Clue(
    pattern: &PatternP,
    line: &str,
    byte_offset: FileOffset,
) -> Clue {
    let values: Values = match pattern.match_line(line) {
        Some(Ok(val)) => val,
        Some(Err(err)) => panic!("pattern {:?} failed convert {:?}; {}", pattern.name(), line, err),
        None => panic!("pattern {:?} does not match {:?}", pattern.name(), line),
    };

    Clue::new(values, line, byte_offset, SOURCE_DUMMY.clone())
}

/// helper to create a `Clue` directly from values
pub fn new_Clue_values(
    values: Values,
    byte_offset: FileOffset,
) -> Clue {
    Clue::new(values, "", byte_offset, SOURCE_DUMMY.clone())
}
