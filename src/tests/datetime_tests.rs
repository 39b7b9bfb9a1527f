// src/tests/datetime_tests.rs

#![allow(non_snake_case)]

use crate::data::datetime::{
    datetime_from_str,
    datetime_minus_seconds,
    dt_pass_filters,
    leading_datetime,
    seconds_between,
    DateTimeL,
    DateTimeLOpt,
    FixedOffset,
    Result_Filter_DateTime2,
    TimeZone,
    DATETIME_MIN,
    FIXEDOFFSET_UTC,
};
use crate::tests::common::dt;

use ::test_case::test_case;

fn utc(
    y: i32,
    mo: u32,
    d: u32,
    h: u32,
    mi: u32,
    s: u32,
) -> DateTimeL {
    FIXEDOFFSET_UTC
        .with_ymd_and_hms(y, mo, d, h, mi, s)
        .unwrap()
}

#[test_case("2015-12-03 12:08:09", Some(utc(2015, 12, 3, 12, 8, 9)); "space separated")]
#[test_case("2015-12-03T12:08:09", Some(utc(2015, 12, 3, 12, 8, 9)); "T separated")]
#[test_case("  2015-12-03 12:08:09 ", Some(utc(2015, 12, 3, 12, 8, 9)); "surrounding whitespace")]
#[test_case("2015-12-03T12:08:09Z", Some(utc(2015, 12, 3, 12, 8, 9)); "zulu")]
#[test_case("2015-12-03T13:08:09+01:00", Some(utc(2015, 12, 3, 12, 8, 9)); "offset colon")]
#[test_case("2015-12-03 13:08:09 +0100", Some(utc(2015, 12, 3, 12, 8, 9)); "offset space")]
#[test_case("03/Dec/2015:13:08:09 +0100", Some(utc(2015, 12, 3, 12, 8, 9)); "apache")]
#[test_case("Thu Dec  3 12:08:09 2015", Some(utc(2015, 12, 3, 12, 8, 9)); "ctime")]
#[test_case("2015/12/03 12:08:09", Some(utc(2015, 12, 3, 12, 8, 9)); "slashes")]
#[test_case("2015-12-03", Some(utc(2015, 12, 3, 0, 0, 0)); "date only")]
#[test_case("", None; "empty")]
#[test_case("alfa36", None; "word")]
#[test_case("2015-13-03 12:08:09", None; "bad month")]
fn test_datetime_from_str(
    data: &str,
    expect: DateTimeLOpt,
) {
    assert_eq!(datetime_from_str(data), expect);
}

#[test]
fn test_datetime_from_str_fractional() {
    let dt_ = datetime_from_str("2015-12-03 12:08:09.250").unwrap();
    assert_eq!(seconds_between(&utc(2015, 12, 3, 12, 8, 9), &dt_), 0.25);
}

#[test]
fn test_datetime_from_str_keeps_offset() {
    let dt_ = datetime_from_str("2015-12-03T12:08:09-05:00").unwrap();
    assert_eq!(dt_.offset(), &FixedOffset::west_opt(5 * 3600).unwrap());
}

#[test_case("2015-12-03 12:08:09 Connection error", Some(utc(2015, 12, 3, 12, 8, 9)))]
#[test_case("2015-12-03T12:08:09.5Z worker started", Some(dt("2015-12-03 12:08:09.5")))]
#[test_case("[03/Dec/2015:13:08:09 +0100] GET /", Some(utc(2015, 12, 3, 12, 8, 9)))]
#[test_case("Thu Dec  3 12:08:09 2015 kernel: oops", Some(utc(2015, 12, 3, 12, 8, 9)))]
#[test_case("2015-12-03 backup done", Some(utc(2015, 12, 3, 0, 0, 0)))]
#[test_case("    at com.example.Main(Main.java:12)", None; "continuation")]
#[test_case("root cause", None)]
#[test_case("", None; "empty")]
#[test_case("20151203120809 packed", None)]
fn test_leading_datetime(
    line: &str,
    expect: DateTimeLOpt,
) {
    assert_eq!(leading_datetime(line), expect);
}

#[test_case("2015-12-03 12:08:08", "2015-12-03 12:08:09", 1.0)]
#[test_case("2015-12-03 12:08:09", "2015-12-03 12:08:08", -1.0)]
#[test_case("2015-12-03 12:00:00", "2015-12-04 12:00:00", 86400.0)]
fn test_seconds_between(
    earlier: &str,
    later: &str,
    expect: f64,
) {
    assert_eq!(seconds_between(&dt(earlier), &dt(later)), expect);
}

#[test]
fn test_datetime_minus_seconds() {
    let effect = dt("2015-12-03 12:08:09");
    assert_eq!(datetime_minus_seconds(&effect, 1.0), dt("2015-12-03 12:08:08"));
    assert_eq!(datetime_minus_seconds(&effect, -60.0), dt("2015-12-03 12:09:09"));
    assert_eq!(datetime_minus_seconds(&effect, 0.5), dt("2015-12-03 12:08:08.5"));
}

#[test_case(f64::INFINITY; "infinity")]
#[test_case(f64::NAN; "nan")]
#[test_case(1e300; "huge")]
fn test_datetime_minus_seconds_saturates(seconds: f64) {
    let effect = dt("2015-12-03 12:08:09");
    assert_eq!(datetime_minus_seconds(&effect, seconds), *DATETIME_MIN);
}

#[test_case("2015-12-03 12:08:09", Some("2015-12-03 12:00:00"), Some("2015-12-03 12:10:00"), Result_Filter_DateTime2::InRange)]
#[test_case("2015-12-03 12:00:00", Some("2015-12-03 12:00:00"), Some("2015-12-03 12:10:00"), Result_Filter_DateTime2::InRange; "at after")]
#[test_case("2015-12-03 12:10:00", Some("2015-12-03 12:00:00"), Some("2015-12-03 12:10:00"), Result_Filter_DateTime2::InRange; "at before")]
#[test_case("2015-12-03 11:59:59", Some("2015-12-03 12:00:00"), Some("2015-12-03 12:10:00"), Result_Filter_DateTime2::BeforeRange)]
#[test_case("2015-12-03 12:10:01", Some("2015-12-03 12:00:00"), Some("2015-12-03 12:10:00"), Result_Filter_DateTime2::AfterRange)]
#[test_case("2015-12-03 12:10:01", None, None, Result_Filter_DateTime2::InRange; "no filters")]
fn test_dt_pass_filters(
    dt_: &str,
    after: Option<&str>,
    before: Option<&str>,
    expect: Result_Filter_DateTime2,
) {
    let after: DateTimeLOpt = after.map(dt);
    let before: DateTimeLOpt = before.map(dt);
    assert_eq!(dt_pass_filters(&dt(dt_), &after, &before), expect);
}
