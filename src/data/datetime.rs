// src/data/datetime.rs

//! Functions to transform datetime strings found in log lines into chrono
//! [`DateTime`] instances, and to compare them.
//!
//! Two jobs are done here:
//! 1. the `date` converter, [`datetime_from_str`], which turns the text of a
//!    captured group into a [`DateTimeL`]
//! 2. leading datetime extraction, [`leading_datetime`], which finds the
//!    datetime that starts a log line; used by the time-window binary search
//!    and the per-step time range check
//!
//! A datetime string without a timezone is taken as UTC.
//!
//! [`DateTime`]: https://docs.rs/chrono/0.4.40/chrono/struct.DateTime.html

#![allow(non_camel_case_types)]

#[cfg(any(debug_assertions, test))]
use crate::debug::printers::str_to_String_noraw;

#[doc(hidden)]
pub use ::chrono::{
    DateTime,
    FixedOffset,
    NaiveDate,
    NaiveDateTime,
    Offset,
    TimeDelta,
    TimeZone,
    Utc,
};
use ::lazy_static::lazy_static;
use ::regex::Regex;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DateTime types and globals
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A chrono [`strftime`] pattern.
///
/// [`strftime`]: https://docs.rs/chrono/0.4.40/chrono/format/strftime/index.html
pub type DateTimePattern_str = str;

/// Regular expression pattern used to find a datetime at the start of a line.
pub type DateTimeRegex_str = str;

/// The datetime type used everywhere in _lcslib_.
pub type DateTimeL = DateTime<FixedOffset>;
pub type DateTimeLOpt = Option<DateTimeL>;

lazy_static! {
    /// The UTC offset; used for datetime strings without a timezone.
    pub static ref FIXEDOFFSET_UTC: FixedOffset = Utc.fix();

    /// Earliest representable [`DateTimeL`]. The default
    /// `earliest_cause_time` of an unbounded investigation step.
    pub static ref DATETIME_MIN: DateTimeL = DateTime::<Utc>::MIN_UTC.fixed_offset();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// strftime patterns tried by the `date` converter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One strftime pattern and whether it carries a timezone specifier.
#[derive(Clone, Copy, Debug)]
pub struct DateTimeFormat {
    pub pattern: &'static DateTimePattern_str,
    pub has_tz: bool,
}

/// Helper to build a [`DateTimeFormat`].
macro_rules! DTF {
    ($pattern:expr, $has_tz:expr) => {
        DateTimeFormat {
            pattern: $pattern,
            has_tz: $has_tz,
        }
    };
}

/// Built-in strftime patterns tried, in order, by [`datetime_from_str`].
///
/// `%.f` matches an optional fractional second.
/// Patterns with a timezone are listed before the same pattern without.
pub const DATETIME_FORMATS: &[DateTimeFormat] = &[
    // 2015-12-03T12:08:09.123+01:00
    DTF!("%Y-%m-%dT%H:%M:%S%.f%:z", true),
    // 2015-12-03T12:08:09.123+0100
    DTF!("%Y-%m-%dT%H:%M:%S%.f%z", true),
    // 2015-12-03T12:08:09.123 +0100
    DTF!("%Y-%m-%dT%H:%M:%S%.f %z", true),
    // 2015-12-03 12:08:09.123+01:00
    DTF!("%Y-%m-%d %H:%M:%S%.f%:z", true),
    // 2015-12-03 12:08:09.123 +0100
    DTF!("%Y-%m-%d %H:%M:%S%.f %z", true),
    // 2015-12-03 12:08:09.123 +01:00
    DTF!("%Y-%m-%d %H:%M:%S%.f %:z", true),
    // 03/Dec/2015:12:08:09 +0100
    DTF!("%d/%b/%Y:%H:%M:%S %z", true),
    // 2015-12-03T12:08:09.123Z
    DTF!("%Y-%m-%dT%H:%M:%S%.fZ", false),
    // 2015-12-03 12:08:09.123Z
    DTF!("%Y-%m-%d %H:%M:%S%.fZ", false),
    // 2015-12-03 12:08:09.123
    DTF!("%Y-%m-%d %H:%M:%S%.f", false),
    // 2015-12-03T12:08:09.123
    DTF!("%Y-%m-%dT%H:%M:%S%.f", false),
    // 2015/12/03 12:08:09.123
    DTF!("%Y/%m/%d %H:%M:%S%.f", false),
    // Thu Dec  3 12:08:09 2015
    DTF!("%a %b %e %H:%M:%S %Y", false),
];

/// Date-only strftime patterns; the time is midnight UTC.
pub const DATE_FORMATS: &[&DateTimePattern_str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// regex patterns that find a datetime at the start of a line
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Built-in leading datetime regex patterns.
///
/// Capture group 1 is the datetime text which is then passed to
/// [`datetime_from_str`].
///
/// Order of declaration matters: a general pattern listed before a specific
/// pattern may lose the timezone.
pub const LEADING_DATETIME_REGEXES: &[&DateTimeRegex_str] = &[
    // 2015-12-03 12:08:09 …
    // 2015-12-03T12:08:09.123+01:00 …
    r"^(\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d{1,9})?(?:Z| ?[+-]\d{2}:?\d{2})?)(?:[^\d]|$)",
    // 2015/12/03 12:08:09 …
    r"^\[?(\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}(?:\.\d{1,9})?)(?:[^\d]|$)",
    // [03/Dec/2015:12:08:09 +0100] …
    r"^\[?(\d{2}/[[:alpha:]]{3}/\d{4}:\d{2}:\d{2}:\d{2} [+-]\d{4})\]?",
    // Thu Dec  3 12:08:09 2015 …
    r"^((?:Mon|Tue|Wed|Thu|Fri|Sat|Sun) (?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) [ \d]\d \d{2}:\d{2}:\d{2} \d{4})",
    // 2015-12-03 …
    r"^(\d{4}-\d{2}-\d{2})(?:[^\d:]|$)",
];

lazy_static! {
    /// Run-time compiled copy of [`LEADING_DATETIME_REGEXES`].
    pub(crate) static ref LEADING_DATETIME_REGEXES_VEC: Vec<Regex> =
        LEADING_DATETIME_REGEXES.iter().map(
            |x| Regex::new(x).unwrap()
        ).collect();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a [`&str`] to a chrono [`Option<DateTime<FixedOffset>>`]
/// instance.
///
/// Compensate for a missing timezone.
///
/// - `data` to parse that has a datetime string
/// - strftime `pattern` to use for parsing
/// - `has_tz`, the `pattern` has a timezone (`%z`, `%:z`)?
/// - `tz_offset` fallback timezone offset when `!has_tz`
///
/// [`&str`]: str
/// [`Option<DateTime<FixedOffset>>`]: https://docs.rs/chrono/0.4.40/chrono/struct.DateTime.html
pub fn datetime_parse_from_str(
    data: &str,
    pattern: &DateTimePattern_str,
    has_tz: bool,
    tz_offset: &FixedOffset,
) -> DateTimeLOpt {
    defn!("(pattern {:?}, tz_offset {:?}, data {:?})", pattern, tz_offset, str_to_String_noraw(data));

    if has_tz {
        match DateTime::parse_from_str(data, pattern) {
            Ok(val) => {
                defx!("DateTime::parse_from_str({:?}, {:?}) return Some({:?})", data, pattern, val);

                Some(val)
            }
            Err(_err) => {
                defx!("DateTime::parse_from_str({:?}, {:?}) failed ParseError: {}", data, pattern, _err);

                None
            }
        }
    } else {
        // no timezone in `pattern` so first convert to a `NaiveDateTime` instance
        let dt_naive = match NaiveDateTime::parse_from_str(data, pattern) {
            Ok(val) => val,
            Err(_err) => {
                defx!("NaiveDateTime::parse_from_str({:?}, {:?}) failed ParseError: {}", data, pattern, _err);
                return None;
            }
        };
        // second convert the `NaiveDateTime` instance to `DateTime<FixedOffset>` instance
        match tz_offset
            .from_local_datetime(&dt_naive)
            .earliest()
        {
            Some(val) => {
                defx!("return Some({:?})", val);

                Some(val)
            }
            None => {
                defx!("tz_offset.from_local_datetime({:?}) returned None, return None", dt_naive);

                None
            }
        }
    }
}

/// The `date` converter.
///
/// Try every [`DATETIME_FORMATS`] then every [`DATE_FORMATS`] against the
/// whole of `data` (surrounding whitespace is ignored).
/// Datetimes without a timezone are UTC.
pub fn datetime_from_str(data: &str) -> DateTimeLOpt {
    defn!("({:?})", data);
    let data = data.trim();
    if data.is_empty() {
        defx!("empty; return None");
        return None;
    }
    for dtf in DATETIME_FORMATS.iter() {
        if let Some(dt) = datetime_parse_from_str(data, dtf.pattern, dtf.has_tz, &FIXEDOFFSET_UTC) {
            defx!("return Some({:?}) using pattern {:?}", dt, dtf.pattern);
            return Some(dt);
        }
    }
    for pattern in DATE_FORMATS.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(data, pattern) {
            if let Some(dt_naive) = date.and_hms_opt(0, 0, 0) {
                let dt = dt_naive.and_utc().fixed_offset();
                defx!("return Some({:?}) using date pattern {:?}", dt, pattern);
                return Some(dt);
            }
        }
    }
    defx!("return None");

    None
}

/// Find the datetime at the start of `line`.
///
/// Returns `None` if the line does not begin with a recognized datetime,
/// e.g. a continuation line of a multi-line message.
pub fn leading_datetime(line: &str) -> DateTimeLOpt {
    for regex in LEADING_DATETIME_REGEXES_VEC.iter() {
        let captures = match regex.captures(line) {
            Some(val) => val,
            None => continue,
        };
        let text = match captures.get(1) {
            Some(val) => val.as_str(),
            None => continue,
        };
        if let Some(dt) = datetime_from_str(text) {
            defñ!("return Some({:?}) for {:?}", dt, str_to_String_noraw(line));
            return Some(dt);
        }
    }
    defñ!("return None for {:?}", str_to_String_noraw(line));

    None
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// durations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Seconds between two datetimes, `later - earlier`. Negative if `later` is
/// before `earlier`.
pub fn seconds_between(
    earlier: &DateTimeL,
    later: &DateTimeL,
) -> f64 {
    let delta: TimeDelta = later.signed_duration_since(*earlier);

    delta.num_seconds() as f64 + (delta.subsec_nanos() as f64) / 1_000_000_000.0
}

/// `dt` moved `seconds` into the past. Saturates at [`DATETIME_MIN`].
pub fn datetime_minus_seconds(
    dt: &DateTimeL,
    seconds: f64,
) -> DateTimeL {
    if !seconds.is_finite() {
        return *DATETIME_MIN;
    }
    let micros: f64 = (seconds * 1_000_000.0).round();
    if micros >= i64::MAX as f64 {
        return *DATETIME_MIN;
    }
    let delta = TimeDelta::microseconds(micros as i64);
    match dt.checked_sub_signed(delta) {
        Some(val) if val >= *DATETIME_MIN => val,
        Some(_) | None => *DATETIME_MIN,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DateTime comparisons
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Describe the result of comparing one [`DateTimeL`] to one DateTime Filter.
#[derive(Debug, Eq, PartialEq)]
pub enum Result_Filter_DateTime1 {
    /// like Skip
    Pass,
    OccursAtOrAfter,
    OccursBefore,
}

impl Result_Filter_DateTime1 {
    /// Returns `true` if the result is `OccursBefore`.
    #[inline(always)]
    pub const fn is_before(&self) -> bool {
        matches!(*self, Result_Filter_DateTime1::OccursBefore)
    }
}

/// Describe the result of comparing one [`DateTimeL`] to two DateTime Filters
/// `(after, before)`.
#[derive(Debug, Eq, PartialEq)]
pub enum Result_Filter_DateTime2 {
    /// like Pass
    InRange,
    /// like Fail
    BeforeRange,
    /// like Fail
    AfterRange,
}

impl Result_Filter_DateTime2 {
    #[inline(always)]
    pub const fn is_pass(&self) -> bool {
        matches!(*self, Result_Filter_DateTime2::InRange)
    }
}

/// Compare passed [`DateTimeL`] `dt` to the passed filter `dt_filter`.
///
/// If `dt` is at or after `dt_filter` then return `OccursAtOrAfter`<br/>
/// If `dt` is before `dt_filter` then return `OccursBefore`<br/>
/// Else return `Pass` (including if `dt_filter` is `None`)
pub fn dt_after_or_before(
    dt: &DateTimeL,
    dt_filter: &DateTimeLOpt,
) -> Result_Filter_DateTime1 {
    let dt_a = match dt_filter {
        Some(val) => val,
        None => {
            defñ!("return Result_Filter_DateTime1::Pass; (no dt filters)");
            return Result_Filter_DateTime1::Pass;
        }
    };
    if dt < dt_a {
        defñ!("return OccursBefore; (dt {:?} is before dt_filter {:?})", dt, dt_a);
        return Result_Filter_DateTime1::OccursBefore;
    }
    defñ!("return OccursAtOrAfter; (dt {:?} is at or after dt_filter {:?})", dt, dt_a);

    Result_Filter_DateTime1::OccursAtOrAfter
}

/// Is `dt` before ([`BeforeRange`]), after ([`AfterRange`]), or in between
/// ([`InRange`]) the optional filters `dt_filter_after` and
/// `dt_filter_before`?
///
/// Comparisons are "inclusive" i.e. `dt` == `dt_filter_after` will return
/// `InRange`. A `None` filter does not bound that side.
///
/// [`AfterRange`]: Result_Filter_DateTime2::AfterRange
/// [`BeforeRange`]: Result_Filter_DateTime2::BeforeRange
/// [`InRange`]: Result_Filter_DateTime2::InRange
pub fn dt_pass_filters(
    dt: &DateTimeL,
    dt_filter_after: &DateTimeLOpt,
    dt_filter_before: &DateTimeLOpt,
) -> Result_Filter_DateTime2 {
    defn!("({:?}, {:?}, {:?})", dt, dt_filter_after, dt_filter_before);
    if dt_after_or_before(dt, dt_filter_after).is_before() {
        defx!("return BeforeRange");
        return Result_Filter_DateTime2::BeforeRange;
    }
    if let Some(dt_b) = dt_filter_before {
        if dt > dt_b {
            defx!("return AfterRange");
            return Result_Filter_DateTime2::AfterRange;
        }
    }
    defx!("return InRange");

    Result_Filter_DateTime2::InRange
}
