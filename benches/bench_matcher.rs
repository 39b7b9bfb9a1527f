// bench_matcher.rs
//
// benchmark `lcslib::matcher::concatenatedmatcher::ConcatenatedMatcher`
// against matching each pattern in turn
//

#![allow(non_snake_case)]

extern crate lcslib;

use lcslib::common::LineSource;
use lcslib::data::pattern::{CaptureTypes, Pattern};
use lcslib::data::value::ScalarType;
use lcslib::matcher::concatenatedmatcher::{ConcatenatedMatcher, PatternP};

use std::sync::Arc;

extern crate criterion;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const LINE_FIRST: &str = "2015-12-03 12:08:09 Connection error occurred on alfa36. Host name: 2";
const LINE_LAST: &str = "2015-12-03 12:11:00 Data is missing at alfa21. Loss = 567.02 GB. Host name: 101";
const LINE_NONE: &str = "2015-12-03 12:11:01 Nothing to see here. Host name: 101";

const REGEXES: [(&str, &str); 8] = [
    ("connectionerror", r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) Connection error occurred on (.*)\. Host name: (.*)$"),
    ("datamigration", r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) Data migration from (.*) to (.*) failed\. Host name: (.*)$"),
    ("diskfull", r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) Disk (\w+) is full\. Host name: (.*)$"),
    ("restart", r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) Service (\w+) restarted after (\d+) s\. Host name: (.*)$"),
    ("timeout", r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) Request to (.*) timed out\. Host name: (.*)$"),
    ("login", r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) User (\w+) logged in from (.*)\. Host name: (.*)$"),
    ("quota", r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) Quota exceeded for (\w+)\. Host name: (.*)$"),
    ("lostdata", r"^(\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d) Data is missing at (.*)\. Loss = (.*) GB\. Host name: (.*)$"),
];

fn new_ConcatenatedMatcher() -> ConcatenatedMatcher {
    let patterns: Vec<PatternP> = REGEXES
        .iter()
        .map(|(name, regex)| {
            let capture_types: CaptureTypes = [(1, ScalarType::Date)].into_iter().collect();
            match Pattern::new(name, regex, capture_types, vec![1], "bench") {
                Ok(val) => Arc::new(val),
                Err(err) => panic!("Pattern::new({:?}) error {}", name, err),
            }
        })
        .collect();
    match ConcatenatedMatcher::new(patterns) {
        Ok(val) => val,
        Err(err) => panic!("ConcatenatedMatcher::new error {}", err),
    }
}

#[inline(never)]
fn matcher_match_line(matcher: &ConcatenatedMatcher) {
    black_box(matcher.match_line(black_box(LINE_FIRST)));
    black_box(matcher.match_line(black_box(LINE_LAST)));
    black_box(matcher.match_line(black_box(LINE_NONE)));
}

#[inline(never)]
fn matcher_match_line_each(matcher: &ConcatenatedMatcher) {
    black_box(matcher.match_line_each(black_box(LINE_FIRST)));
    black_box(matcher.match_line_each(black_box(LINE_LAST)));
    black_box(matcher.match_line_each(black_box(LINE_NONE)));
}

#[inline(never)]
fn matcher_get_clues(
    matcher: &ConcatenatedMatcher,
    source: &LineSource,
) {
    black_box(matcher.get_clues(black_box(LINE_LAST), 0, source));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn criterion_benchmark(c: &mut Criterion) {
    let matcher = new_ConcatenatedMatcher();
    let source = LineSource::new("localhost", "/var/log/bench.log");

    let mut bg = c.benchmark_group("ConcatenatedMatcher");
    bg.bench_function("match_line", |b| b.iter(|| matcher_match_line(&matcher)));
    bg.bench_function("match_line_each", |b| b.iter(|| matcher_match_line_each(&matcher)));
    bg.bench_function("get_clues", |b| b.iter(|| matcher_get_clues(&matcher, &source)));
    bg.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
