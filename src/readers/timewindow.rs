// src/readers/timewindow.rs

//! Implements [`TimeWindowLocator`], a binary search over the byte offsets of
//! a time-ordered log file.
//!
//! Each probe rebuilds the line containing the probed offset and parses the
//! datetime that leads it. A line without a leading datetime is a
//! continuation of the nearest preceding dated line and takes its datetime;
//! if no preceding line is dated the probe sorts before every datetime.

use crate::common::FileOffset;
use crate::data::datetime::{leading_datetime, DateTimeL, DateTimeLOpt};
use crate::error::{Error, Result};
use crate::readers::linereader::{LineFound, LineReader};

#[allow(unused_imports)]
use ::more_asserts::{debug_assert_ge, debug_assert_le};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Binary search over the lines of one file within `[left, right]`.
pub struct TimeWindowLocator<'a> {
    linereader: &'a mut LineReader,
    /// Inclusive lower bound of the search; should be a line start.
    left: FileOffset,
    /// Exclusive upper bound of the search.
    right: FileOffset,
}

impl<'a> TimeWindowLocator<'a> {
    /// Search the whole file, `[0, filesz]`.
    ///
    /// An empty file is [`Error::EmptyFile`].
    pub fn new(linereader: &'a mut LineReader) -> Result<TimeWindowLocator<'a>> {
        let right = linereader.filesz();
        TimeWindowLocator::with_bounds(linereader, 0, right)
    }

    /// Search within `[left, right]`; `right` is clamped to the file size.
    pub fn with_bounds(
        linereader: &'a mut LineReader,
        left: FileOffset,
        right: FileOffset,
    ) -> Result<TimeWindowLocator<'a>> {
        if linereader.filesz() == 0 {
            return Err(Error::EmptyFile(linereader.path().clone()));
        }
        let right = std::cmp::min(right, linereader.filesz());
        debug_assert_le!(left, right, "bad bounds");

        Ok(TimeWindowLocator {
            linereader,
            left,
            right,
        })
    }

    #[inline(always)]
    pub const fn left(&self) -> FileOffset {
        self.left
    }

    #[inline(always)]
    pub const fn right(&self) -> FileOffset {
        self.right
    }

    /// The line containing `fileoffset` and its effective datetime.
    fn probe(
        &mut self,
        fileoffset: FileOffset,
    ) -> Result<(LineFound, DateTimeLOpt)> {
        let linefound: LineFound = self.linereader.line_containing_offset(fileoffset)?;
        if let Some(dt) = leading_datetime(&linefound.line) {
            return Ok((linefound, Some(dt)));
        }
        // continuation line; take the datetime of the nearest dated line
        // before it
        let start = linefound.start;
        for result in self.linereader.reverse_lines(start, 0) {
            let (line, _offset) = result?;
            if let Some(dt) = leading_datetime(&line) {
                defñ!("line at {} takes datetime {:?} of line at {}", start, dt, _offset);
                return Ok((linefound, Some(dt)));
            }
        }
        defñ!("line at {} has no datetime", start);

        Ok((linefound, None))
    }

    /// Does the line before `right`, or any line before it, have a leading
    /// datetime?
    ///
    /// If not, every search returns `right`; the time window says nothing
    /// about where lines of this file are.
    pub fn is_dated(&mut self) -> Result<bool> {
        if self.right <= self.left {
            return Ok(false);
        }
        let (_linefound, dt) = self.probe(self.right - 1)?;
        defñ!("line [{}, {}] {:?}", _linefound.start, _linefound.end, dt);

        Ok(dt.is_some())
    }

    /// Binary search for the first line start whose datetime passes `after`.
    /// Returns `right` if there is none.
    fn search_first<F>(
        &mut self,
        after: F,
    ) -> Result<FileOffset>
    where
        F: Fn(&DateTimeLOpt) -> bool,
    {
        let mut lo: FileOffset = self.left;
        let mut hi: FileOffset = self.right;
        while lo < hi {
            let mid: FileOffset = lo + (hi - lo) / 2;
            let (linefound, dt) = self.probe(mid)?;
            defo!("lo {} hi {} mid {}: line [{}, {}] {:?}", lo, hi, mid, linefound.start, linefound.end, dt);
            if !after(&dt) {
                // omit this line and go right
                lo = linefound.end + 1;
            } else {
                // go left, this line may be returned
                hi = linefound.start;
            }
        }

        Ok(std::cmp::max(hi, self.left))
    }

    /// Smallest line start offset whose datetime is at or after `value`.
    /// Returns `right` if there is none.
    pub fn search_left(
        &mut self,
        value: &DateTimeL,
    ) -> Result<FileOffset> {
        defn!("({:?})", value);
        let offset = self.search_first(|dt| match dt {
            Some(dt) => dt >= value,
            None => false,
        })?;
        defx!("return {}", offset);

        Ok(offset)
    }

    /// Smallest line start offset whose datetime is after `value`.
    /// Returns `right` if there is none.
    pub fn search_upper_bound(
        &mut self,
        value: &DateTimeL,
    ) -> Result<FileOffset> {
        defn!("({:?})", value);
        let offset = self.search_first(|dt| match dt {
            Some(dt) => dt > value,
            None => false,
        })?;
        defx!("return {}", offset);

        Ok(offset)
    }

    /// Largest line start offset whose datetime is at or before `value`.
    /// Returns `left` if there is none.
    pub fn search_right(
        &mut self,
        value: &DateTimeL,
    ) -> Result<FileOffset> {
        defn!("({:?})", value);
        let upper: FileOffset = self.search_upper_bound(value)?;
        if upper <= self.left {
            defx!("return left {}", self.left);
            return Ok(self.left);
        }
        // `upper - 1` is the newline ending the line before `upper`, or the
        // last byte of the file
        let linefound: LineFound = self.linereader.line_containing_offset(upper - 1)?;
        let offset = std::cmp::max(linefound.start, self.left);
        defx!("return {}", offset);

        Ok(offset)
    }
}
