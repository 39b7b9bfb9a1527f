// src/readers/mod.rs

//! The `readers` module reads lines from log files: forward from an
//! arbitrary offset, backward toward the file start, and by binary search
//! over the leading datetimes of lines.
//!
//! A [`BlockReader`] reads fixed-size blocks of bytes. A [`LineReader`]
//! rebuilds lines from those blocks. A [`TimeWindowLocator`] finds the
//! offsets bounding a time window.
//!
//! [`BlockReader`]: crate::readers::blockreader::BlockReader
//! [`LineReader`]: crate::readers::linereader::LineReader
//! [`TimeWindowLocator`]: crate::readers::timewindow::TimeWindowLocator

pub mod blockreader;
pub mod helpers;
pub mod linereader;
pub mod timewindow;
