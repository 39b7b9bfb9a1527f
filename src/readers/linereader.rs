// src/readers/linereader.rs

//! Implements a [`LineReader`], which rebuilds lines of a file from the
//! [`Block`s] of a [`BlockReader`].
//!
//! A line is the bytes between two newlines, `'\n'`, not including either.
//! Bytes are decoded as UTF-8, invalid sequences are replaced.
//!
//! [`Block`s]: crate::readers::blockreader::Block
//! [`BlockReader`]: crate::readers::blockreader::BlockReader

use crate::common::{Count, FPath, FileOffset, FileSz, NLu8};
#[cfg(any(debug_assertions, test))]
use crate::debug::printers::str_to_String_noraw;
use crate::error::{Error, Result};
use crate::readers::blockreader::{BlockIndex, BlockOffset, BlockP, BlockReader, BlockSz, SummaryBlockReader};

use std::fmt;

#[allow(unused_imports)]
use ::more_asserts::{debug_assert_ge, debug_assert_le, debug_assert_lt};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// A line found in a file, with the offsets bounding it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LineFound {
    /// The line, without the newline.
    pub line: String,
    /// Offset of the first byte of the line.
    pub start: FileOffset,
    /// Offset of the newline ending the line, or the file size for a last
    /// line without a newline.
    pub end: FileOffset,
}

/// Rebuilds lines from the blocks of one file.
pub struct LineReader {
    blockreader: BlockReader,
    /// `Count` of lines returned by `line_containing_offset` and
    /// [`ReverseLines`].
    count_lines: Count,
}

impl fmt::Debug for LineReader {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("LineReader")
            .field("blockreader", &self.blockreader)
            .field("count_lines", &self.count_lines)
            .finish()
    }
}

impl LineReader {
    pub fn new(
        path: FPath,
        blocksz: BlockSz,
        lru_cache_sz: usize,
    ) -> Result<LineReader> {
        defñ!("({:?}, {})", path, blocksz);
        let blockreader = BlockReader::new(path, blocksz, lru_cache_sz)?;

        Ok(LineReader {
            blockreader,
            count_lines: 0,
        })
    }

    #[inline(always)]
    pub const fn path(&self) -> &FPath {
        self.blockreader.path()
    }

    #[inline(always)]
    pub const fn filesz(&self) -> FileSz {
        self.blockreader.filesz()
    }

    #[inline(always)]
    pub const fn count_lines(&self) -> Count {
        self.count_lines
    }

    pub fn summary(&self) -> SummaryBlockReader {
        self.blockreader.summary()
    }

    /// Bytes at `[beg, end)` decoded to a `String`.
    pub fn read_string(
        &mut self,
        beg: FileOffset,
        end: FileOffset,
    ) -> Result<String> {
        let data = self.blockreader.read_data(beg, end)?;

        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Offset of the first newline at or after `fileoffset`, or the file size
    /// if there is none.
    pub fn find_newline_forward(
        &mut self,
        fileoffset: FileOffset,
    ) -> Result<FileOffset> {
        let filesz = self.filesz();
        let mut at: FileOffset = fileoffset;
        while at < filesz {
            let blockp: BlockP = self.blockreader.read_block_at_file_offset(at)?;
            let index: BlockIndex = self.blockreader.block_index_at_file_offset_self(at);
            let blockoffset: BlockOffset = self.blockreader.block_offset_at_file_offset_self(at);
            let block_fo: FileOffset = self.blockreader.file_offset_at_block_offset_self(blockoffset);
            if let Some(found) = ::memchr::memchr(NLu8, &blockp[index..]) {
                return Ok(block_fo + (index + found) as FileOffset);
            }
            at = block_fo + blockp.len() as FileOffset;
        }

        Ok(filesz)
    }

    /// Offset of the last newline before `fileoffset`, i.e. within
    /// `[0, fileoffset)`.
    pub fn find_newline_backward(
        &mut self,
        fileoffset: FileOffset,
    ) -> Result<Option<FileOffset>> {
        debug_assert_le!(fileoffset, self.filesz(), "fileoffset past filesz");
        // exclusive end of the search
        let mut end: FileOffset = fileoffset;
        while end > 0 {
            let at: FileOffset = end - 1;
            let blockp: BlockP = self.blockreader.read_block_at_file_offset(at)?;
            let index: BlockIndex = self.blockreader.block_index_at_file_offset_self(at);
            let blockoffset: BlockOffset = self.blockreader.block_offset_at_file_offset_self(at);
            let block_fo: FileOffset = self.blockreader.file_offset_at_block_offset_self(blockoffset);
            if let Some(found) = ::memchr::memrchr(NLu8, &blockp[..=index]) {
                return Ok(Some(block_fo + found as FileOffset));
            }
            end = block_fo;
        }

        Ok(None)
    }

    /// Return the line which contains `fileoffset`, and the offsets bounding
    /// it.
    ///
    /// If there is a newline at `fileoffset` then the line ending with that
    /// newline is returned.
    ///
    /// An empty file is [`Error::EmptyFile`]. A `fileoffset` at or past the
    /// file size is [`Error::OffsetOutOfRange`].
    pub fn line_containing_offset(
        &mut self,
        fileoffset: FileOffset,
    ) -> Result<LineFound> {
        defn!("({})", fileoffset);
        let filesz = self.filesz();
        if filesz == 0 {
            defx!("empty file");
            return Err(Error::EmptyFile(self.path().clone()));
        }
        if fileoffset >= filesz {
            defx!("offset {} >= filesz {}", fileoffset, filesz);
            return Err(Error::OffsetOutOfRange {
                path: self.path().clone(),
                offset: fileoffset,
                filesz,
            });
        }
        let end: FileOffset = self.find_newline_forward(fileoffset)?;
        let start: FileOffset = match self.find_newline_backward(fileoffset)? {
            Some(nl) => nl + 1,
            None => 0,
        };
        debug_assert_le!(start, fileoffset);
        debug_assert_le!(fileoffset, end);
        let line: String = self.read_string(start, end)?;
        self.count_lines += 1;
        defx!("return [{}, {}] {:?}", start, end, str_to_String_noraw(&line));

        Ok(LineFound { line, start, end })
    }

    /// Iterate lines backward, from the line ending at `fileoffset` toward
    /// the start of the file, stopping before any line that starts before
    /// `stop_offset`.
    ///
    /// Only bytes `[0, fileoffset)` are read. A newline immediately before
    /// `fileoffset` does not produce an empty line.
    pub fn reverse_lines(
        &mut self,
        fileoffset: FileOffset,
        stop_offset: FileOffset,
    ) -> ReverseLines<'_> {
        let end = std::cmp::min(fileoffset, self.filesz());
        defñ!("({}, {}) end {}", fileoffset, stop_offset, end);

        ReverseLines {
            linereader: self,
            end,
            stop_offset,
            first: true,
            done: end == 0,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ReverseLines
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A lazy, finite, non-restartable iterator of `(line, line_start_offset)`
/// going backward through a file. See [`LineReader::reverse_lines`].
///
/// An error ends the iteration.
pub struct ReverseLines<'a> {
    linereader: &'a mut LineReader,
    /// Exclusive end of the next line to return.
    end: FileOffset,
    stop_offset: FileOffset,
    first: bool,
    done: bool,
}

impl<'a> ReverseLines<'a> {
    fn next_line(&mut self) -> Result<Option<(String, FileOffset)>> {
        if self.first {
            self.first = false;
            // a trailing newline closes the last line, it does not open an
            // empty one
            let last = self.linereader.blockreader.read_data(self.end - 1, self.end)?;
            if last == [NLu8] {
                self.end -= 1;
            }
        }
        let newline: Option<FileOffset> = self.linereader.find_newline_backward(self.end)?;
        let start: FileOffset = match newline {
            Some(nl) => nl + 1,
            None => 0,
        };
        if start < self.stop_offset {
            defñ!("line start {} < stop_offset {}; done", start, self.stop_offset);
            self.done = true;
            return Ok(None);
        }
        let line: String = self.linereader.read_string(start, self.end)?;
        self.linereader.count_lines += 1;
        match newline {
            Some(nl) => self.end = nl,
            None => self.done = true,
        }

        Ok(Some((line, start)))
    }
}

impl<'a> Iterator for ReverseLines<'a> {
    type Item = Result<(String, FileOffset)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_line() {
            Ok(Some(val)) => Some(Ok(val)),
            Ok(None) => None,
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
