// src/readers/blockreader.rs

//! Implements [`Block`s] and [`BlockReader`], the driver of reading bytes
//! from a file.
//!
//! Blocks are read at block-aligned offsets and kept in a small LRU cache so
//! that the binary search probes and the backward scan that follows share
//! the blocks near the end of the time window.
//!
//! [`Block`s]: crate::readers::blockreader::Block
//! [`BlockReader`]: crate::readers::blockreader::BlockReader

use crate::common::{Bytes, Count, FPath, File, FileOffset, FileSz, ResultS3};
#[allow(unused_imports)]
use crate::debug::printers::{de_err, de_wrn};
use crate::error::{Error, Result};

use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::num::NonZeroUsize;
use std::sync::Arc;

use ::lru::LruCache;
#[allow(unused_imports)]
use ::more_asserts::{debug_assert_ge, debug_assert_le, debug_assert_lt};
#[allow(unused_imports)]
use ::si_trace_print::{def1n, def1x, defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// [`Block`] Size in bytes.
pub type BlockSz = u64;

/// Byte offset (Index) _into_ a [`Block`] from the beginning of that `Block`.
/// Zero based.
pub type BlockIndex = usize;

/// Offset into a file in [`Block`s], depends on [`BlockSz`] runtime value.
/// Zero based.
///
/// [`Block`s]: self::Block
pub type BlockOffset = u64;

/// A _block_ of bytes read from some file.
pub type Block = Vec<u8>;

/// Thread-safe [Atomic Reference Counting Pointer] to a [`Block`].
///
/// [Atomic Reference Counting Pointer]: std::sync::Arc
pub type BlockP = Arc<Block>;

/// Internal fast [LRU cache] used by [`BlockReader`] in the `read_block`
/// function.
///
/// [LRU cache]: https://docs.rs/lru/0.13.0/lru/index.html
pub type BlocksLRUCache = LruCache<BlockOffset, BlockP>;

/// A typed [`ResultS3`] for function [`BlockReader::read_block`].
pub type ResultReadBlock = ResultS3<BlockP, Error>;

/// Minimum Block Size (inclusive).
pub const BLOCKSZ_MIN: BlockSz = 1;

/// Maximum Block Size (inclusive).
pub const BLOCKSZ_MAX: BlockSz = 0xFFFFFF;

/// Default Block Size.
pub const BLOCKSZ_DEF: BlockSz = 0xFFFF;

/// Default count of cache slots for the `read_block` LRU cache.
pub const READ_BLOCK_LRU_CACHE_SZ: usize = 8;

/// A `BlockReader` reads a plain file in [`Block`s] of [`BlockSz`] bytes.
///
/// All `Block`s are `blocksz` bytes except the last `Block` which may be
/// smaller (and not zero).
///
/// _XXX: not a rust "Reader"; does not implement trait [`Read`]._
///
/// [`Block`s]: self::Block
/// [`Read`]: std::io::Read
pub struct BlockReader {
    /// Path to the file.
    path: FPath,
    /// The file handle.
    file: File,
    /// File size in bytes.
    filesz: FileSz,
    /// File size in `Block`s.
    blockn: u64,
    /// Standard `Block` size in bytes.
    blocksz: BlockSz,
    /// Internal [LRU cache] for `fn read_block()`. Lookups _O(1)_.
    ///
    /// [LRU cache]: https://docs.rs/lru/0.13.0/lru/index.html
    read_block_lru_cache: BlocksLRUCache,
    /// `Count` of bytes read from the file.
    count_bytes: Count,
    /// `Count` of `Block`s read from the file.
    count_blocks_read: Count,
    /// Internal LRU cache `Count` of lookup hits.
    pub(crate) read_block_cache_lru_hit: Count,
    /// Internal LRU cache `Count` of lookup misses.
    pub(crate) read_block_cache_lru_miss: Count,
}

impl fmt::Debug for BlockReader {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("BlockReader")
            .field("path", &self.path)
            .field("filesz", &self.filesz)
            .field("blockn", &self.blockn)
            .field("blocksz", &self.blocksz)
            .field("blocks read", &self.count_blocks_read)
            .field("bytes read", &self.count_bytes)
            .field("cache LRU hit", &self.read_block_cache_lru_hit)
            .field("miss", &self.read_block_cache_lru_miss)
            .finish()
    }
}

/// Statistics of one [`BlockReader`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SummaryBlockReader {
    pub blockreader_bytes: Count,
    pub blockreader_blocks: Count,
    pub blockreader_blocks_total: Count,
    pub blockreader_blocksz: BlockSz,
    pub blockreader_filesz: FileSz,
    pub blockreader_read_block_lru_cache_hit: Count,
    pub blockreader_read_block_lru_cache_miss: Count,
}

/// Implements the `BlockReader`.
impl BlockReader {
    /// Create a new `BlockReader`.
    ///
    /// Opens the file at `path`. A `blocksz` outside
    /// [`BLOCKSZ_MIN`]..=[`BLOCKSZ_MAX`] is clamped.
    pub fn new(
        path: FPath,
        blocksz: BlockSz,
        lru_cache_sz: usize,
    ) -> Result<BlockReader> {
        def1n!("({:?}, {:?})", path, blocksz);
        debug_assert_ne!(0, blocksz, "Block Size cannot be 0");
        let blocksz: BlockSz = blocksz.clamp(BLOCKSZ_MIN, BLOCKSZ_MAX);

        let file: File = match File::open(&path) {
            Ok(val) => val,
            Err(err) => {
                def1x!("File::open({:?}) error {}", path, err);
                return Err(Error::io(&path, err));
            }
        };
        let filesz: FileSz = match file.metadata() {
            Ok(val) => val.len(),
            Err(err) => {
                def1x!("file.metadata() error {}", err);
                return Err(Error::io(&path, err));
            }
        };
        let blockn: u64 = BlockReader::count_blocks(filesz, blocksz);
        let cache_sz = NonZeroUsize::new(lru_cache_sz).unwrap_or(NonZeroUsize::MIN);
        def1x!("filesz {}, blockn {}", filesz, blockn);

        Ok(BlockReader {
            path,
            file,
            filesz,
            blockn,
            blocksz,
            read_block_lru_cache: BlocksLRUCache::new(cache_sz),
            count_bytes: 0,
            count_blocks_read: 0,
            read_block_cache_lru_hit: 0,
            read_block_cache_lru_miss: 0,
        })
    }

    #[inline(always)]
    pub const fn path(&self) -> &FPath {
        &self.path
    }

    /// File size in bytes.
    #[inline(always)]
    pub const fn filesz(&self) -> FileSz {
        self.filesz
    }

    #[inline(always)]
    pub const fn blocksz(&self) -> BlockSz {
        self.blocksz
    }

    /// Return nearest preceding `BlockOffset` for given `FileOffset`.
    #[inline(always)]
    pub const fn block_offset_at_file_offset(
        fileoffset: FileOffset,
        blocksz: BlockSz,
    ) -> BlockOffset {
        (fileoffset / blocksz) as BlockOffset
    }

    /// Return nearest preceding `BlockOffset` for given `FileOffset`
    /// (using `self.blocksz`).
    #[inline(always)]
    pub const fn block_offset_at_file_offset_self(
        &self,
        fileoffset: FileOffset,
    ) -> BlockOffset {
        BlockReader::block_offset_at_file_offset(fileoffset, self.blocksz)
    }

    /// Return `FileOffset` (byte offset) at given `BlockOffset`.
    #[inline(always)]
    pub const fn file_offset_at_block_offset(
        blockoffset: BlockOffset,
        blocksz: BlockSz,
    ) -> FileOffset {
        (blockoffset * blocksz) as FileOffset
    }

    /// Return `FileOffset` (byte offset) at given `BlockOffset`
    /// (using `self.blocksz`).
    #[inline(always)]
    pub const fn file_offset_at_block_offset_self(
        &self,
        blockoffset: BlockOffset,
    ) -> FileOffset {
        BlockReader::file_offset_at_block_offset(blockoffset, self.blocksz)
    }

    /// Return `BlockIndex` (byte offset into a `Block`) for the `Block` that
    /// corresponds to the passed `FileOffset`.
    #[inline(always)]
    pub const fn block_index_at_file_offset(
        fileoffset: FileOffset,
        blocksz: BlockSz,
    ) -> BlockIndex {
        (fileoffset
            - BlockReader::file_offset_at_block_offset(
                BlockReader::block_offset_at_file_offset(fileoffset, blocksz),
                blocksz,
            )) as BlockIndex
    }

    /// Return `BlockIndex` for the passed `FileOffset` (using
    /// `self.blocksz`).
    #[inline(always)]
    pub const fn block_index_at_file_offset_self(
        &self,
        fileoffset: FileOffset,
    ) -> BlockIndex {
        BlockReader::block_index_at_file_offset(fileoffset, self.blocksz)
    }

    /// Return `Count` of `Block`s based on the `FileSz`.
    #[inline(always)]
    pub const fn count_blocks(
        filesz: FileSz,
        blocksz: BlockSz,
    ) -> Count {
        filesz / blocksz + (if filesz % blocksz > 0 { 1 } else { 0 })
    }

    /// The last valid `BlockOffset` for the file (inclusive).
    #[inline(always)]
    pub const fn blockoffset_last(&self) -> BlockOffset {
        if self.filesz == 0 {
            return 0;
        }
        (BlockReader::count_blocks(self.filesz, self.blocksz) as BlockOffset) - 1
    }

    /// Specific `BlockSz` (size in bytes) of block at `BlockOffset`.
    ///
    /// This is `self.blocksz` for all `Block`s except the last, which is
    /// `>0` and `<=self.blocksz`.
    pub const fn blocksz_at_blockoffset(
        &self,
        blockoffset: BlockOffset,
    ) -> BlockSz {
        if self.filesz == 0 {
            return 0;
        }
        if blockoffset == self.blockoffset_last() {
            let remainder = self.filesz % self.blocksz;
            if remainder != 0 {
                return remainder;
            }
        }

        self.blocksz
    }

    /// Read the [`Block`] at `BlockOffset`.
    ///
    /// Returns [`Done`] if `blockoffset` is past the last block.
    /// All `std::io` errors are returned in [`Err`].
    ///
    /// [`Done`]: crate::common::ResultS3
    /// [`Err`]: crate::common::ResultS3
    pub fn read_block(
        &mut self,
        blockoffset: BlockOffset,
    ) -> ResultReadBlock {
        if self.filesz == 0 || blockoffset > self.blockoffset_last() {
            defñ!("({}) is past blockoffset_last {}; return Done", blockoffset, self.blockoffset_last());
            return ResultReadBlock::Done;
        }
        // check fast LRU cache
        if let Some(bp) = self.read_block_lru_cache.get(&blockoffset) {
            self.read_block_cache_lru_hit += 1;
            defñ!("({}) return Found; hit LRU cache", blockoffset);
            return ResultReadBlock::Found(bp.clone());
        }
        self.read_block_cache_lru_miss += 1;

        let seek: FileOffset = self.file_offset_at_block_offset_self(blockoffset);
        let blocksz: BlockSz = self.blocksz_at_blockoffset(blockoffset);
        defn!("({}): seek {}, read {} bytes", blockoffset, seek, blocksz);
        if let Err(err) = self.file.seek(SeekFrom::Start(seek)) {
            defx!("file.seek({}) error {}", seek, err);
            return ResultReadBlock::Err(Error::io(&self.path, err));
        }
        let mut block: Block = vec![0; blocksz as usize];
        if let Err(err) = self.file.read_exact(&mut block) {
            defx!("file.read_exact({} bytes) error {}", blocksz, err);
            return ResultReadBlock::Err(Error::io(&self.path, err));
        }
        self.count_bytes += blocksz;
        self.count_blocks_read += 1;
        let blockp: BlockP = BlockP::new(block);
        self.read_block_lru_cache.put(blockoffset, blockp.clone());
        defx!("({}) return Found; read {} bytes", blockoffset, blocksz);

        ResultReadBlock::Found(blockp)
    }

    /// Read the [`Block`] holding `fileoffset`; a read past the end is
    /// [`Error::OffsetOutOfRange`].
    pub fn read_block_at_file_offset(
        &mut self,
        fileoffset: FileOffset,
    ) -> Result<BlockP> {
        let blockoffset = self.block_offset_at_file_offset_self(fileoffset);
        match self.read_block(blockoffset) {
            ResultReadBlock::Found(blockp) => Ok(blockp),
            ResultReadBlock::Done => Err(Error::OffsetOutOfRange {
                path: self.path.clone(),
                offset: fileoffset,
                filesz: self.filesz,
            }),
            ResultReadBlock::Err(err) => Err(err),
        }
    }

    /// Read the bytes at file offsets `[beg, end)`.
    pub fn read_data(
        &mut self,
        beg: FileOffset,
        end: FileOffset,
    ) -> Result<Bytes> {
        defn!("({}, {})", beg, end);
        debug_assert_le!(beg, end, "bad range");
        debug_assert_le!(end, self.filesz, "end past filesz");
        let mut data: Bytes = Bytes::with_capacity((end.saturating_sub(beg)) as usize);
        let mut at: FileOffset = beg;
        while at < end {
            let blockp: BlockP = self.read_block_at_file_offset(at)?;
            let index_beg: BlockIndex = self.block_index_at_file_offset_self(at);
            let block_fileoffset: FileOffset =
                self.file_offset_at_block_offset_self(self.block_offset_at_file_offset_self(at));
            let index_end: BlockIndex = (std::cmp::min(end - block_fileoffset, blockp.len() as u64)) as BlockIndex;
            debug_assert_lt!(index_beg, index_end, "empty slice of block");
            data.extend_from_slice(&blockp[index_beg..index_end]);
            at = block_fileoffset + index_end as FileOffset;
        }
        defx!("return {} bytes", data.len());

        Ok(data)
    }

    pub fn summary(&self) -> SummaryBlockReader {
        SummaryBlockReader {
            blockreader_bytes: self.count_bytes,
            blockreader_blocks: self.count_blocks_read,
            blockreader_blocks_total: self.blockn,
            blockreader_blocksz: self.blocksz,
            blockreader_filesz: self.filesz,
            blockreader_read_block_lru_cache_hit: self.read_block_cache_lru_hit,
            blockreader_read_block_lru_cache_miss: self.read_block_cache_lru_miss,
        }
    }
}
