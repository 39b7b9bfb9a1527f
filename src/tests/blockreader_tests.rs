// src/tests/blockreader_tests.rs

#![allow(non_snake_case)]

use crate::common::{FPath, FileOffset, ResultS3};
use crate::debug::helpers::{create_temp_file, ntf_fpath, NamedTempFile};
use crate::error::Error;
use crate::readers::blockreader::{
    BlockOffset,
    BlockReader,
    BlockSz,
    BLOCKSZ_MAX,
    READ_BLOCK_LRU_CACHE_SZ,
};
use crate::readers::helpers::randomize;

use ::lazy_static::lazy_static;
use ::test_case::test_case;

lazy_static! {
    static ref NTF_EMPTY: NamedTempFile = create_temp_file("");
    static ref NTF_EMPTY_PATH: FPath = ntf_fpath(&NTF_EMPTY);
    static ref NTF_1BYTE: NamedTempFile = create_temp_file("A");
    static ref NTF_1BYTE_PATH: FPath = ntf_fpath(&NTF_1BYTE);
    static ref NTF_3BYTE: NamedTempFile = create_temp_file("ABC");
    static ref NTF_3BYTE_PATH: FPath = ntf_fpath(&NTF_3BYTE);
    static ref NTF_ALPHABET: NamedTempFile = create_temp_file("abcdefghijklmnopqrstuvwxyz\n");
    static ref NTF_ALPHABET_PATH: FPath = ntf_fpath(&NTF_ALPHABET);
}

/// helper wrapper to create a new BlockReader
fn new_BlockReader(
    path: &FPath,
    blocksz: BlockSz,
) -> BlockReader {
    match BlockReader::new(path.clone(), blocksz, READ_BLOCK_LRU_CACHE_SZ) {
        Ok(val) => val,
        Err(err) => panic!("ERROR: BlockReader::new({:?}, {}) failed {}", path, blocksz, err),
    }
}

#[test]
fn test_new_file_missing() {
    let result = BlockReader::new(FPath::from("/does/not/exist/lcs"), 2, READ_BLOCK_LRU_CACHE_SZ);
    assert!(matches!(result, Err(Error::Io { .. })));
}

#[test]
fn test_new_clamps_blocksz() {
    let br = new_BlockReader(&NTF_3BYTE_PATH, BLOCKSZ_MAX + 1);
    assert_eq!(br.blocksz(), BLOCKSZ_MAX);
}

#[test_case(0, 2, 0)]
#[test_case(1, 2, 1)]
#[test_case(2, 2, 1)]
#[test_case(3, 2, 2)]
#[test_case(27, 4, 7)]
fn test_count_blocks(
    filesz: u64,
    blocksz: BlockSz,
    expect: u64,
) {
    assert_eq!(BlockReader::count_blocks(filesz, blocksz), expect);
}

#[test_case(NTF_EMPTY_PATH.clone(), 2, 0, 0; "empty 2 0 0")]
#[test_case(NTF_1BYTE_PATH.clone(), 2, 0, 1; "1byte 2 0 1")]
#[test_case(NTF_3BYTE_PATH.clone(), 2, 0, 2; "3byte 2 0 2")]
#[test_case(NTF_3BYTE_PATH.clone(), 2, 1, 1; "3byte 2 1 1")]
#[test_case(NTF_ALPHABET_PATH.clone(), 4, 6, 3; "alphabet 4 6 3")]
fn test_blocksz_at_blockoffset(
    path: FPath,
    blocksz: BlockSz,
    blockoffset: BlockOffset,
    expect: BlockSz,
) {
    let br = new_BlockReader(&path, blocksz);
    assert_eq!(br.blocksz_at_blockoffset(blockoffset), expect);
}

#[test]
fn test_read_block_done() {
    let mut br = new_BlockReader(&NTF_3BYTE_PATH, 2);
    assert!(br.read_block(0).is_found());
    assert!(br.read_block(1).is_found());
    assert!(br.read_block(2).is_done());
    let mut br = new_BlockReader(&NTF_EMPTY_PATH, 2);
    assert!(br.read_block(0).is_done());
}

#[test]
fn test_read_block_lru_cache() {
    let mut br = new_BlockReader(&NTF_ALPHABET_PATH, 4);
    for _ in 0..3 {
        match br.read_block(1) {
            ResultS3::Found(blockp) => assert_eq!(blockp.as_slice(), b"efgh"),
            _ => panic!("read_block(1) not Found"),
        }
    }
    let summary = br.summary();
    assert_eq!(summary.blockreader_read_block_lru_cache_miss, 1);
    assert_eq!(summary.blockreader_read_block_lru_cache_hit, 2);
    assert_eq!(summary.blockreader_blocks, 1);
    assert_eq!(summary.blockreader_blocks_total, 7);
}

#[test_case(1)]
#[test_case(2)]
#[test_case(3)]
#[test_case(5)]
#[test_case(64)]
fn test_read_data(blocksz: BlockSz) {
    let data: &[u8] = b"abcdefghijklmnopqrstuvwxyz\n";
    let mut br = new_BlockReader(&NTF_ALPHABET_PATH, blocksz);
    assert_eq!(br.read_data(0, 27).unwrap(), data.to_vec());
    assert_eq!(br.read_data(3, 11).unwrap(), data[3..11].to_vec());
    assert_eq!(br.read_data(26, 27).unwrap(), b"\n".to_vec());
    assert!(br.read_data(5, 5).unwrap().is_empty());
}

/// read every byte in random order; each read agrees with the file
#[test_case(1)]
#[test_case(3)]
#[test_case(8)]
fn test_read_data_random_order(blocksz: BlockSz) {
    let data: &[u8] = b"abcdefghijklmnopqrstuvwxyz\n";
    let mut br = new_BlockReader(&NTF_ALPHABET_PATH, blocksz);
    let mut offsets: Vec<FileOffset> = (0..data.len() as FileOffset).collect();
    randomize(&mut offsets);
    for fo in offsets.into_iter() {
        let byte = br.read_data(fo, fo + 1).unwrap();
        assert_eq!(byte, vec![data[fo as usize]], "offset {}", fo);
    }
}

#[test]
fn test_read_block_at_file_offset_out_of_range() {
    let mut br = new_BlockReader(&NTF_3BYTE_PATH, 2);
    assert!(matches!(br.read_block_at_file_offset(4), Err(Error::OffsetOutOfRange { .. })));
}
