use seqstore::chunk::{read_chunk, write_chunk, SNAPPY_THRESHOLD};
use seqstore::errors::StoreError;
use seqstore::file_ops::{OpenFlags, StdFileOps};
use tempfile::NamedTempFile;

fn open_tmp() -> StdFileOps {
    let tmp = NamedTempFile::new().unwrap();
    StdFileOps::open(tmp.path(), OpenFlags { create: true }).unwrap()
}

fn open_tmp_with_path() -> (StdFileOps, NamedTempFile) {
    let tmp = NamedTempFile::new().unwrap();
    let ops = StdFileOps::open(tmp.path(), OpenFlags { create: true }).unwrap();
    (ops, tmp)
}

#[test]
fn a_payload_of_exactly_the_snappy_threshold_is_stored_uncompressed() {
    let ops = open_tmp();
    let payload = vec![b'x'; SNAPPY_THRESHOLD];
    let written = write_chunk(&ops, 0, &payload, true, false).unwrap();
    // Uncompressed storage means on-disk size is payload plus the fixed
    // 8-byte length/CRC prefix plus the leading block marker.
    assert_eq!(written, payload.len() as u64 + 8 + 1);
    assert_eq!(read_chunk(&ops, 0, false).unwrap(), payload);
}

#[test]
fn sixty_five_bytes_may_be_compressed() {
    let ops = open_tmp();
    // Highly repetitive so Snappy is guaranteed to shrink it.
    let payload = vec![b'y'; SNAPPY_THRESHOLD + 1];
    let written = write_chunk(&ops, 0, &payload, true, false).unwrap();
    assert!(written < payload.len() as u64 + 8 + 1);
    assert_eq!(read_chunk(&ops, 0, false).unwrap(), payload);
}

#[test]
fn a_header_is_never_compressed_regardless_of_payload_size() {
    let ops = open_tmp();
    // Commit always passes `compress = false` for headers; verify the
    // round trip holds for a payload well past the threshold anyway.
    let payload = vec![b'h'; SNAPPY_THRESHOLD * 8];
    let written = write_chunk(&ops, 0, &payload, false, true).unwrap();
    assert_eq!(written, payload.len() as u64 + 8 + 1);
    assert_eq!(read_chunk(&ops, 0, true).unwrap(), payload);
}

#[test]
fn a_chunk_starting_one_byte_past_a_block_boundary_round_trips() {
    let ops = open_tmp();
    // Pad out to one byte past the first block boundary before writing.
    let pad = vec![0u8; seqstore::block::BLOCK_SIZE as usize + 1];
    seqstore::file_ops::pwrite_all(&ops, &pad, 0).unwrap();
    let offset = seqstore::block::BLOCK_SIZE + 1;
    let payload = b"past the boundary".to_vec();
    write_chunk(&ops, offset, &payload, false, false).unwrap();
    assert_eq!(read_chunk(&ops, offset, false).unwrap(), payload);
}

#[test]
fn truncated_file_surfaces_as_a_read_error_not_a_panic() {
    let (ops, tmp) = open_tmp_with_path();
    let payload = vec![1u8; 200];
    write_chunk(&ops, 0, &payload, false, false).unwrap();
    let file = std::fs::OpenOptions::new().write(true).open(tmp.path()).unwrap();
    file.set_len(10).unwrap();
    assert!(matches!(read_chunk(&ops, 0, false), Err(StoreError::Read)));
}
