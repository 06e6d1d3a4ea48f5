//! Chunk codec.
//!
//! A chunk is a length-prefixed, CRC32-checked, optionally Snappy-compressed
//! payload written into the block stream at an absolute file offset. Data
//! chunks use the high bit of the length field as a compression flag; header
//! chunks never set it and always start on a block boundary.

use crate::block::{self, BLOCK_SIZE, MARKER_DATA, MARKER_HEADER};
use crate::errors::{StoreError, StoreResult};
use crate::file_ops::{pread_exact, pwrite_all, FileOps};

/// Payloads at or below this size are stored uncompressed; above it, Snappy
/// compression is attempted.
pub const SNAPPY_THRESHOLD: usize = 64;

const CHUNK_HEADER_LEN: u64 = 8;
const COMPRESSED_BIT: u32 = 0x8000_0000;

fn lead_marker_len(offset: u64) -> u64 {
    u64::from(offset % BLOCK_SIZE == 0)
}

/// Writes `payload` as a chunk at `offset` (which must be the caller's
/// tracked EOF) and returns the number of bytes appended, including any
/// inserted block markers and the chunk's own length/CRC prefix.
///
/// `compress` controls whether the payload is Snappy-compressed when larger
/// than [`SNAPPY_THRESHOLD`]; header chunks pass `false`.
///
/// # Errors
/// Returns `StoreError::Write` on I/O failure.
pub fn write_chunk(
    ops: &dyn FileOps,
    offset: u64,
    payload: &[u8],
    compress: bool,
    is_header: bool,
) -> StoreResult<u64> {
    let marker = if is_header { MARKER_HEADER } else { MARKER_DATA };
    if is_header {
        debug_assert_eq!(offset % BLOCK_SIZE, 0, "header chunks must start on a block boundary");
    }

    let (stored, compressed) = if compress && payload.len() > SNAPPY_THRESHOLD {
        let mut enc = snap::raw::Encoder::new();
        match enc.compress_vec(payload) {
            Ok(c) if c.len() < payload.len() => (c, true),
            _ => (payload.to_vec(), false),
        }
    } else {
        (payload.to_vec(), false)
    };

    let mut len_flag = stored.len() as u32;
    if compressed {
        len_flag |= COMPRESSED_BIT;
    }
    let crc = crc32fast::hash(&stored);

    let mut logical = Vec::with_capacity(CHUNK_HEADER_LEN as usize + stored.len());
    logical.extend_from_slice(&len_flag.to_be_bytes());
    logical.extend_from_slice(&crc.to_be_bytes());
    logical.extend_from_slice(&stored);

    let lead = lead_marker_len(offset);
    let content_start = offset + lead;
    let mut raw = Vec::with_capacity((lead + block::on_disk_len(content_start, logical.len() as u64)) as usize);
    if lead == 1 {
        raw.push(marker);
    }
    raw.extend_from_slice(&block::frame(&logical, content_start, marker));

    pwrite_all(ops, &raw, offset).map_err(|_| StoreError::Write)?;
    Ok(raw.len() as u64)
}

/// Reads and decodes the chunk at `offset`.
///
/// # Errors
/// `StoreError::Read` on short/failed reads, `StoreError::ChecksumFail` if
/// the CRC does not match, or `StoreError::ParseTerm` if a header chunk's
/// leading marker byte is not `0x01` (or a data chunk's is not `0x00`) when
/// the chunk happens to start on a block boundary.
pub fn read_chunk(ops: &dyn FileOps, offset: u64, is_header: bool) -> StoreResult<Vec<u8>> {
    let marker = if is_header { MARKER_HEADER } else { MARKER_DATA };
    let lead = lead_marker_len(offset);
    if lead == 1 {
        let mut m = [0u8; 1];
        pread_exact(ops, &mut m, offset).map_err(|_| StoreError::Read)?;
        if m[0] != marker {
            return Err(StoreError::ParseTerm(format!("expected marker {marker:#x}, got {:#x}", m[0])));
        }
    }
    let content_start = offset + lead;

    let hdr_raw_len = block::on_disk_len(content_start, CHUNK_HEADER_LEN);
    let mut hdr_raw = vec![0u8; hdr_raw_len as usize];
    pread_exact(ops, &mut hdr_raw, content_start).map_err(|_| StoreError::Read)?;
    let hdr_logical = block::unframe(&hdr_raw, content_start, CHUNK_HEADER_LEN);

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&hdr_logical[0..4]);
    let len_flag = u32::from_be_bytes(len_bytes);
    let compressed = len_flag & COMPRESSED_BIT != 0 && !is_header;
    let stored_len = u64::from(len_flag & !COMPRESSED_BIT);

    let mut crc_bytes = [0u8; 4];
    crc_bytes.copy_from_slice(&hdr_logical[4..8]);
    let expected_crc = u32::from_be_bytes(crc_bytes);

    let payload_start = content_start + hdr_raw_len;
    let payload_raw_len = block::on_disk_len(payload_start, stored_len);
    let mut payload_raw = vec![0u8; payload_raw_len as usize];
    pread_exact(ops, &mut payload_raw, payload_start).map_err(|_| StoreError::Read)?;
    let stored = block::unframe(&payload_raw, payload_start, stored_len);

    if crc32fast::hash(&stored) != expected_crc {
        return Err(StoreError::ChecksumFail);
    }

    if compressed {
        let mut dec = snap::raw::Decoder::new();
        dec.decompress_vec(&stored).map_err(|e| StoreError::ParseTerm(e.to_string()))
    } else {
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_ops::{FileOps as _, OpenFlags, StdFileOps};
    use tempfile::NamedTempFile;

    fn ops() -> StdFileOps {
        let tmp = NamedTempFile::new().unwrap();
        StdFileOps::open(tmp.path(), OpenFlags { create: true }).unwrap()
    }

    #[test]
    fn small_payload_round_trips_uncompressed() {
        let ops = ops();
        let payload = vec![1u8, 2, 3, 4];
        let n = write_chunk(&ops, 1, &payload, true, false).unwrap();
        let back = read_chunk(&ops, 1, false).unwrap();
        assert_eq!(back, payload);
        assert!(n > payload.len() as u64);
    }

    #[test]
    fn exactly_threshold_is_uncompressed_above_may_compress() {
        let ops = ops();
        let at_threshold = vec![b'a'; SNAPPY_THRESHOLD];
        write_chunk(&ops, 1, &at_threshold, true, false).unwrap();
        let back = read_chunk(&ops, 1, false).unwrap();
        assert_eq!(back, at_threshold);

        let ops2 = ops();
        let above = vec![b'a'; SNAPPY_THRESHOLD + 1];
        write_chunk(&ops2, 1, &above, true, false).unwrap();
        let back2 = read_chunk(&ops2, 1, false).unwrap();
        assert_eq!(back2, above);
    }

    #[test]
    fn header_chunk_round_trips_at_block_boundary() {
        let ops = ops();
        let payload = b"header-payload".to_vec();
        let n = write_chunk(&ops, 0, &payload, false, true).unwrap();
        let back = read_chunk(&ops, 0, true).unwrap();
        assert_eq!(back, payload);
        assert!(n > payload.len() as u64);
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let ops = ops();
        let payload = vec![5u8; 200];
        write_chunk(&ops, 1, &payload, true, false).unwrap();
        // Flip a byte well inside the payload region.
        let mut buf = [0u8; 1];
        pread_exact(&ops, &mut buf, 20).unwrap();
        buf[0] ^= 0xFF;
        pwrite_all(&ops, &buf, 20).unwrap();
        assert!(matches!(read_chunk(&ops, 1, false), Err(StoreError::ChecksumFail)));
    }

    #[test]
    fn large_payload_spanning_many_blocks_round_trips() {
        let ops = ops();
        let payload: Vec<u8> = (0..(BLOCK_SIZE * 2 + 777) as usize).map(|i| (i % 200) as u8).collect();
        write_chunk(&ops, 1, &payload, true, false).unwrap();
        let back = read_chunk(&ops, 1, false).unwrap();
        assert_eq!(back, payload);
    }
}
