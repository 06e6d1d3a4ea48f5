use proptest::prelude::*;
use seqstore::chunk::{read_chunk, write_chunk};
use seqstore::file_ops::{OpenFlags, StdFileOps};
use tempfile::NamedTempFile;

fn ops() -> StdFileOps {
    let tmp = NamedTempFile::new().unwrap();
    StdFileOps::open(tmp.path(), OpenFlags { create: true }).unwrap()
}

proptest! {
    #[test]
    fn prop_any_payload_round_trips_through_write_chunk_and_read_chunk(
        payload in proptest::collection::vec(any::<u8>(), 0..6000),
        start in 0u64..9000,
        compress in any::<bool>(),
    ) {
        let file_ops = ops();
        write_chunk(&file_ops, start, &payload, compress, false).unwrap();
        let back = read_chunk(&file_ops, start, false).unwrap();
        prop_assert_eq!(back, payload);
    }

    #[test]
    fn prop_a_sequence_of_chunks_written_back_to_back_all_round_trip(
        payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..500), 1..20),
    ) {
        let file_ops = ops();
        let mut offset = 0u64;
        let mut starts = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            starts.push(offset);
            let written = write_chunk(&file_ops, offset, payload, true, false).unwrap();
            offset += written;
        }
        for (payload, start) in payloads.iter().zip(starts.iter()) {
            let back = read_chunk(&file_ops, *start, false).unwrap();
            prop_assert_eq!(&back, payload);
        }
    }
}
