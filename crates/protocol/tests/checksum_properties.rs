// Property tests for checksum coverage of the record payload

use proptest::prelude::*;
use protocol::crc::{checksum, Crc32};
use protocol::record::{frame_checksum, frame_crc, ERROR_OFFSET, PAYLOAD_SIZE};
use protocol::{OperationKind, OperationRecord};

fn any_kind() -> impl Strategy<Value = OperationKind> {
    prop_oneof![
        Just(OperationKind::Add),
        Just(OperationKind::Sub),
        Just(OperationKind::Mul),
        Just(OperationKind::Div),
        Just(OperationKind::Invalid),
    ]
}

fn any_request() -> impl Strategy<Value = OperationRecord> {
    (any_kind(), any::<i32>(), any::<i32>())
        .prop_map(|(kind, a, b)| OperationRecord::request(kind, a, b))
}

// Every checksummed byte except the error flag
fn covered_offset() -> impl Strategy<Value = usize> {
    (0..PAYLOAD_SIZE).prop_filter("error flag is not checksummed", |&i| i != ERROR_OFFSET)
}

proptest! {
    #[test]
    fn single_bit_flip_is_detected(record in any_request(), offset in covered_offset(), bit in 0u8..8) {
        let mut frame = record.encode();
        frame[offset] ^= 1 << bit;
        prop_assert_ne!(frame_checksum(&frame), frame_crc(&frame));
    }

    #[test]
    fn whole_byte_flip_is_detected(record in any_request(), offset in covered_offset()) {
        let mut frame = record.encode();
        frame[offset] ^= 0xFF;
        prop_assert_ne!(frame_checksum(&frame), frame_crc(&frame));
    }

    #[test]
    fn crc_field_flip_is_detected(record in any_request(), offset in PAYLOAD_SIZE..protocol::RECORD_SIZE) {
        let mut frame = record.encode();
        frame[offset] ^= 0xFF;
        prop_assert_ne!(frame_checksum(&frame), frame_crc(&frame));
    }

    #[test]
    fn checksum_is_deterministic(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        prop_assert_eq!(checksum(&bytes), checksum(&bytes));
    }

    #[test]
    fn sealed_requests_are_intact(record in any_request()) {
        prop_assert!(record.is_intact());
        let decoded = OperationRecord::decode(&record.encode()).unwrap();
        prop_assert_eq!(decoded, record);
    }

    #[test]
    fn checksum_matches_standard_crc32(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(checksum(&bytes), crc32fast::hash(&bytes));
    }

    #[test]
    fn incremental_register_matches_standard_crc32(
        bytes in proptest::collection::vec(any::<u8>(), 0..256),
        split in any::<prop::sample::Index>(),
    ) {
        let at = split.index(bytes.len() + 1);
        let mut crc = Crc32::new();
        crc.update(&bytes[..at]);
        crc.update(&bytes[at..]);
        prop_assert_eq!(crc.finalize(), crc32fast::hash(&bytes));
    }

    #[test]
    fn sealed_crc_matches_standard_crc32(record in any_request()) {
        let frame = record.encode();
        let mut payload = frame;
        payload[ERROR_OFFSET] = 0;
        prop_assert_eq!(frame_crc(&frame), crc32fast::hash(&payload[..PAYLOAD_SIZE]));
    }
}
