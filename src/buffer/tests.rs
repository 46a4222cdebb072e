//! Tests for staged buffer writes, the completion gate and release.

use std::{sync::Arc, thread};

use proptest::{collection::vec, prelude::*};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rstest::{fixture, rstest};

use super::{BufferError, StagedBuffer};
use crate::Checksum;

#[fixture]
fn big_data() -> Vec<u8> {
    let mut data = vec![0_u8; 3000];
    StdRng::seed_from_u64(0x5eed).fill(data.as_mut_slice());
    data
}

#[test]
fn new_buffer_is_empty_and_incomplete() {
    let buffer = StagedBuffer::new(100);
    assert_eq!(buffer.written(), 0);
    assert_eq!(buffer.capacity(), 100);
    assert!(!buffer.is_completed());
}

#[rstest]
#[case(100, false)]
#[case(5, true)]
fn initial_bytes_count_towards_completion(#[case] capacity: usize, #[case] completed: bool) {
    let buffer = StagedBuffer::with_initial(capacity, [0_u8, 1, 2, 3, 4]).expect("initial fits");
    assert_eq!(buffer.written(), 5);
    assert_eq!(buffer.capacity(), capacity);
    assert_eq!(buffer.is_completed(), completed);
}

#[test]
fn initial_bytes_larger_than_capacity_are_rejected() {
    let err = StagedBuffer::with_initial(2, [1_u8, 2, 3]).expect_err("must overflow");
    assert_eq!(
        err,
        BufferError::CapacityExceeded {
            attempted: 3,
            remaining: 2
        }
    );
}

#[test]
fn zero_capacity_never_completes() {
    let buffer = StagedBuffer::new(0);
    assert!(!buffer.is_completed());
    assert!(buffer.append([0_u8; 0]).is_ok());
    assert!(!buffer.is_completed());
    assert!(matches!(
        buffer.read(1),
        Err(BufferError::NotReadable { .. })
    ));
}

#[test]
fn append_fills_buffer() {
    let buffer = StagedBuffer::new(10);
    buffer
        .append([0_u8, 1, 2, 3, 4, 5, 6, 7, 8, 9])
        .expect("exact fit");
    assert_eq!(buffer.written(), 10);
    assert!(buffer.is_completed());
}

#[test]
fn append_after_completion_fails_and_keeps_state() {
    let buffer = StagedBuffer::new(10);
    buffer
        .append([0_u8, 1, 2, 3, 4, 5, 6, 7, 8, 9])
        .expect("exact fit");

    let err = buffer.append([0_u8]).expect_err("buffer is full");
    assert_eq!(
        err,
        BufferError::CapacityExceeded {
            attempted: 1,
            remaining: 0
        }
    );
    assert_eq!(buffer.written(), 10);
    assert_eq!(buffer.capacity(), 10);
    assert!(buffer.is_completed());
}

#[rstest]
fn append_in_chunks_preserves_order(big_data: Vec<u8>) {
    let buffer = StagedBuffer::new(big_data.len());
    for chunk in big_data.chunks(100) {
        buffer.append(chunk).expect("chunk fits");
    }
    assert!(buffer.is_completed());
    assert_eq!(buffer.to_vec().expect("live buffer"), big_data);
}

#[test]
fn to_vec_returns_partial_writes() {
    let buffer = StagedBuffer::new(10);
    assert!(buffer.to_vec().expect("live buffer").is_empty());
    buffer.append([0_u8, 1, 2, 3, 4, 5, 6, 7]).expect("fits");
    assert_eq!(buffer.to_vec().expect("live buffer").len(), 8);
    assert!(!buffer.is_completed());
}

#[test]
fn append_constrained_copies_sub_range() {
    let buffer = StagedBuffer::new(10);
    let data = [0_u8, 1, 2, 3, 4, 5, 6, 7, 8, 9];
    buffer
        .append_constrained(data, 2, Some(5))
        .expect("range fits");
    assert_eq!(buffer.to_vec().expect("live buffer"), vec![2, 3, 4, 5, 6]);
}

#[test]
fn append_constrained_defaults_to_rest_of_data() {
    let buffer = StagedBuffer::new(3);
    buffer
        .append_constrained([9_u8, 8, 7, 6, 5], 2, None)
        .expect("range fits");
    assert!(buffer.is_completed());
    assert_eq!(buffer.to_vec().expect("live buffer"), vec![7, 6, 5]);
}

#[test]
fn append_constrained_appends_after_existing_bytes() {
    let buffer =
        StagedBuffer::with_initial(20, [0_u8, 1, 2, 3, 4, 5, 6, 7, 8, 9]).expect("initial fits");
    let data = [10_u8, 121, 55, 32, 44, 56, 31, 46, 71, 88];
    buffer
        .append_constrained(data, 2, Some(5))
        .expect("range fits");
    let written = buffer.to_vec().expect("live buffer");
    assert_eq!(written.len(), 15);
    assert_eq!(written[4], 4);
    assert_eq!(written[10], 55);
    assert_eq!(written[14], 31);
}

#[test]
fn append_constrained_rejects_empty_data() {
    let buffer = StagedBuffer::new(10);
    let err = buffer
        .append_constrained([0_u8; 0], 2, Some(5))
        .expect_err("empty data is invalid");
    assert!(matches!(err, BufferError::InvalidArgument(_)));
}

#[test]
fn append_constrained_rejects_overflow() {
    let buffer = StagedBuffer::with_initial(10, [0_u8, 1, 2, 3, 4, 5, 6]).expect("initial fits");
    let err = buffer
        .append_constrained([0_u8, 1, 2, 3, 4, 5, 6, 7, 8, 9], 2, Some(8))
        .expect_err("range does not fit");
    assert!(matches!(err, BufferError::CapacityExceeded { .. }));
    assert_eq!(buffer.written(), 7);
}

#[test]
fn append_constrained_rejects_range_outside_source() {
    let buffer = StagedBuffer::new(10);
    let err = buffer
        .append_constrained([1_u8, 2, 3], 2, Some(4))
        .expect_err("range exceeds source");
    assert_eq!(
        err,
        BufferError::OutOfBounds {
            offset: 2,
            length: 4,
            available: 3
        }
    );
}

#[test]
fn read_before_completion_fails() {
    let buffer =
        StagedBuffer::with_initial(20, [0_u8, 1, 2, 3, 4, 5, 6, 7, 8, 9]).expect("initial fits");
    assert_eq!(
        buffer.read(5),
        Err(BufferError::NotReadable {
            written: 10,
            capacity: 20
        })
    );
    assert!(buffer.reset_position().is_err());
}

#[test]
fn read_returns_requested_length() {
    let buffer =
        StagedBuffer::with_initial(10, [0_u8, 1, 2, 3, 4, 5, 6, 7, 8, 9]).expect("initial fits");
    let bytes = buffer.read(5).expect("readable").expect("data left");
    assert_eq!(bytes.as_ref(), &[0, 1, 2, 3, 4]);
}

#[rstest]
fn read_in_pieces_yields_every_byte(big_data: Vec<u8>) {
    let buffer = StagedBuffer::with_initial(big_data.len(), &big_data).expect("initial fits");
    let mut collected = Vec::new();
    while let Some(piece) = buffer.read(1024).expect("readable") {
        assert!(piece.len() <= 1024);
        collected.extend_from_slice(&piece);
    }
    assert_eq!(collected, big_data);
}

#[rstest]
fn reset_position_rewinds_cursor(big_data: Vec<u8>) {
    let buffer = StagedBuffer::with_initial(big_data.len(), &big_data).expect("initial fits");
    let all = buffer
        .read(big_data.len())
        .expect("readable")
        .expect("data left");
    assert_eq!(all.len(), big_data.len());
    assert_eq!(buffer.read(1), Ok(None));

    buffer.reset_position().expect("complete buffer");
    let first = buffer.read(1).expect("readable").expect("data left");
    assert_eq!(first[0], big_data[0]);
}

#[rstest]
fn shrinking_truncates_written_bytes(big_data: Vec<u8>) {
    let buffer = StagedBuffer::with_initial(big_data.len(), &big_data).expect("initial fits");
    buffer.resize(1000).expect("live buffer");
    assert_eq!(buffer.capacity(), 1000);
    assert_eq!(buffer.written(), 1000);
    assert_eq!(buffer.to_vec().expect("live buffer"), big_data[..1000]);
    assert!(buffer.is_completed());
}

#[rstest]
fn growing_keeps_bytes_and_reopens_for_writes(big_data: Vec<u8>) {
    let buffer = StagedBuffer::with_initial(big_data.len(), &big_data).expect("initial fits");
    buffer.resize(5000).expect("live buffer");
    assert_eq!(buffer.written(), big_data.len());
    assert_eq!(buffer.to_vec().expect("live buffer"), big_data);
    assert!(!buffer.is_completed());
    buffer
        .append(vec![0_u8; 2000])
        .expect("grown buffer accepts writes");
    assert!(buffer.is_completed());
}

#[test]
fn resizing_to_written_makes_partial_buffer_readable() {
    let buffer = StagedBuffer::with_initial(8, [1_u8, 2, 3]).expect("initial fits");
    buffer.resize(buffer.written()).expect("live buffer");
    assert!(buffer.is_completed());
    assert_eq!(
        buffer.read(8).expect("readable").as_deref(),
        Some(&[1_u8, 2, 3][..])
    );
}

#[test]
fn resize_to_same_capacity_is_noop() {
    let buffer = StagedBuffer::with_initial(4, [1_u8, 2, 3, 4]).expect("initial fits");
    buffer.read(2).expect("readable");
    buffer.resize(4).expect("live buffer");
    assert_eq!(
        buffer.read(2).expect("readable").as_deref(),
        Some(&[3_u8, 4][..])
    );
}

#[rstest]
fn clone_is_independent(big_data: Vec<u8>) {
    let buffer = StagedBuffer::with_initial(big_data.len(), &big_data).expect("initial fits");
    let copy = buffer.try_clone().expect("live buffer");
    assert_eq!(copy.capacity(), buffer.capacity());
    assert_eq!(copy.written(), buffer.written());

    buffer.resize(10).expect("live buffer");
    buffer.release();
    assert_eq!(copy.to_vec().expect("copy unaffected"), big_data);
}

#[test]
fn clone_of_partial_buffer_stays_writable() {
    let buffer = StagedBuffer::with_initial(4, [1_u8]).expect("initial fits");
    let copy = buffer.try_clone().expect("live buffer");
    copy.append([2_u8, 3, 4]).expect("copy has room");
    assert!(copy.is_completed());
    assert_eq!(buffer.written(), 1);
}

#[test]
fn declared_capacity_is_not_allocated_up_front() {
    let buffer = StagedBuffer::new(usize::MAX);
    buffer.append(b"abc").expect("fits");
    assert_eq!(buffer.remaining(), usize::MAX - 3);
    assert!(!buffer.is_completed());

    buffer.resize(usize::MAX - 1).expect("live buffer");
    let copy = buffer.try_clone().expect("live buffer");
    assert_eq!(copy.capacity(), usize::MAX - 1);
    assert_eq!(copy.to_vec().expect("live buffer"), b"abc");

    buffer.resize(3).expect("live buffer");
    assert!(buffer.is_completed());
}

#[test]
fn checksum_covers_written_bytes_only() {
    let buffer = StagedBuffer::new(16);
    buffer.append(b"Hello").expect("fits");
    assert_eq!(buffer.checksum(), Ok(Checksum::of(b"Hello")));
    buffer.append(b" World.").expect("fits");
    assert_eq!(buffer.checksum(), Ok(Checksum::of(b"Hello World.")));
}

#[test]
fn released_buffer_rejects_every_operation() {
    let buffer = StagedBuffer::with_initial(3, [1_u8, 2, 3]).expect("initial fits");
    buffer.release();
    buffer.release();

    assert!(buffer.is_released());
    assert_eq!(buffer.capacity(), 0);
    assert_eq!(buffer.written(), 0);
    assert_eq!(buffer.remaining(), 0);
    assert!(!buffer.is_completed());
    assert_eq!(buffer.read(1), Err(BufferError::Disposed));
    assert_eq!(buffer.append([1_u8]), Err(BufferError::Disposed));
    assert_eq!(
        buffer.append_constrained([1_u8], 0, None),
        Err(BufferError::Disposed)
    );
    assert_eq!(buffer.to_vec(), Err(BufferError::Disposed));
    assert_eq!(buffer.reset_position(), Err(BufferError::Disposed));
    assert_eq!(buffer.resize(10), Err(BufferError::Disposed));
    assert_eq!(buffer.checksum(), Err(BufferError::Disposed));
    assert!(matches!(buffer.try_clone(), Err(BufferError::Disposed)));
    assert_eq!(buffer.into_bytes(), Err(BufferError::Disposed));
}

#[test]
fn concurrent_appends_fill_buffer_exactly() {
    let buffer = Arc::new(StagedBuffer::new(800));
    let writers: Vec<_> = (0_u8..8)
        .map(|writer| {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for _ in 0..10 {
                    buffer.append([writer; 10]).expect("room remains");
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer thread panicked");
    }

    assert!(buffer.is_completed());
    let bytes = buffer.to_vec().expect("live buffer");
    for writer in 0_u8..8 {
        assert_eq!(bytes.iter().filter(|byte| **byte == writer).count(), 100);
    }
    // Each append lands as one contiguous run.
    for run in bytes.chunks(10) {
        assert!(run.iter().all(|byte| *byte == run[0]));
    }
}

proptest! {
    #[test]
    fn written_never_exceeds_capacity(
        capacity in 0_usize..256,
        writes in vec(vec(any::<u8>(), 0..64), 0..16),
    ) {
        let buffer = StagedBuffer::new(capacity);
        for write in writes {
            let before = buffer.written();
            match buffer.append(&write) {
                Ok(()) => prop_assert_eq!(buffer.written(), before + write.len()),
                Err(BufferError::CapacityExceeded { .. }) => {
                    prop_assert!(before + write.len() > capacity);
                    prop_assert_eq!(buffer.written(), before);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
            prop_assert!(buffer.written() <= capacity);
            prop_assert_eq!(buffer.read(1).is_ok(), buffer.is_completed());
        }
    }

    #[test]
    fn shrinking_keeps_prefix(data in vec(any::<u8>(), 1..512), cut in 0_usize..512) {
        let cut = cut % data.len();
        let buffer = StagedBuffer::from_bytes(&data);
        buffer.resize(cut).expect("live buffer");
        prop_assert_eq!(buffer.to_vec().expect("live buffer"), data[..cut].to_vec());
    }
}
