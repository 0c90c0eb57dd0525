//! Cross-thread tests for the ring channel and slot queue

use ipc::{ConcurrentSlotQueue, RingChannel};
use std::sync::Arc;
use std::thread;

const MESSAGES: u32 = 10_000;

#[test]
fn test_spsc_preserves_order_across_threads() {
    let channel: Arc<RingChannel<32, 16>> = Arc::new(RingChannel::new());

    let producer = {
        let channel = Arc::clone(&channel);
        thread::spawn(move || {
            for i in 0..MESSAGES {
                let bytes = i.to_le_bytes();
                while !channel.send(&bytes) {
                    thread::yield_now();
                }
            }
        })
    };

    let mut expected = 0u32;
    while expected < MESSAGES {
        match channel.recv() {
            Some(message) => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(message.as_bytes());
                assert_eq!(u32::from_le_bytes(raw), expected);
                expected += 1;
            }
            None => thread::yield_now(),
        }
    }

    producer.join().unwrap();
    assert!(channel.recv().is_none());
}

#[test]
fn test_mpsc_delivers_every_value_once() {
    const PRODUCERS: u64 = 4;
    const PER_PRODUCER: u64 = 2_000;

    let queue: Arc<ConcurrentSlotQueue<u64, 16>> = Arc::new(ConcurrentSlotQueue::new());

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    let mut value = (producer << 32) | seq;
                    loop {
                        match queue.try_send(value) {
                            Ok(()) => break,
                            Err(back) => {
                                value = back;
                                thread::yield_now();
                            }
                        }
                    }
                }
            })
        })
        .collect();

    let mut next_seq = vec![0u64; PRODUCERS as usize];
    let mut received = 0;
    while received < PRODUCERS * PER_PRODUCER {
        match queue.try_recv() {
            Some(value) => {
                let producer = (value >> 32) as usize;
                let seq = value & 0xffff_ffff;
                // Each producer's values arrive in the order it sent them.
                assert_eq!(seq, next_seq[producer]);
                next_seq[producer] += 1;
                received += 1;
            }
            None => thread::yield_now(),
        }
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(next_seq.iter().all(|&n| n == PER_PRODUCER));
    assert!(queue.try_recv().is_none());
}
