//! Concurrency tests for the HSP stream: producers and a consumer on real
//! threads, FIFO delivery, end-of-stream after close.

use std::sync::Arc;
use std::thread;

use seedcore::core::blast_encoding::Strand;
use seedcore::core::blast_hits::{Hsp, HspList};
use seedcore::core::hsp_stream::HspStream;

fn list(s_idx: u32) -> HspList {
    let mut l = HspList::new(s_idx);
    l.hsps.push(Hsp {
        query_idx: 0,
        q_start: 0,
        q_end: 10,
        s_start: 0,
        s_end: 10,
        strand: Strand::Plus,
        score: 11,
    });
    l
}

#[test]
fn single_producer_fifo() {
    let stream = Arc::new(HspStream::new());
    let producer = {
        let stream = Arc::clone(&stream);
        thread::spawn(move || {
            for i in 0..200u32 {
                stream.write(list(i)).unwrap();
            }
            stream.close();
        })
    };

    let mut expected = 0u32;
    while let Some(l) = stream.read() {
        assert_eq!(l.s_idx, expected);
        expected += 1;
    }
    assert_eq!(expected, 200);
    producer.join().unwrap();
}

#[test]
fn multiple_producers_exact_union() {
    const PRODUCERS: u32 = 4;
    const PER_PRODUCER: u32 = 50;

    let stream = Arc::new(HspStream::with_capacity(8));
    let mut handles = Vec::new();
    for p in 0..PRODUCERS {
        let stream = Arc::clone(&stream);
        handles.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                while stream.need_wait() {
                    thread::yield_now();
                }
                stream.write(list(p * 1000 + i)).unwrap();
            }
        }));
    }

    let consumer = {
        let stream = Arc::clone(&stream);
        thread::spawn(move || {
            let mut seen = Vec::new();
            while let Some(l) = stream.read() {
                seen.push(l.s_idx);
            }
            seen
        })
    };

    for h in handles {
        h.join().unwrap();
    }
    stream.close();

    let mut seen = consumer.join().unwrap();
    seen.sort_unstable();
    let mut expected: Vec<u32> = (0..PRODUCERS)
        .flat_map(|p| (0..PER_PRODUCER).map(move |i| p * 1000 + i))
        .collect();
    expected.sort_unstable();
    assert_eq!(seen, expected);
}

#[test]
fn reader_blocks_until_close() {
    let stream = Arc::new(HspStream::new());
    let reader = {
        let stream = Arc::clone(&stream);
        thread::spawn(move || stream.read())
    };

    // Give the reader time to park on the empty stream.
    thread::sleep(std::time::Duration::from_millis(20));
    stream.write(list(7)).unwrap();
    assert_eq!(reader.join().unwrap().unwrap().s_idx, 7);

    let reader = {
        let stream = Arc::clone(&stream);
        thread::spawn(move || stream.read())
    };
    thread::sleep(std::time::Duration::from_millis(20));
    stream.close();
    assert!(reader.join().unwrap().is_none());
}

#[test]
fn queued_lists_survive_close() {
    let stream = HspStream::new();
    for i in 0..10 {
        stream.write(list(i)).unwrap();
    }
    stream.close();
    assert!(stream.write(list(99)).is_err());

    let mut drained = 0;
    while stream.read().is_some() {
        drained += 1;
    }
    assert_eq!(drained, 10);
}
