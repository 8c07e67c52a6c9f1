//! A reader polling the snapshot path while it is being rewritten must only
//! ever observe complete documents.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{Duration, FixedOffset, NaiveDate, TimeZone};
use rust_decimal::Decimal;

use spotalert_core::domain::{PriceSample, PriceSeries};
use spotalert_core::snapshot::{Snapshot, SnapshotPublisher};

fn series(base_cents: i64) -> PriceSeries {
    let offset = FixedOffset::east_opt(7200).unwrap();
    let origin = offset.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap();
    let step = Duration::minutes(15);
    let samples = (0..96)
        .map(|i| PriceSample::new(origin + step * i, Decimal::new(base_cents + i as i64, 2)))
        .collect();
    PriceSeries::new(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(), step, samples).unwrap()
}

#[test]
fn concurrent_reader_never_sees_partial_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prices.json");
    let publisher = SnapshotPublisher::new(&path);
    let generated = FixedOffset::east_opt(7200)
        .unwrap()
        .with_ymd_and_hms(2026, 10, 19, 14, 0, 0)
        .unwrap();
    publisher.publish(&series(0), "HU", generated).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let done = Arc::clone(&done);
        let path = path.clone();
        thread::spawn(move || {
            let mut reads = 0usize;
            while !done.load(Ordering::SeqCst) {
                let bytes = std::fs::read(&path).expect("snapshot path must always exist");
                let snap: Snapshot =
                    serde_json::from_slice(&bytes).expect("reader saw a partial snapshot");
                assert_eq!(snap.data.len(), 96);
                reads += 1;
            }
            reads
        })
    };

    for round in 1..200 {
        publisher.publish(&series(round * 100), "HU", generated).unwrap();
    }
    done.store(true, Ordering::SeqCst);

    let reads = reader.join().unwrap();
    assert!(reads > 0);
}
