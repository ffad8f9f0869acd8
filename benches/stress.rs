use std::time::{Duration, Instant};

use roomledger::{Booking, ConflictLedger, LedgerError, Resource, RoomKind, Span};

const HOUR: i64 = 3_600_000; // 1 hour in ms

const RESOURCES: usize = 20;
const ATTEMPTS: usize = 10_000;
const QUERIES: usize = 2_000;
// journal is capped, so only this many undos are available
const UNDOS: usize = roomledger::limits::MAX_HISTORY;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}us, p50={:.2}us, p95={:.2}us, p99={:.2}us, max={:.2}us",
        latencies.len(),
        avg.as_secs_f64() * 1e6,
        percentile(latencies, 50.0).as_secs_f64() * 1e6,
        percentile(latencies, 95.0).as_secs_f64() * 1e6,
        percentile(latencies, 99.0).as_secs_f64() * 1e6,
        latencies.last().unwrap().as_secs_f64() * 1e6,
    );
}

/// Deterministic spread of booking requests across resources and a year of
/// hour slots; roughly a third of attempts land on an occupied slot.
fn request(i: usize) -> (String, Span) {
    let resource = format!("R{:02}", i % RESOURCES);
    let slot = (i * 2_654_435_761) % (24 * 365);
    let start = slot as i64 * HOUR;
    let hours = 1 + (i % 3) as i64;
    (resource, Span::new(start, start + hours * HOUR))
}

fn main() {
    let mut ledger = ConflictLedger::new();
    for r in 0..RESOURCES {
        ledger
            .add_resource(Resource::new(format!("R{r:02}"), format!("Room {r}"), 10, RoomKind::Meeting))
            .expect("seed resource");
    }

    let mut creates = Vec::with_capacity(ATTEMPTS);
    let mut created = 0usize;
    let mut conflicts = 0usize;
    for i in 0..ATTEMPTS {
        let (resource, span) = request(i);
        let booking = Booking::new(format!("B{i}"), resource, span, "bench", "bench", 4);
        let t = Instant::now();
        match ledger.create_booking(booking) {
            Ok(_) => created += 1,
            Err(LedgerError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
        creates.push(t.elapsed());
    }

    let mut checks = Vec::with_capacity(QUERIES);
    for i in 0..QUERIES {
        let (resource, span) = request(i * 7);
        let t = Instant::now();
        let _ = ledger.check_conflicts(&resource, span, None).expect("check");
        checks.push(t.elapsed());
    }

    let mut gaps = Vec::with_capacity(QUERIES);
    for i in 0..QUERIES {
        let resource = format!("R{:02}", i % RESOURCES);
        let day = ((i * 31) % 365) as i64;
        let window = Span::new(day * 24 * HOUR, (day + 1) * 24 * HOUR);
        let t = Instant::now();
        let _ = ledger.find_available_slots(&resource, window, HOUR).expect("slots");
        gaps.push(t.elapsed());
    }

    let mut undos = Vec::with_capacity(UNDOS);
    for _ in 0..UNDOS {
        let t = Instant::now();
        ledger.undo().expect("undo");
        undos.push(t.elapsed());
    }

    println!(
        "stress: {created} created, {conflicts} conflicts, {} bookings held",
        ledger.stats().bookings
    );
    print_latency("create_booking", &mut creates);
    print_latency("check_conflicts", &mut checks);
    print_latency("find_available_slots", &mut gaps);
    print_latency("undo", &mut undos);
}
