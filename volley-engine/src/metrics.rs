use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// The run's shared counters: request budget gate, completion totals,
/// service-time accumulator, per-client queue depths, and the round-robin
/// cursor. Everything is a plain atomic mutated with `fetch_add`/`fetch_sub`;
/// the dispatch path never takes a lock.
///
/// Owned by the run and injected by `Arc` into the engine and the reporter,
/// so tests can drive several independent runs side by side.
pub struct CounterSet {
    issued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    service_nanos: AtomicU64,
    cursor: AtomicU64,
    queue_depths: Vec<AtomicU64>,
    client_completed: Vec<AtomicU64>,
}

/// Point-in-time view of the monotonic counters the reporter samples.
/// Reads are independent loads; a snapshot may be torn across counters,
/// which the reporter tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub completed: u64,
    pub service_nanos: u64,
}

impl CounterSet {
    pub fn new(client_count: usize) -> Self {
        Self {
            issued: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            service_nanos: AtomicU64::new(0),
            cursor: AtomicU64::new(0),
            queue_depths: (0..client_count).map(|_| AtomicU64::new(0)).collect(),
            client_completed: (0..client_count).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn client_count(&self) -> usize {
        self.queue_depths.len()
    }

    /// Claim the next request slot. Returns the request's sequence id, or
    /// `None` once the budget is exhausted.
    ///
    /// The increment happens first and is corrected with a single decrement
    /// when it oversteps, so the issued counter may transiently exceed the
    /// budget by up to one per live worker before settling back to exactly
    /// the budget at drain.
    pub fn try_claim(&self, budget: Option<u64>) -> Option<u64> {
        let seq = self.issued.fetch_add(1, Ordering::Relaxed);
        match budget {
            Some(limit) if seq >= limit => {
                self.issued.fetch_sub(1, Ordering::Relaxed);
                None
            }
            _ => Some(seq),
        }
    }

    /// Advance the shared round-robin cursor, returning its previous value.
    pub fn next_cursor(&self) -> u64 {
        self.cursor.fetch_add(1, Ordering::Relaxed)
    }

    pub fn enter_queue(&self, client: usize) {
        self.queue_depths[client].fetch_add(1, Ordering::Relaxed);
    }

    pub fn leave_queue(&self, client: usize) {
        self.queue_depths[client].fetch_sub(1, Ordering::Relaxed);
    }

    pub fn queue_depth(&self, client: usize) -> u64 {
        self.queue_depths[client].load(Ordering::Relaxed)
    }

    pub fn queue_depths(&self) -> Vec<u64> {
        self.queue_depths
            .iter()
            .map(|d| d.load(Ordering::Relaxed))
            .collect()
    }

    /// Record one finished request: latency into the service-time
    /// accumulator, completion totals, and the per-client tally. Failures
    /// count the same as successes everywhere except the failed total.
    pub fn record_completion(&self, client: usize, elapsed: Duration, failed: bool) {
        self.service_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
        self.client_completed[client].fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn service_nanos(&self) -> u64 {
        self.service_nanos.load(Ordering::Relaxed)
    }

    pub fn client_completed(&self) -> Vec<u64> {
        self.client_completed
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect()
    }

    /// The workers' and the reporter's shared termination condition.
    /// Unbounded runs never drain.
    pub fn drained(&self, budget: Option<u64>) -> bool {
        match budget {
            Some(limit) => self.completed() >= limit,
            None => false,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            completed: self.completed(),
            service_nanos: self.service_nanos(),
        }
    }
}
