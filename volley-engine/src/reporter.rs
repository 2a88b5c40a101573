use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};

use crate::metrics::{CounterSet, Snapshot};

/// Throughput and latency figures derived from two counter snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickStats {
    pub total: u64,
    pub current_rps: f64,
    pub current_avg_latency_ms: f64,
    pub cumulative_rps: f64,
    pub cumulative_avg_latency_ms: f64,
}

impl TickStats {
    /// Delta math over monotonic counters: both deltas are never negative,
    /// and a zero request delta yields zero latency rather than a division
    /// by zero.
    pub fn compute(
        previous: &Snapshot,
        current: &Snapshot,
        interval_secs: f64,
        total_secs: f64,
    ) -> Self {
        let delta = current.completed - previous.completed;
        let delta_nanos = current.service_nanos - previous.service_nanos;
        Self {
            total: current.completed,
            current_rps: rate(delta, interval_secs),
            current_avg_latency_ms: average_ms(delta_nanos, delta),
            cumulative_rps: rate(current.completed, total_secs),
            cumulative_avg_latency_ms: average_ms(current.service_nanos, current.completed),
        }
    }
}

fn rate(requests: u64, secs: f64) -> f64 {
    if secs <= 0.0 {
        return 0.0;
    }
    requests as f64 / secs
}

fn average_ms(nanos: u64, requests: u64) -> f64 {
    if requests == 0 {
        return 0.0;
    }
    nanos as f64 / 1_000_000.0 / requests as f64
}

/// One tab-separated results line. This is the tool's output contract for
/// humans and log consumers; nothing in the system parses it back.
pub fn format_line(timestamp: &str, stats: &TickStats, queues: Option<&[u64]>) -> String {
    let mut line = format!(
        "{}\tTotal Requests\t{}\tCurrent RPS\t{:.0}\tCurrent Avg Latency (ms)\t{:.2}\tAverage RPS\t{:.0}\tAverage Latency (ms)\t{:.2}",
        timestamp,
        stats.total,
        stats.current_rps,
        stats.current_avg_latency_ms,
        stats.cumulative_rps,
        stats.cumulative_avg_latency_ms,
    );
    if let Some(depths) = queues {
        line.push_str(&format!("\tQueues\t{:?}", depths));
    }
    line
}

/// Samples the counter set once per second and prints a results line.
/// Reads never block workers; its loop condition is the same budget check
/// the workers use, so it converges to termination with the engine.
pub struct Reporter {
    counters: Arc<CounterSet>,
    budget: Option<u64>,
    verbose: bool,
}

impl Reporter {
    pub fn new(counters: Arc<CounterSet>, budget: Option<u64>, verbose: bool) -> Self {
        Self {
            counters,
            budget,
            verbose,
        }
    }

    pub async fn run(self) {
        let started = Instant::now();
        let mut previous = self.counters.snapshot();
        let mut previous_elapsed = Duration::ZERO;

        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await; // consume the immediate first tick

        while !self.counters.drained(self.budget) {
            interval.tick().await;

            let current = self.counters.snapshot();
            let elapsed = started.elapsed();
            let stats = TickStats::compute(
                &previous,
                &current,
                (elapsed - previous_elapsed).as_secs_f64(),
                elapsed.as_secs_f64(),
            );
            previous = current;
            previous_elapsed = elapsed;

            let queues = self.verbose.then(|| self.counters.queue_depths());
            let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            println!("{}", format_line(&timestamp, &stats, queues.as_deref()));
        }
    }
}
