use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use volley_common::RunConfig;

use crate::metrics::CounterSet;
use crate::policy::PolicyParams;
use crate::pool::{BlockingTransport, ClientPool, RequestPlan, Transport};
use crate::worker::{run_task_worker, run_thread_worker};

/// Final tallies of a bounded run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub issued: u64,
    pub completed: u64,
    pub failed: u64,
    pub service_nanos: u64,
    pub per_client_completed: Vec<u64>,
    pub elapsed: Duration,
}

impl RunSummary {
    fn collect(counters: &CounterSet, elapsed: Duration) -> Self {
        Self {
            issued: counters.issued(),
            completed: counters.completed(),
            failed: counters.failed(),
            service_nanos: counters.service_nanos(),
            per_client_completed: counters.client_completed(),
            elapsed,
        }
    }

    pub fn throughput_rps(&self) -> f64 {
        self.completed as f64 / self.elapsed.as_secs_f64()
    }

    pub fn average_latency_ms(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        self.service_nanos as f64 / 1_000_000.0 / self.completed as f64
    }
}

/// Owns the worker pool for one run: spawns the configured number of workers
/// under the chosen concurrency model, joins them at budget exhaustion, and
/// reports the final tallies.
pub struct Engine {
    config: Arc<RunConfig>,
    counters: Arc<CounterSet>,
}

impl Engine {
    pub fn new(config: Arc<RunConfig>, counters: Arc<CounterSet>) -> Self {
        Self { config, counters }
    }

    /// Run the configured worker count as cooperative tasks over `pool`.
    pub async fn run_tasks<T: Transport>(&self, pool: ClientPool<T>) -> RunSummary {
        let started = Instant::now();
        let pool = Arc::new(pool);
        let plan = Arc::new(RequestPlan::from_config(&self.config));
        let params = PolicyParams::from_config(&self.config);
        let mut seeder = self.seeder();

        let mut handles = Vec::with_capacity(self.config.workers);
        for index in 0..self.config.workers {
            handles.push(tokio::spawn(run_task_worker(
                index,
                seeder.gen(),
                self.config.clone(),
                params,
                self.counters.clone(),
                pool.clone(),
                plan.clone(),
            )));
        }
        for handle in handles {
            handle.await.expect("worker task panicked");
        }

        RunSummary::collect(&self.counters, started.elapsed())
    }

    /// Run the configured worker count as dedicated OS threads.
    ///
    /// The pool is built and dropped inside the blocking section, off the
    /// async runtime: reqwest's blocking client may not live on a runtime
    /// thread.
    pub async fn run_threads<T, F>(&self, build_pool: F) -> RunSummary
    where
        T: BlockingTransport,
        F: FnOnce() -> ClientPool<T> + Send + 'static,
    {
        let started = Instant::now();
        let plan = Arc::new(RequestPlan::from_config(&self.config));
        let params = PolicyParams::from_config(&self.config);
        let mut seeder = self.seeder();
        let seeds: Vec<u64> = (0..self.config.workers).map(|_| seeder.gen()).collect();

        let config = self.config.clone();
        let counters = self.counters.clone();
        tokio::task::spawn_blocking(move || {
            let pool = Arc::new(build_pool());
            let mut handles = Vec::with_capacity(seeds.len());
            for (index, seed) in seeds.into_iter().enumerate() {
                let config = config.clone();
                let counters = counters.clone();
                let pool = pool.clone();
                let plan = plan.clone();
                handles.push(std::thread::spawn(move || {
                    run_thread_worker(index, seed, config, params, counters, pool, plan)
                }));
            }
            for handle in handles {
                handle.join().expect("worker thread panicked");
            }
        })
        .await
        .expect("dispatch thread panicked");

        RunSummary::collect(&self.counters, started.elapsed())
    }

    /// Single seeded source that hands out the per-worker seeds; the workers
    /// themselves never share a random generator.
    fn seeder(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
