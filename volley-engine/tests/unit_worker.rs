use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use volley_common::{ConcurrencyModel, Method, RequestFailure, RunConfig, SelectionPolicy};
use volley_engine::engine::Engine;
use volley_engine::metrics::CounterSet;
use volley_engine::policy::PolicyParams;
use volley_engine::pool::{BlockingTransport, ClientPool, RequestPlan, Transport};
use volley_engine::worker::{begin_dispatch, finish_dispatch};

/// Zero-latency transport that always succeeds, for both models.
struct InstantOk;

impl Transport for InstantOk {
    fn send(&self, _plan: &RequestPlan) -> impl Future<Output = Result<(), RequestFailure>> + Send {
        async { Ok(()) }
    }
}

impl BlockingTransport for InstantOk {
    fn send(&self, _plan: &RequestPlan) -> Result<(), RequestFailure> {
        Ok(())
    }
}

/// Zero-latency transport that always fails.
struct InstantFail;

impl Transport for InstantFail {
    fn send(&self, _plan: &RequestPlan) -> impl Future<Output = Result<(), RequestFailure>> + Send {
        async { Err(RequestFailure::Transport("synthetic failure".to_string())) }
    }
}

impl BlockingTransport for InstantFail {
    fn send(&self, _plan: &RequestPlan) -> Result<(), RequestFailure> {
        Err(RequestFailure::Transport("synthetic failure".to_string()))
    }
}

fn config(
    policy: SelectionPolicy,
    workers: usize,
    clients: usize,
    requests: Option<u64>,
) -> RunConfig {
    RunConfig {
        target: "http://127.0.0.1:8080/".to_string(),
        method: Method::Get,
        workers,
        clients,
        model: ConcurrencyModel::Task,
        policy,
        requests,
        expect_continue: None,
        tolerance: 1,
        seed: Some(42),
        verbose: false,
    }
}

fn engine(config: &RunConfig) -> (Engine, Arc<CounterSet>) {
    let config = Arc::new(config.clone());
    let counters = Arc::new(CounterSet::new(config.clients));
    (Engine::new(config, counters.clone()), counters)
}

#[test]
fn test_begin_dispatch_claims_and_raises_queue_depth() {
    let config = config(SelectionPolicy::TaskRoundRobin, 4, 2, Some(10));
    let counters = CounterSet::new(2);
    let params = PolicyParams::from_config(&config);
    let mut rng = SmallRng::seed_from_u64(0);

    let first = begin_dispatch(&counters, &config, 1, &params, &mut rng).unwrap();
    assert_eq!(first.seq, 0);
    assert_eq!(first.client, 1);
    assert_eq!(counters.queue_depths(), vec![0, 1]);

    let second = begin_dispatch(&counters, &config, 1, &params, &mut rng).unwrap();
    assert_eq!(second.seq, 1);
    assert_eq!(counters.queue_depths(), vec![0, 2]);
}

#[test]
fn test_finish_dispatch_settles_queue_and_records() {
    let config = config(SelectionPolicy::TaskRoundRobin, 4, 2, Some(10));
    let counters = CounterSet::new(2);
    let params = PolicyParams::from_config(&config);
    let mut rng = SmallRng::seed_from_u64(0);

    let dispatch = begin_dispatch(&counters, &config, 0, &params, &mut rng).unwrap();
    finish_dispatch(&counters, &dispatch, Duration::from_millis(4), false);

    assert_eq!(counters.queue_depths(), vec![0, 0]);
    assert_eq!(counters.completed(), 1);
    assert_eq!(counters.failed(), 0);
    assert_eq!(counters.service_nanos(), 4_000_000);
    assert_eq!(counters.client_completed(), vec![1, 0]);
}

#[test]
fn test_failed_dispatch_settles_the_same_way() {
    let config = config(SelectionPolicy::TaskRoundRobin, 4, 2, Some(10));
    let counters = CounterSet::new(2);
    let params = PolicyParams::from_config(&config);
    let mut rng = SmallRng::seed_from_u64(0);

    let dispatch = begin_dispatch(&counters, &config, 0, &params, &mut rng).unwrap();
    finish_dispatch(&counters, &dispatch, Duration::from_millis(1), true);

    assert_eq!(counters.queue_depths(), vec![0, 0]);
    assert_eq!(counters.completed(), 1);
    assert_eq!(counters.failed(), 1);
}

#[tokio::test]
async fn test_request_round_robin_scenario_is_exact() {
    // The reference scenario: 4 clients, 16 workers, budget 100, zero-latency
    // transport. Round-robin dispatch must split the budget exactly.
    let config = config(SelectionPolicy::RequestRoundRobin, 16, 4, Some(100));
    let (engine, counters) = engine(&config);

    let summary = engine.run_tasks(ClientPool::build(4, || InstantOk)).await;

    assert_eq!(summary.completed, 100);
    assert_eq!(summary.issued, 100);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.per_client_completed, vec![25, 25, 25, 25]);
    assert_eq!(counters.queue_depths(), vec![0, 0, 0, 0]);
}

#[tokio::test]
async fn test_thread_model_matches_task_model_totals() {
    let base = config(SelectionPolicy::RequestRoundRobin, 8, 2, Some(64));

    let (task_engine, task_counters) = engine(&base);
    let task_summary = task_engine.run_tasks(ClientPool::build(2, || InstantOk)).await;

    let mut threaded = base.clone();
    threaded.model = ConcurrencyModel::Thread;
    let (thread_engine, thread_counters) = engine(&threaded);
    let thread_summary = thread_engine
        .run_threads(|| ClientPool::build(2, || InstantOk))
        .await;

    assert_eq!(task_summary.completed, 64);
    assert_eq!(thread_summary.completed, task_summary.completed);
    assert_eq!(thread_summary.issued, task_summary.issued);
    assert_eq!(task_summary.per_client_completed, vec![32, 32]);
    assert_eq!(thread_summary.per_client_completed, vec![32, 32]);
    assert_eq!(task_counters.queue_depths(), vec![0, 0]);
    assert_eq!(thread_counters.queue_depths(), vec![0, 0]);
}

#[tokio::test]
async fn test_budget_overshoot_corrects_to_exactly_the_budget() {
    // Many more workers than budgeted requests: every worker that oversteps
    // must take its increment back.
    let config = config(SelectionPolicy::RequestRandom, 32, 2, Some(10));
    let (engine, counters) = engine(&config);

    let summary = engine.run_tasks(ClientPool::build(2, || InstantOk)).await;

    assert_eq!(summary.issued, 10);
    assert_eq!(summary.completed, 10);
    assert_eq!(counters.issued(), 10);
}

#[tokio::test]
async fn test_failures_count_as_completed_requests() {
    let config = config(SelectionPolicy::RequestRoundRobin, 8, 2, Some(40));
    let (engine, counters) = engine(&config);

    let summary = engine.run_tasks(ClientPool::build(2, || InstantFail)).await;

    assert_eq!(summary.completed, 40);
    assert_eq!(summary.failed, 40);
    assert_eq!(counters.queue_depths(), vec![0, 0]);
}

#[tokio::test]
async fn test_every_policy_drains_with_zero_queue_depth() {
    for policy in [
        SelectionPolicy::TaskRoundRobin,
        SelectionPolicy::TaskRandom,
        SelectionPolicy::RequestRoundRobin,
        SelectionPolicy::RequestRandom,
        SelectionPolicy::RequestShortestQueue,
        SelectionPolicy::RequestRandomNotLongestQueue,
        SelectionPolicy::RequestRandomTolerance,
    ] {
        let config = config(policy, 6, 3, Some(60));
        let (engine, counters) = engine(&config);

        let summary = engine.run_tasks(ClientPool::build(3, || InstantOk)).await;

        assert_eq!(summary.completed, 60, "policy {:?}", policy);
        assert_eq!(summary.issued, 60, "policy {:?}", policy);
        assert_eq!(
            summary.per_client_completed.iter().sum::<u64>(),
            60,
            "policy {:?}",
            policy
        );
        assert_eq!(counters.queue_depths(), vec![0, 0, 0], "policy {:?}", policy);
    }
}

#[tokio::test]
async fn test_same_seed_same_totals_across_models() {
    // The idempotence property: identical budget, policy, and seed produce
    // identical final counts under either concurrency model.
    for policy in [SelectionPolicy::TaskRandom, SelectionPolicy::RequestRandom] {
        let mut base = config(policy, 4, 2, Some(32));
        base.seed = Some(7);

        let (task_engine, _) = engine(&base);
        let task_summary = task_engine.run_tasks(ClientPool::build(2, || InstantOk)).await;

        base.model = ConcurrencyModel::Thread;
        let (thread_engine, _) = engine(&base);
        let thread_summary = thread_engine
            .run_threads(|| ClientPool::build(2, || InstantOk))
            .await;

        assert_eq!(task_summary.completed, 32);
        assert_eq!(thread_summary.completed, 32);
    }
}
