use std::process;
use std::sync::Arc;

use clap::Parser;
use volley_common::{ConcurrencyModel, Method, RunConfig, SelectionPolicy};
use volley_engine::engine::{Engine, RunSummary};
use volley_engine::metrics::CounterSet;
use volley_engine::pool::{BlockingHttpClient, ClientPool, HttpClient};
use volley_engine::reporter::Reporter;

#[derive(Parser, Debug)]
#[command(name = "volley", about = "Concurrent HTTP load-generation engine")]
struct Args {
    /// Target URI to drive
    #[arg(long, short = 'u')]
    uri: String,

    /// HTTP method: get | post
    #[arg(long, short = 'm', default_value = "get")]
    method: String,

    /// Number of concurrent logical workers
    #[arg(long, short = 'w', default_value_t = 64)]
    workers: usize,

    /// Number of pooled HTTP clients requests are dispatched across
    #[arg(long, short = 'c', default_value_t = 1)]
    clients: usize,

    /// Concurrency model: task | thread
    #[arg(long, default_value = "task")]
    model: String,

    /// Dispatch policy: task-round-robin | task-random | request-round-robin |
    /// request-random | request-shortest-queue |
    /// request-random-not-longest-queue | request-random-tolerance
    #[arg(long, default_value = "task-round-robin")]
    policy: String,

    /// Total request budget; omit to run until externally terminated
    #[arg(long, short = 'n')]
    requests: Option<u64>,

    /// Send `Expect: 100-continue` on POST (true | false); omit for the
    /// transport default
    #[arg(long)]
    expect_continue: Option<bool>,

    /// Queue-depth imbalance allowed by the tolerance policy
    #[arg(long, default_value_t = 1)]
    tolerance: u64,

    /// Seed for the per-worker random sources; omit for a fresh seed per run
    #[arg(long)]
    seed: Option<u64>,

    /// Per-request diagnostics and live queue-depth reporting
    #[arg(long, short = 'v', default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let method = Method::from_name(&args.method).unwrap_or_else(|| {
        eprintln!("Unknown method {:?}. Valid values: get, post", args.method);
        process::exit(3);
    });
    let model = ConcurrencyModel::from_name(&args.model).unwrap_or_else(|| {
        eprintln!("Unknown model {:?}. Valid values: task, thread", args.model);
        process::exit(3);
    });
    let policy = SelectionPolicy::from_name(&args.policy).unwrap_or_else(|| {
        eprintln!(
            "Unknown policy {:?}. Valid values: task-round-robin, task-random, \
             request-round-robin, request-random, request-shortest-queue, \
             request-random-not-longest-queue, request-random-tolerance",
            args.policy
        );
        process::exit(3);
    });

    let config = RunConfig {
        target: args.uri,
        method,
        workers: args.workers,
        clients: args.clients,
        model,
        policy,
        requests: args.requests,
        expect_continue: args.expect_continue,
        tolerance: args.tolerance,
        seed: args.seed,
        verbose: args.verbose,
    };
    if let Err(err) = config.validate() {
        eprintln!("Invalid configuration: {err}");
        process::exit(2);
    }

    init_tracing(config.verbose);

    println!(
        "{} {} with {} {}s across {} clients ({}) ...",
        config.method.as_name().to_uppercase(),
        config.target,
        config.workers,
        config.model.as_name(),
        config.clients,
        config.policy.as_name(),
    );

    let config = Arc::new(config);
    let counters = Arc::new(CounterSet::new(config.clients));
    let engine = Engine::new(config.clone(), counters.clone());

    let reporter = Reporter::new(counters.clone(), config.requests, config.verbose);
    let report_handle = tokio::spawn(reporter.run());

    let summary = match config.model {
        ConcurrencyModel::Task => {
            let pool = ClientPool::build(config.clients, HttpClient::new);
            engine.run_tasks(pool).await
        }
        ConcurrencyModel::Thread => {
            let clients = config.clients;
            engine
                .run_threads(move || ClientPool::build(clients, BlockingHttpClient::new))
                .await
        }
    };

    // The reporter drains on the same budget check as the workers.
    report_handle.await.ok();

    print_summary(&summary);
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(summary: &RunSummary) {
    println!("Volley Run Results");
    println!("==================");
    println!("Total requests:    {}", summary.completed);
    println!("Failed requests:   {}", summary.failed);
    println!("Elapsed:           {:.1} s", summary.elapsed.as_secs_f64());
    println!("Throughput:        {:.1} rps", summary.throughput_rps());
    println!("Average latency:   {:.2} ms", summary.average_latency_ms());
    println!("Per-client totals: {:?}", summary.per_client_completed);
}
