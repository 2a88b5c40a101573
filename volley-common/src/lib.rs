use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body sent with every POST request. Matches the payload the tool has
/// always used so result lines stay comparable across runs.
pub const POST_PAYLOAD: &str = r#"{ "data": "{'job_id':'c4bb6d130003','container_id':'ab7b85dcac72','status':'Success: process exited with code 0.'}" }"#;

/// HTTP method a run issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "get" => Some(Method::Get),
            "post" => Some(Method::Post),
            _ => None,
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
        }
    }
}

/// How workers are scheduled: cooperative tasks multiplexed over a small
/// thread pool, or one dedicated OS thread per worker. Both models produce
/// identical request counting, queue-depth bookkeeping, and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyModel {
    Task,
    Thread,
}

impl ConcurrencyModel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "task" => Some(ConcurrencyModel::Task),
            "thread" => Some(ConcurrencyModel::Thread),
            _ => None,
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            ConcurrencyModel::Task => "task",
            ConcurrencyModel::Thread => "thread",
        }
    }
}

/// Rule mapping a dispatch event to a client index.
///
/// `Task*` policies bind a worker to one client when the worker starts;
/// `Request*` policies decide per dispatch from shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    TaskRoundRobin,
    TaskRandom,
    RequestRoundRobin,
    RequestRandom,
    RequestShortestQueue,
    RequestRandomNotLongestQueue,
    RequestRandomTolerance,
}

impl SelectionPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "task-round-robin" => Some(SelectionPolicy::TaskRoundRobin),
            "task-random" => Some(SelectionPolicy::TaskRandom),
            "request-round-robin" => Some(SelectionPolicy::RequestRoundRobin),
            "request-random" => Some(SelectionPolicy::RequestRandom),
            "request-shortest-queue" => Some(SelectionPolicy::RequestShortestQueue),
            "request-random-not-longest-queue" => {
                Some(SelectionPolicy::RequestRandomNotLongestQueue)
            }
            "request-random-tolerance" => Some(SelectionPolicy::RequestRandomTolerance),
            _ => None,
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            SelectionPolicy::TaskRoundRobin => "task-round-robin",
            SelectionPolicy::TaskRandom => "task-random",
            SelectionPolicy::RequestRoundRobin => "request-round-robin",
            SelectionPolicy::RequestRandom => "request-random",
            SelectionPolicy::RequestShortestQueue => "request-shortest-queue",
            SelectionPolicy::RequestRandomNotLongestQueue => "request-random-not-longest-queue",
            SelectionPolicy::RequestRandomTolerance => "request-random-tolerance",
        }
    }
}

/// Invalid combination of run parameters, detected before any worker starts.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("target URI must not be empty")]
    EmptyTarget,

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("client count must be at least 1")]
    ZeroClients,

    #[error("policy {0} cannot exclude the longest queue with a single client")]
    SingleClientExclusion(String),

    #[error("policy {0} requires a tolerance of at least 1")]
    ZeroTolerance(String),

    #[error("expect-continue only applies to POST requests")]
    ExpectContinueWithoutBody,
}

/// A request attempt that did not complete successfully. Still counted as a
/// completed request for queue-depth and budget purposes; never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestFailure {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP status {0}")]
    Status(u16),
}

/// Immutable description of one run. Shared by reference across all workers
/// once the run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub target: String,
    pub method: Method,
    pub workers: usize,
    pub clients: usize,
    pub model: ConcurrencyModel,
    pub policy: SelectionPolicy,
    /// Total request budget; `None` runs until the process is terminated.
    pub requests: Option<u64>,
    /// `Some(true)` sends `Expect: 100-continue` on POST, `Some(false)`
    /// forces it off, `None` leaves the transport default.
    pub expect_continue: Option<bool>,
    /// Maximum permissible queue-depth imbalance, used only by
    /// `RequestRandomTolerance`.
    pub tolerance: u64,
    /// Seed for the run-level random source that hands out per-worker seeds.
    pub seed: Option<u64>,
    pub verbose: bool,
}

impl RunConfig {
    /// Reject parameter combinations under which a rejection-sampling policy
    /// could loop forever, or which make no sense at all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.is_empty() {
            return Err(ConfigError::EmptyTarget);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.clients == 0 {
            return Err(ConfigError::ZeroClients);
        }
        if self.policy == SelectionPolicy::RequestRandomNotLongestQueue && self.clients == 1 {
            return Err(ConfigError::SingleClientExclusion(
                self.policy.as_name().to_string(),
            ));
        }
        // With tolerance 0 and clients dividing workers, every client can sit
        // exactly at the ceiling and no index would ever qualify.
        if self.policy == SelectionPolicy::RequestRandomTolerance && self.tolerance == 0 {
            return Err(ConfigError::ZeroTolerance(self.policy.as_name().to_string()));
        }
        if self.expect_continue.is_some() && self.method == Method::Get {
            return Err(ConfigError::ExpectContinueWithoutBody);
        }
        Ok(())
    }
}
