use std::future::Future;

use volley_common::{Method, RequestFailure, RunConfig, POST_PAYLOAD};

/// Everything about the outgoing request that is fixed for the whole run,
/// resolved once so the dispatch path does no per-request URI or payload work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPlan {
    pub method: Method,
    pub url: String,
    pub expect_continue: Option<bool>,
}

impl RequestPlan {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            method: config.method,
            url: config.target.clone(),
            expect_continue: config.expect_continue,
        }
    }
}

/// The engine's view of an HTTP client in the cooperative-task model:
/// send one request, suspend until it completes or fails. Handles are shared
/// concurrently by many workers and pool connections internally.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, plan: &RequestPlan)
        -> impl Future<Output = Result<(), RequestFailure>> + Send;
}

/// The OS-thread model's counterpart: the call blocks the worker's thread.
pub trait BlockingTransport: Send + Sync + 'static {
    fn send(&self, plan: &RequestPlan) -> Result<(), RequestFailure>;
}

/// Fixed-size set of independent client handles, index `0..count`.
/// Built once per run and owned by the dispatch engine for its duration.
pub struct ClientPool<T> {
    clients: Vec<T>,
}

impl<T> ClientPool<T> {
    pub fn new(clients: Vec<T>) -> Self {
        Self { clients }
    }

    pub fn build(count: usize, make: impl Fn() -> T) -> Self {
        Self {
            clients: (0..count).map(|_| make()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn client(&self, index: usize) -> &T {
        &self.clients[index]
    }
}

/// Production transport for the cooperative-task model.
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpClient {
    fn send(
        &self,
        plan: &RequestPlan,
    ) -> impl Future<Output = Result<(), RequestFailure>> + Send {
        let request = match plan.method {
            Method::Get => self.inner.get(&plan.url),
            Method::Post => {
                let mut request = self.inner.post(&plan.url).body(POST_PAYLOAD);
                // reqwest sends no Expect header by default, so only the
                // opt-in arm needs to touch the request.
                if plan.expect_continue == Some(true) {
                    request = request.header(reqwest::header::EXPECT, "100-continue");
                }
                request
            }
        };
        async move {
            let response = request
                .send()
                .await
                .map_err(|e| RequestFailure::Transport(e.to_string()))?;
            let status = response.status();
            // Drain the body so the connection goes back to the pool.
            let _ = response
                .bytes()
                .await
                .map_err(|e| RequestFailure::Transport(e.to_string()))?;
            if status.is_success() {
                Ok(())
            } else {
                Err(RequestFailure::Status(status.as_u16()))
            }
        }
    }
}

/// Production transport for the OS-thread model. Must be constructed and
/// dropped off the async runtime; reqwest's blocking client may not live on
/// a runtime thread.
pub struct BlockingHttpClient {
    inner: reqwest::blocking::Client,
}

impl BlockingHttpClient {
    pub fn new() -> Self {
        Self {
            inner: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for BlockingHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockingTransport for BlockingHttpClient {
    fn send(&self, plan: &RequestPlan) -> Result<(), RequestFailure> {
        let request = match plan.method {
            Method::Get => self.inner.get(&plan.url),
            Method::Post => {
                let mut request = self.inner.post(&plan.url).body(POST_PAYLOAD);
                if plan.expect_continue == Some(true) {
                    request = request.header(reqwest::header::EXPECT, "100-continue");
                }
                request
            }
        };
        let response = request
            .send()
            .map_err(|e| RequestFailure::Transport(e.to_string()))?;
        let status = response.status();
        let _ = response
            .bytes()
            .map_err(|e| RequestFailure::Transport(e.to_string()))?;
        if status.is_success() {
            Ok(())
        } else {
            Err(RequestFailure::Status(status.as_u16()))
        }
    }
}
