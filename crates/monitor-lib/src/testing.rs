//! In-memory collaborators for unit tests

use crate::collector::{
    async_trait, ContainerEntry, ContainerRuntime, HttpProber, MetricsStore, QueryData,
    QueryResponse, QueryResult, Sample,
};
use crate::error::ProbeFailure;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted reply for a fake collaborator
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Fail(ProbeFailure),
    /// Sleep this long, then answer
    Delay(Duration, T),
}

impl<T: Clone> Reply<T> {
    async fn resolve(&self) -> Result<T, ProbeFailure> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Fail(failure) => Err(failure.clone()),
            Reply::Delay(delay, value) => {
                tokio::time::sleep(*delay).await;
                Ok(value.clone())
            }
        }
    }
}

#[derive(Default)]
pub struct FakeHttp {
    replies: HashMap<String, Reply<u16>>,
    pub calls: AtomicUsize,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, url: &str, reply: Reply<u16>) -> Self {
        self.replies.insert(url.to_string(), reply);
        self
    }

    pub fn status(self, url: &str, status: u16) -> Self {
        self.reply(url, Reply::Ok(status))
    }
}

#[async_trait]
impl HttpProber for FakeHttp {
    async fn get_status(&self, url: &str, _timeout: Duration) -> Result<u16, ProbeFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.get(url) {
            Some(reply) => reply.resolve().await,
            None => Err(ProbeFailure::Transport(format!("connection refused: {url}"))),
        }
    }
}

#[derive(Default)]
pub struct FakeRuntime {
    replies: HashMap<String, Reply<Vec<ContainerEntry>>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, filter: &str, reply: Reply<Vec<ContainerEntry>>) -> Self {
        self.replies.insert(filter.to_string(), reply);
        self
    }

    /// `running` containers named `<filter>-<n>`, all up
    pub fn running(self, filter: &str, running: usize) -> Self {
        let entries = (0..running)
            .map(|n| ContainerEntry::new(format!("{filter}-{n}"), "Up 1 hour"))
            .collect();
        self.reply(filter, Reply::Ok(entries))
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list(
        &self,
        name_filter: &str,
        _timeout: Duration,
    ) -> Result<Vec<ContainerEntry>, ProbeFailure> {
        match self.replies.get(name_filter) {
            Some(reply) => reply.resolve().await,
            None => Ok(Vec::new()),
        }
    }
}

/// Runtime whose running count can change between cycles
pub struct AdjustableRuntime {
    running: AtomicUsize,
}

impl AdjustableRuntime {
    pub fn new(running: usize) -> Self {
        Self {
            running: AtomicUsize::new(running),
        }
    }

    pub fn set(&self, running: usize) {
        self.running.store(running, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContainerRuntime for AdjustableRuntime {
    async fn list(
        &self,
        name_filter: &str,
        _timeout: Duration,
    ) -> Result<Vec<ContainerEntry>, ProbeFailure> {
        let running = self.running.load(Ordering::SeqCst);
        Ok((0..running)
            .map(|n| ContainerEntry::new(format!("{name_filter}-{n}"), "Up 5 minutes"))
            .collect())
    }
}

#[derive(Default)]
pub struct FakeStore {
    replies: HashMap<String, Reply<QueryResponse>>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, query: &str, reply: Reply<QueryResponse>) -> Self {
        self.replies.insert(query.to_string(), reply);
        self
    }

    pub fn values(self, query: &str, values: &[f64]) -> Self {
        self.reply(query, Reply::Ok(vector(values)))
    }
}

#[async_trait]
impl MetricsStore for FakeStore {
    async fn instant_query(
        &self,
        query: &str,
        _timeout: Duration,
    ) -> Result<QueryResponse, ProbeFailure> {
        self.queries.lock().unwrap().push(query.to_string());
        match self.replies.get(query) {
            Some(reply) => reply.resolve().await,
            None => Ok(vector(&[])),
        }
    }
}

/// Successful instant-vector response carrying `values`
pub fn vector(values: &[f64]) -> QueryResponse {
    QueryResponse::Success {
        data: QueryData {
            result_type: "vector".to_string(),
            result: QueryResult::Vector(
                values
                    .iter()
                    .map(|v| Sample {
                        labels: BTreeMap::new(),
                        value: Some((0.0, v.to_string())),
                    })
                    .collect(),
            ),
        },
    }
}
