//! Fixed collaborators so the agent can be exercised without a live stack

use monitor_lib::collector::{
    async_trait, ContainerEntry, ContainerRuntime, HttpProber, MetricsStore, QueryData,
    QueryResponse, QueryResult,
};
use monitor_lib::{MonitorConfig, MonitorEngine, ProbeFailure, Target};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Answers 200 for every URL except the listed ones, which refuse connections
pub struct StaticHttp {
    down: HashSet<String>,
}

#[async_trait]
impl HttpProber for StaticHttp {
    async fn get_status(&self, url: &str, _timeout: Duration) -> Result<u16, ProbeFailure> {
        if self.down.contains(url) {
            Err(ProbeFailure::Transport("connection refused".into()))
        } else {
            Ok(200)
        }
    }
}

pub struct StaticRuntime(pub usize);

#[async_trait]
impl ContainerRuntime for StaticRuntime {
    async fn list(
        &self,
        name_filter: &str,
        _timeout: Duration,
    ) -> Result<Vec<ContainerEntry>, ProbeFailure> {
        Ok((0..self.0)
            .map(|n| ContainerEntry::new(format!("{name_filter}-{n}"), "Up 5 minutes"))
            .collect())
    }
}

pub struct EmptyStore;

#[async_trait]
impl MetricsStore for EmptyStore {
    async fn instant_query(
        &self,
        _query: &str,
        _timeout: Duration,
    ) -> Result<QueryResponse, ProbeFailure> {
        Ok(QueryResponse::Success {
            data: QueryData {
                result_type: "vector".into(),
                result: QueryResult::Vector(Vec::new()),
            },
        })
    }
}

pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        targets: vec![
            Target::http("app", "http://app/health"),
            Target::http("prometheus", "http://prometheus/-/healthy"),
            Target::http("loki", "http://loki/ready"),
            Target::http("grafana", "http://grafana/api/health"),
            Target::container_group("stack", "stack", 4),
        ],
        ..Default::default()
    }
}

/// Engine over `test_config` with the given URLs unreachable
pub fn engine_with_down(down: &[&str]) -> Arc<MonitorEngine> {
    let http = StaticHttp {
        down: down.iter().map(|u| u.to_string()).collect(),
    };
    let engine = MonitorEngine::builder(test_config())
        .http(Arc::new(http))
        .runtime(Arc::new(StaticRuntime(4)))
        .store(Arc::new(EmptyStore))
        .without_signals()
        .instance("agent-test")
        .build()
        .expect("test config is valid");
    Arc::new(engine)
}

pub fn test_engine() -> Arc<MonitorEngine> {
    engine_with_down(&[])
}
