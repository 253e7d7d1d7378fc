//! Tests for the probe batch collector
//!
//! These drive the collector through in-memory collaborators so the deadline
//! and classification rules can be checked without real services.

#[cfg(test)]
mod batch_tests {
    use crate::collector::{effective_timeout, ContainerEntry, ProbeCollector, QueryResponse};
    use crate::error::ProbeFailure;
    use crate::models::{ProbeErrorKind, Target};
    use crate::testing::{FakeHttp, FakeRuntime, FakeStore, Reply};
    use std::sync::Arc;
    use std::time::Duration;

    fn collector(http: FakeHttp, runtime: FakeRuntime, store: FakeStore) -> ProbeCollector {
        ProbeCollector::new(Arc::new(http), Arc::new(runtime), Arc::new(store))
    }

    #[test]
    fn test_effective_timeout_below_deadline() {
        let target = Target::http("app", "http://app").with_timeout(Duration::from_secs(10));
        let limit = effective_timeout(&target, Duration::from_secs(3));
        assert!(limit < Duration::from_secs(3));
        assert_eq!(limit, Duration::from_millis(2950));

        let short = Target::http("app", "http://app").with_timeout(Duration::from_millis(500));
        assert_eq!(
            effective_timeout(&short, Duration::from_secs(3)),
            Duration::from_millis(500)
        );
    }

    #[tokio::test]
    async fn test_one_result_per_target_in_order() {
        let targets = vec![
            Target::http("app", "http://app/health"),
            Target::container_group("stack", "stack", 2),
            Target::metric_query("up", "up"),
            Target::http("grafana", "http://grafana/api/health"),
        ];
        let http = FakeHttp::new()
            .status("http://app/health", 200)
            .status("http://grafana/api/health", 204);
        let runtime = FakeRuntime::new().running("stack", 2);
        let store = FakeStore::new().values("up", &[1.0]);

        let batch = collector(http, runtime, store)
            .collect(&targets, Duration::from_secs(3))
            .await;

        let names: Vec<_> = batch.results.iter().map(|r| r.target_name.as_str()).collect();
        assert_eq!(names, vec!["app", "stack", "up", "grafana"]);
        assert!(batch.results.iter().all(|r| r.reachable));
        assert_eq!(batch.results[1].count, Some(2));
        assert!(batch.results[0].latency.is_some());
    }

    #[tokio::test]
    async fn test_non_2xx_is_unreachable() {
        let targets = vec![Target::http("app", "http://app/health")];
        let http = FakeHttp::new().status("http://app/health", 500);

        let batch = collector(http, FakeRuntime::new(), FakeStore::new())
            .collect(&targets, Duration::from_secs(3))
            .await;

        let result = &batch.results[0];
        assert!(!result.reachable);
        assert_eq!(result.error, Some(ProbeErrorKind::Transport));
        assert!(result.detail.as_deref().unwrap_or_default().contains("500"));
    }

    #[tokio::test]
    async fn test_transport_error_captured() {
        let targets = vec![Target::http("loki", "http://loki/ready")];

        let batch = collector(FakeHttp::new(), FakeRuntime::new(), FakeStore::new())
            .collect(&targets, Duration::from_secs(3))
            .await;

        assert_eq!(batch.results[0].error, Some(ProbeErrorKind::Transport));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_probe_times_out_within_deadline() {
        let targets = vec![
            Target::http("hang", "http://hang/health").with_timeout(Duration::from_secs(10)),
            Target::http("app", "http://app/health"),
        ];
        let http = FakeHttp::new()
            .reply(
                "http://hang/health",
                Reply::Delay(Duration::from_secs(10), 200),
            )
            .status("http://app/health", 200);

        let started = tokio::time::Instant::now();
        let batch = collector(http, FakeRuntime::new(), FakeStore::new())
            .collect(&targets, Duration::from_secs(3))
            .await;

        assert!(started.elapsed() <= Duration::from_secs(3));
        assert_eq!(batch.results[0].error, Some(ProbeErrorKind::Timeout));
        assert!(!batch.results[0].reachable);
        assert!(batch.results[1].reachable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probes_run_concurrently() {
        let targets: Vec<_> = (0..5)
            .map(|n| Target::http(format!("svc-{n}"), format!("http://svc-{n}")))
            .collect();
        let http = (0..5).fold(FakeHttp::new(), |http, n| {
            http.reply(
                &format!("http://svc-{n}"),
                Reply::Delay(Duration::from_millis(800), 200),
            )
        });

        let started = tokio::time::Instant::now();
        let batch = collector(http, FakeRuntime::new(), FakeStore::new())
            .collect(&targets, Duration::from_secs(3))
            .await;

        // Sequential probing would need 4s
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(batch.results.iter().all(|r| r.reachable));
    }

    #[tokio::test]
    async fn test_container_group_counts_only_running() {
        let targets = vec![Target::container_group("stack", "stack", 3)];
        let runtime = FakeRuntime::new().reply(
            "stack",
            Reply::Ok(vec![
                ContainerEntry::new("prometheus", "Up 2 hours"),
                ContainerEntry::new("grafana", "Exited (1) 3 minutes ago"),
                ContainerEntry::new("loki", "running"),
            ]),
        );

        let batch = collector(FakeHttp::new(), runtime, FakeStore::new())
            .collect(&targets, Duration::from_secs(3))
            .await;

        assert!(batch.results[0].reachable);
        assert_eq!(batch.results[0].count, Some(2));
    }

    #[tokio::test]
    async fn test_container_runtime_failure() {
        let targets = vec![Target::container_group("stack", "stack", 3)];
        let runtime = FakeRuntime::new().reply(
            "stack",
            Reply::Fail(ProbeFailure::Transport("docker daemon not running".into())),
        );

        let batch = collector(FakeHttp::new(), runtime, FakeStore::new())
            .collect(&targets, Duration::from_secs(3))
            .await;

        assert!(!batch.results[0].reachable);
        assert_eq!(batch.results[0].count, None);
    }

    #[tokio::test]
    async fn test_metric_query_without_data_is_reachable() {
        let targets = vec![Target::metric_query("errors", "rate(app_errors_total[5m])")];

        let batch = collector(FakeHttp::new(), FakeRuntime::new(), FakeStore::new())
            .collect(&targets, Duration::from_secs(3))
            .await;

        assert!(batch.results[0].reachable);
        assert_eq!(batch.results[0].error, None);
    }

    #[tokio::test]
    async fn test_metric_query_error_status_is_malformed() {
        let targets = vec![Target::metric_query("bad", "up{")];
        let store = FakeStore::new().reply(
            "up{",
            Reply::Ok(QueryResponse::Error {
                error_type: "bad_data".into(),
                error: "unexpected end of input".into(),
            }),
        );

        let batch = collector(FakeHttp::new(), FakeRuntime::new(), store)
            .collect(&targets, Duration::from_secs(3))
            .await;

        assert_eq!(
            batch.results[0].error,
            Some(ProbeErrorKind::MalformedResponse)
        );
    }

    #[tokio::test]
    async fn test_empty_target_list() {
        let batch = collector(FakeHttp::new(), FakeRuntime::new(), FakeStore::new())
            .collect(&[], Duration::from_secs(3))
            .await;
        assert!(batch.results.is_empty());
    }
}
