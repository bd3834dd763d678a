use promptweave_cache::{Cache, CacheConfig};
use promptweave_core::{CancellationToken, FakeClock, SeededRandom};
use promptweave_router::{
    BackendError, EchoBackend, ModelDescriptor, RetryPolicy, RouteRequest, Router, RouterConfig,
    RouterError,
};
use std::sync::Arc;
use std::time::Duration;

fn retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        base_delay_ms: 5,
        max_delay_ms: 20,
        jitter: 0.0,
    }
}

#[tokio::test]
async fn router_all_paths_scenario() {
    let primary = Arc::new(EchoBackend::always_fails(BackendError::Transient(
        "primary down".to_string(),
    )));
    let fallback = Arc::new(EchoBackend::always_succeeds());

    let response_cache = Arc::new(Cache::new(CacheConfig::new(16), Arc::new(FakeClock::new())).unwrap());
    let config = RouterConfig::default()
        .with_retry_policy(retry_policy())
        .with_response_cache(response_cache);

    let router = Router::new(
        vec![
            (ModelDescriptor::new("primary", "acme"), primary),
            (ModelDescriptor::new("fallback", "acme"), fallback),
        ],
        config,
        Arc::new(FakeClock::new()),
        Arc::new(SeededRandom::new(1)),
    )
    .unwrap();

    let request = RouteRequest::new("hi").with_allow_cache(true).with_allow_failover(true);
    let response = router.route(request.clone()).await.unwrap();
    assert_eq!(response.model_name, "fallback");
    assert_eq!(response.text, "hi");
    assert!(!response.from_cache);

    let stats = router.stats();
    let primary_stats = stats.iter().find(|s| s.name == "primary").unwrap();
    let fallback_stats = stats.iter().find(|s| s.name == "fallback").unwrap();
    assert_eq!(primary_stats.total_requests, 2);
    assert_eq!(primary_stats.total_errors, 2);
    assert_eq!(fallback_stats.total_requests, 1);
    assert_eq!(fallback_stats.total_errors, 0);

    // Second identical call is served from cache; no new dispatches.
    let cached = router.route(request).await.unwrap();
    assert!(cached.from_cache);
    let stats_after = router.stats();
    let primary_after = stats_after.iter().find(|s| s.name == "primary").unwrap();
    let fallback_after = stats_after.iter().find(|s| s.name == "fallback").unwrap();
    assert_eq!(primary_after.total_requests, 2);
    assert_eq!(fallback_after.total_requests, 1);
}

#[tokio::test]
async fn no_backend_available_when_only_candidate_rate_limited() {
    let backend = Arc::new(EchoBackend::always_fails(BackendError::RateLimited {
        retry_after: Some(Duration::from_secs(60)),
    }));
    let clock = Arc::new(FakeClock::new());
    let router = Router::new(
        vec![(ModelDescriptor::new("only", "acme"), backend)],
        RouterConfig::default().with_retry_policy(retry_policy()),
        clock.clone(),
        Arc::new(SeededRandom::new(1)),
    )
    .unwrap();

    let first = router.route(RouteRequest::new("hi")).await;
    assert!(matches!(first, Err(RouterError::AllBackendsFailed { .. })));

    let second = router.route(RouteRequest::new("hi")).await;
    assert!(matches!(second, Err(RouterError::NoBackendAvailable)));
}

#[tokio::test]
async fn allow_failover_false_stops_after_first_candidate() {
    let primary = Arc::new(EchoBackend::always_fails(BackendError::PermanentAuth(
        "bad key".to_string(),
    )));
    let fallback = Arc::new(EchoBackend::always_succeeds());

    let router = Router::new(
        vec![
            (ModelDescriptor::new("primary", "acme"), primary),
            (ModelDescriptor::new("fallback", "acme"), fallback),
        ],
        RouterConfig::default().with_retry_policy(retry_policy()),
        Arc::new(FakeClock::new()),
        Arc::new(SeededRandom::new(1)),
    )
    .unwrap();

    let request = RouteRequest::new("hi").with_allow_failover(false);
    let result = router.route(request).await;
    match result {
        Err(RouterError::AllBackendsFailed { causes }) => assert_eq!(causes.len(), 1),
        other => panic!("expected AllBackendsFailed with one cause, got {other:?}"),
    }

    let stats = router.stats();
    let fallback_stats = stats.iter().find(|s| s.name == "fallback").unwrap();
    assert_eq!(fallback_stats.total_requests, 0);
}

#[tokio::test]
async fn route_batch_isolates_per_request_failures() {
    let always_fails = Arc::new(EchoBackend::always_fails(BackendError::PermanentOther(
        "broken".to_string(),
    )));
    let always_succeeds = Arc::new(EchoBackend::always_succeeds());

    let router = Router::new(
        vec![
            (ModelDescriptor::new("bad", "acme"), always_fails),
            (ModelDescriptor::new("good", "acme"), always_succeeds),
        ],
        RouterConfig::default().with_retry_policy(retry_policy()),
        Arc::new(FakeClock::new()),
        Arc::new(SeededRandom::new(1)),
    )
    .unwrap();

    let requests = vec![
        RouteRequest::new("a").with_preferred_model("bad").with_allow_failover(false),
        RouteRequest::new("b").with_preferred_model("good"),
    ];
    let results = router.route_batch(requests).await;
    assert!(results[0].is_err());
    assert!(results[1].is_ok());
    assert_eq!(results[1].as_ref().unwrap().text, "b");
}

#[tokio::test]
async fn pre_cancelled_token_short_circuits_before_dispatch() {
    let backend = Arc::new(EchoBackend::always_succeeds());
    let router = Router::new(
        vec![(ModelDescriptor::new("only", "acme"), backend)],
        RouterConfig::default().with_retry_policy(retry_policy()),
        Arc::new(FakeClock::new()),
        Arc::new(SeededRandom::new(1)),
    )
    .unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let request = RouteRequest::new("hi").with_cancellation(token);

    let result = router.route(request).await;
    assert!(matches!(result, Err(RouterError::Cancelled)));

    let stats = router.stats();
    let only_stats = stats.iter().find(|s| s.name == "only").unwrap();
    assert_eq!(only_stats.total_requests, 0);
}
