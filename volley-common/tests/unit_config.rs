use volley_common::{
    ConcurrencyModel, ConfigError, Method, RunConfig, SelectionPolicy, POST_PAYLOAD,
};

fn base_config() -> RunConfig {
    RunConfig {
        target: "http://127.0.0.1:8080/".to_string(),
        method: Method::Get,
        workers: 16,
        clients: 4,
        model: ConcurrencyModel::Task,
        policy: SelectionPolicy::TaskRoundRobin,
        requests: Some(100),
        expect_continue: None,
        tolerance: 1,
        seed: None,
        verbose: false,
    }
}

#[test]
fn test_method_from_name_roundtrip() {
    for (name, expected) in [("get", Method::Get), ("post", Method::Post)] {
        let parsed = Method::from_name(name);
        assert_eq!(parsed, Some(expected), "from_name({name:?}) failed");
        assert_eq!(expected.as_name(), name, "as_name() mismatch for {name:?}");
    }
    assert!(Method::from_name("GET").is_none());
    assert!(Method::from_name("put").is_none());
}

#[test]
fn test_model_from_name_roundtrip() {
    for (name, expected) in [
        ("task", ConcurrencyModel::Task),
        ("thread", ConcurrencyModel::Thread),
    ] {
        let parsed = ConcurrencyModel::from_name(name);
        assert_eq!(parsed, Some(expected), "from_name({name:?}) failed");
        assert_eq!(expected.as_name(), name, "as_name() mismatch for {name:?}");
    }
    assert!(ConcurrencyModel::from_name("fiber").is_none());
}

#[test]
fn test_policy_from_name_roundtrip() {
    for (name, expected) in [
        ("task-round-robin", SelectionPolicy::TaskRoundRobin),
        ("task-random", SelectionPolicy::TaskRandom),
        ("request-round-robin", SelectionPolicy::RequestRoundRobin),
        ("request-random", SelectionPolicy::RequestRandom),
        ("request-shortest-queue", SelectionPolicy::RequestShortestQueue),
        (
            "request-random-not-longest-queue",
            SelectionPolicy::RequestRandomNotLongestQueue,
        ),
        ("request-random-tolerance", SelectionPolicy::RequestRandomTolerance),
    ] {
        let parsed = SelectionPolicy::from_name(name);
        assert_eq!(parsed, Some(expected), "from_name({name:?}) failed");
        assert_eq!(expected.as_name(), name, "as_name() mismatch for {name:?}");
    }
    assert!(SelectionPolicy::from_name("round-robin").is_none());
}

#[test]
fn test_validate_accepts_base_config() {
    assert_eq!(base_config().validate(), Ok(()));
}

#[test]
fn test_validate_rejects_empty_target() {
    let mut config = base_config();
    config.target = String::new();
    assert_eq!(config.validate(), Err(ConfigError::EmptyTarget));
}

#[test]
fn test_validate_rejects_zero_workers() {
    let mut config = base_config();
    config.workers = 0;
    assert_eq!(config.validate(), Err(ConfigError::ZeroWorkers));
}

#[test]
fn test_validate_rejects_zero_clients() {
    let mut config = base_config();
    config.clients = 0;
    assert_eq!(config.validate(), Err(ConfigError::ZeroClients));
}

#[test]
fn test_validate_rejects_not_longest_queue_with_single_client() {
    let mut config = base_config();
    config.policy = SelectionPolicy::RequestRandomNotLongestQueue;
    config.clients = 1;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::SingleClientExclusion(_))
    ));

    // Two clients are enough for the exclusion to always terminate.
    config.clients = 2;
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn test_validate_rejects_zero_tolerance() {
    let mut config = base_config();
    config.policy = SelectionPolicy::RequestRandomTolerance;
    config.tolerance = 0;
    assert!(matches!(config.validate(), Err(ConfigError::ZeroTolerance(_))));

    config.tolerance = 1;
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn test_validate_tolerance_only_constrains_tolerance_policy() {
    // tolerance = 0 is fine for every other policy; the field is unused there.
    let mut config = base_config();
    config.tolerance = 0;
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn test_validate_rejects_expect_continue_on_get() {
    let mut config = base_config();
    config.expect_continue = Some(true);
    assert_eq!(config.validate(), Err(ConfigError::ExpectContinueWithoutBody));

    config.method = Method::Post;
    assert_eq!(config.validate(), Ok(()));

    config.expect_continue = Some(false);
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn test_post_payload_is_the_fixed_document() {
    assert!(POST_PAYLOAD.starts_with("{ \"data\":"));
    assert!(POST_PAYLOAD.contains("job_id"));
    assert!(POST_PAYLOAD.contains("container_id"));
}

#[test]
fn test_config_serde_roundtrip() {
    let config = base_config();
    let json = serde_json::to_string(&config).unwrap();
    let back: RunConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.target, config.target);
    assert_eq!(back.policy, config.policy);
    assert_eq!(back.requests, config.requests);
    assert_eq!(back.expect_continue, config.expect_continue);
}
