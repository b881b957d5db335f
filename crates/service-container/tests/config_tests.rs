//! Integration tests for loading container configuration from disk

use service_container::{ContainerConfig, Error, ServiceContainer, ServiceMode, State};
use service_txn::Transaction;
use std::io::Write;
use tempfile::NamedTempFile;

mod common;
use common::*;

fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write config");
    file
}

#[smol_potat::test]
async fn test_load_yaml_config() {
    let file = config_file(
        ".yaml",
        r#"
name: edge
default_mode: lazy
max_transitions_per_transaction: 4
"#,
    );
    let config = ContainerConfig::from_file(file.path()).await.unwrap();
    assert_eq!(config.name, "edge");
    assert_eq!(config.default_mode, ServiceMode::Lazy);
    assert_eq!(config.max_transitions_per_transaction, 4);
}

#[smol_potat::test]
async fn test_load_json_config_with_defaults() {
    let file = config_file(".json", r#"{ "default_mode": "on-demand" }"#);
    let config = ContainerConfig::from_file(file.path()).await.unwrap();
    assert_eq!(config.name, ContainerConfig::default().name);
    assert_eq!(config.default_mode, ServiceMode::OnDemand);
    assert_eq!(
        config.max_transitions_per_transaction,
        ContainerConfig::default().max_transitions_per_transaction
    );
}

#[smol_potat::test]
async fn test_invalid_config_is_rejected() {
    let file = config_file(".yml", "max_transitions_per_transaction: 0\n");
    assert!(matches!(
        ContainerConfig::from_file(file.path()).await,
        Err(Error::Config(_))
    ));

    let file = config_file(".json", "{ not json");
    assert!(matches!(
        ContainerConfig::from_file(file.path()).await,
        Err(Error::Json(_))
    ));

    assert!(matches!(
        ContainerConfig::from_file("/nonexistent/container.yaml").await,
        Err(Error::Io(_))
    ));
}

#[smol_potat::test]
async fn test_default_mode_applies_to_unset_builders() {
    init_tracing();
    let file = config_file(".yaml", "name: lazy-by-default\ndefault_mode: lazy\n");
    let config = ContainerConfig::from_file(file.path()).await.unwrap();
    let container = ServiceContainer::new(config);
    assert_eq!(container.name(), "lazy-by-default");
    let journal = Journal::default();

    let txn = Transaction::new();
    let target = container.target();
    target
        .add_service(&txn, "db", RecordingService::new(&journal))
        .build()
        .unwrap();
    target
        .add_service(&txn, "cache", RecordingService::new(&journal))
        .set_mode(ServiceMode::Active)
        .unwrap()
        .build()
        .unwrap();
    run_and_commit(&txn).await;

    assert_eq!(
        container.controller(&name("db")).unwrap().mode(),
        ServiceMode::Lazy
    );
    assert_eq!(container.state_of(&name("db")), Some(State::Down));
    assert_eq!(container.state_of(&name("cache")), Some(State::Up));
}
