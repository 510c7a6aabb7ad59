//! Heartbeats against a live registry endpoint.

mod common;

use std::net::TcpListener;
use std::time::Duration;

use axum::http::StatusCode;
use module_host::component::Component;

use common::{eventually, no_env, start_mock_registry, write_config, GreeterComponent};

fn registry_config(registry_url: &str) -> tempfile::NamedTempFile {
    let config = serde_json::json!({
        "name": "greeter-registry",
        "listen": "127.0.0.1:0",
        "heartbeat": {
            "interval": 1,
            "registry_url": registry_url,
            "send_timeout_ms": 500
        }
    });
    write_config(&config.to_string(), "json")
}

#[tokio::test]
async fn registry_receives_announcements() {
    let (registry, received) = start_mock_registry(StatusCode::OK).await;
    let file = registry_config(&format!("http://{registry}/heartbeat"));
    let path = file.path().display().to_string();

    let mut running = GreeterComponent::default()
        .new_module(["--config", path.as_str()])
        .with_env(no_env())
        .start()
        .await
        .unwrap();

    assert!(eventually(Duration::from_secs(2), || !received.lock().unwrap().is_empty()).await);
    let first = received.lock().unwrap()[0].clone();
    assert_eq!(first.module, "greeter-registry");
    assert_eq!(first.component, "greeter");
    assert!(first.timestamp > 0);

    running.stop().await;
    let at_stop = received.lock().unwrap().len();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(received.lock().unwrap().len(), at_stop);
}

#[tokio::test]
async fn failing_registry_is_retried_per_tick_and_module_keeps_serving() {
    let (registry, received) = start_mock_registry(StatusCode::INTERNAL_SERVER_ERROR).await;
    let file = registry_config(&format!("http://{registry}/heartbeat"));
    let path = file.path().display().to_string();

    let mut running = GreeterComponent::default()
        .new_module(["-c", path.as_str()])
        .with_env(no_env())
        .start()
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(2_300)).await;
    let attempts = received.lock().unwrap().len();
    // Ticks at 0s, 1s and 2s; no retry bursts in between.
    assert!((2..=3).contains(&attempts), "attempts = {attempts}");

    let status = reqwest::get(format!("http://{}/module.ModuleService/Health", running.local_addr()))
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::OK);

    running.stop().await;
}

#[tokio::test]
async fn unreachable_registry_does_not_block_stop() {
    let dead = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let file = registry_config(&format!("http://{dead}/heartbeat"));
    let path = file.path().display().to_string();

    let mut running = GreeterComponent::default()
        .new_module(["-c", path.as_str()])
        .with_env(no_env())
        .start()
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    tokio::time::timeout(Duration::from_secs(3), running.stop())
        .await
        .expect("stop hung on unreachable registry");
}
