//! End-to-end tests against a real listener.

use serde_json::{json, Value};

mod common;
use common::*;

#[tokio::test]
async fn test_crud_over_tcp() {
    let server = spawn_server(test_config()).await;
    let client = client();

    let resp = client
        .post(server.url("/api/v1/todos"))
        .json(&json!({ "description": "Buy milk" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let resp = client
        .patch(server.url(&format!("/api/v1/todos/{id}")))
        .json(&json!({ "completed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["data"]["completed"], true);
    assert_eq!(updated["data"]["description"], "Buy milk");

    let resp = client
        .get(server.url("/api/v1/todos"))
        .send()
        .await
        .unwrap();
    let list: Value = resp.json().await.unwrap();
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let resp = client
        .delete(server.url(&format!("/api/v1/todos/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_loopback_exempt_from_rate_limit() {
    let mut config = test_config();
    config.rate_limit.max_requests = 2;
    let server = spawn_server(config).await;
    let client = client();

    for _ in 0..5 {
        let resp = client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["x-ratelimit-remaining"], "2");
    }

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_loopback_limited_when_not_exempt() {
    let mut config = test_config();
    config.rate_limit.max_requests = 2;
    config.rate_limit.exempt_loopback = false;
    let server = spawn_server(config).await;
    let client = client();

    for _ in 0..2 {
        let resp = client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 429);
    let retry_after: u64 = resp.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_forwarded_for_ignored_unless_trusted() {
    let mut config = test_config();
    config.rate_limit.max_requests = 1;
    let server = spawn_server(config).await;
    let client = client();

    // The peer is loopback, so a spoofed X-Forwarded-For must not count.
    for _ in 0..3 {
        let resp = client
            .get(server.url("/health"))
            .header("x-forwarded-for", "203.0.113.9")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_cors_preflight() {
    let server = spawn_server(test_config()).await;

    let resp = client()
        .request(reqwest::Method::OPTIONS, server.url("/api/v1/todos"))
        .header("origin", "http://example.com")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert!(resp.headers().contains_key("x-ratelimit-limit"));

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_graceful_shutdown_stops_listener() {
    let server = spawn_server(test_config()).await;
    let client = client();

    let health = server.url("/health");
    let resp = client.get(&health).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    server.shutdown.trigger();
    tokio::time::timeout(std::time::Duration::from_secs(5), server.handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert!(client.get(&health).send().await.is_err());
}
