//! End-to-end resolution through the HTTP service.

use std::time::Duration;

use serde_json::Value;

use forwarding_resolver::config::ServiceConfig;
use forwarding_resolver::ForwardingPolicy;

mod common;

#[tokio::test]
async fn direct_request_reports_loopback_peer() {
    let server = common::start_server(ServiceConfig::default()).await;

    let res = common::client().get(server.url("/")).send().await.expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["client"]["source"], "connection");
    assert_eq!(body["client"]["secure"], false);
    assert!(body["client"]["address"].as_str().unwrap().starts_with("127.0.0.1:"));

    server.shutdown.trigger();
}

#[tokio::test]
async fn x_forwarded_headers_are_honoured() {
    let server = common::start_server(ServiceConfig::default()).await;

    let body: Value = common::client()
        .post(server.url("/api/orders"))
        .header("X-Forwarded-For", "[2001:db8::1], 70.41.3.18")
        .header("X-Forwarded-Port", "8443")
        .header("X-Forwarded-Proto", "HTTPS, http")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["method"], "POST");
    assert_eq!(body["path"], "/api/orders");
    assert_eq!(body["client"]["address"], "[2001:db8::1]:8443");
    assert_eq!(body["client"]["source"], "x_forwarded_for");
    assert_eq!(body["client"]["secure"], true);

    server.shutdown.trigger();
}

#[tokio::test]
async fn garbage_headers_never_fail_the_request() {
    let server = common::start_server(ServiceConfig::default()).await;

    let res = common::client()
        .get(server.url("/"))
        .header("Forwarded", "for=\"[::1;proto=")
        .header("X-Forwarded-For", ",,,")
        .header("X-Forwarded-Port", "abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["client"]["source"], "connection");

    server.shutdown.trigger();
}

#[tokio::test]
async fn reloaded_policy_takes_effect() {
    let server = common::start_server(ServiceConfig::default()).await;
    let client = common::client();

    let send = || {
        client
            .get(server.url("/"))
            .header("Forwarded", "for=198.51.100.17;proto=https")
            .header("X-Forwarded-For", "203.0.113.5")
            .send()
    };

    let body: Value = send().await.unwrap().json().await.unwrap();
    assert_eq!(body["client"]["source"], "x_forwarded_for");

    let mut config = ServiceConfig::default();
    config.forwarding = ForwardingPolicy {
        support_forwarded: true,
        support_x_forwarded: true,
        prefer_forwarded: true,
    };
    server.config_updates.send(config).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let body: Value = send().await.unwrap().json().await.unwrap();
    assert_eq!(body["client"]["source"], "forwarded");
    assert!(body["client"]["address"].as_str().unwrap().starts_with("198.51.100.17:"));

    // A policy with no header family is rejected and the previous one stays.
    let mut invalid = ServiceConfig::default();
    invalid.forwarding.support_forwarded = false;
    invalid.forwarding.support_x_forwarded = false;
    server.config_updates.send(invalid).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let body: Value = send().await.unwrap().json().await.unwrap();
    assert_eq!(body["client"]["source"], "forwarded");

    server.shutdown.trigger();
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let server = common::start_server(ServiceConfig::default()).await;
    let client = common::client();

    assert!(client.get(server.url("/")).send().await.is_ok());

    server.shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(client.get(server.url("/")).send().await.is_err());
}
