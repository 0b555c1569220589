//! End-to-end API tests: real router, real stores, real model artifact,
//! driven over HTTP on an ephemeral port.

use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;

use ipo_api::{create_router, ApiConfig, AppState};
use ipo_engine::train::{self, TrainConfig};

/// Spawn the server on an ephemeral port, backed by a temp directory.
async fn spawn_app() -> (String, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    write_artifact(dir.path());

    let config = ApiConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        secret_key: "integration-test-secret".to_string(),
        users_store_path: dir.path().join("users_store.json"),
        history_store_path: dir.path().join("pred_history.json"),
        model_artifact_path: dir.path().join("model_artifact.json"),
        ..ApiConfig::default()
    };

    let state = AppState::new(config).unwrap();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), dir)
}

fn write_artifact(dir: &Path) {
    let config = TrainConfig {
        rows: 300,
        trees: 4,
        max_depth: 4,
        min_samples_leaf: 5,
        seed: 1,
    };
    train::train_artifact(&config)
        .save(dir.join("model_artifact.json"))
        .unwrap();
}

async fn register_and_login(client: &reqwest::Client, base: &str, username: &str) -> String {
    let status = client
        .post(format!("{base}/auth/register"))
        .json(&json!({"username": username, "password": "hunter2hunter2"}))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, 201);

    let body: Value = client
        .post(format!("{base}/auth/login"))
        .json(&json!({"username": username, "password": "hunter2hunter2"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

fn listing(ticker: &str, exchange: &str, sector: &str) -> Value {
    json!({
        "ticker": ticker,
        "issue_price": 250.0,
        "listing_date": "2024-05-20",
        "exchange": exchange,
        "sector": sector,
    })
}

#[tokio::test]
async fn health_needs_no_auth() {
    let (base, _dir) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (base, _dir) = spawn_app().await;
    let client = reqwest::Client::new();

    register_and_login(&client, &base, "alice").await;

    let status = client
        .post(format!("{base}/auth/register"))
        .json(&json!({"username": "alice", "password": "hunter2hunter2"}))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, 409);
}

#[tokio::test]
async fn short_password_is_rejected() {
    let (base, _dir) = spawn_app().await;
    let client = reqwest::Client::new();

    let status = client
        .post(format!("{base}/auth/register"))
        .json(&json!({"username": "alice", "password": "short"}))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, 400);
}

#[tokio::test]
async fn wrong_password_cannot_login() {
    let (base, _dir) = spawn_app().await;
    let client = reqwest::Client::new();

    register_and_login(&client, &base, "alice").await;

    let status = client
        .post(format!("{base}/auth/login"))
        .json(&json!({"username": "alice", "password": "not-the-password"}))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, 401);

    // Unknown usernames fail the same way.
    let status = client
        .post(format!("{base}/auth/login"))
        .json(&json!({"username": "mallory", "password": "hunter2hunter2"}))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, 401);
}

#[tokio::test]
async fn protected_endpoints_reject_missing_or_bad_tokens() {
    let (base, _dir) = spawn_app().await;
    let client = reqwest::Client::new();

    let no_header = client
        .post(format!("{base}/predict"))
        .json(&json!({"items": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(no_header.status(), 401);

    let bad_scheme = client
        .get(format!("{base}/history"))
        .header("Authorization", "Basic abc123")
        .send()
        .await
        .unwrap();
    assert_eq!(bad_scheme.status(), 401);

    let bad_token = client
        .get(format!("{base}/history"))
        .header("Authorization", "Bearer not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(bad_token.status(), 401);
}

#[tokio::test]
async fn predict_encodes_and_records_history() {
    let (base, _dir) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &base, "alice").await;

    let body: Value = client
        .post(format!("{base}/predict"))
        .bearer_auth(&token)
        .json(&json!({"items": [
            listing("AAA", "NSE", "TECH"),
            listing("BBB", "XYZ", "TECH"),
        ]}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["ticker"], "AAA");
    assert_eq!(results[1]["ticker"], "BBB");
    // Category maps are sorted, so "NSE" codes to 1; "XYZ" is unseen.
    assert_eq!(results[0]["inputs"]["exchange_code"], 1.0);
    assert_eq!(results[1]["inputs"]["exchange_code"], -1.0);
    assert_eq!(results[0]["inputs"]["listing_month"], 5.0);
    assert_eq!(results[0]["inputs"]["listing_day"], 20.0);

    let history: Value = client
        .get(format!("{base}/history"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entries = history["history"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["user"], "alice");
    assert_eq!(entries[0]["result"]["ticker"], "AAA");
}

#[tokio::test]
async fn history_is_global_and_ordered_across_users() {
    let (base, _dir) = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = register_and_login(&client, &base, "alice").await;
    let bob = register_and_login(&client, &base, "bob").await;

    client
        .post(format!("{base}/predict"))
        .bearer_auth(&alice)
        .json(&json!({"items": [listing("AAA", "NSE", "TECH")]}))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{base}/predict"))
        .bearer_auth(&bob)
        .json(&json!({"items": [listing("BBB", "BSE", "FIN")]}))
        .send()
        .await
        .unwrap();

    // Bob sees alice's entries too; the history is one global sequence.
    let history: Value = client
        .get(format!("{base}/history"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let users: Vec<&str> = history["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["user"].as_str().unwrap())
        .collect();
    assert_eq!(users, ["alice", "bob"]);
}

#[tokio::test]
async fn explain_returns_scores_for_every_feature() {
    let (base, _dir) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &base, "alice").await;

    let body: Value = client
        .post(format!("{base}/explain"))
        .bearer_auth(&token)
        .json(&json!({"items": [listing("AAA", "NSE", "TECH")]}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let explanations = body["explanations"].as_array().unwrap();
    assert_eq!(explanations.len(), 1);
    let scores = explanations[0].as_object().unwrap();
    for column in [
        "issue_price",
        "listing_month",
        "listing_day",
        "exchange_code",
        "sector_code",
    ] {
        assert!(scores.contains_key(column), "missing score for {column}");
    }
    // Explanation does not write history.
    let history: Value = client
        .get(format!("{base}/history"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["history"].as_array().unwrap().len(), 0);
}
