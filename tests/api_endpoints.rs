//! Integration tests for the powledger HTTP API
//!
//! These tests verify status codes and JSON shapes of every endpoint on a
//! single node, driven through the router in-process.

use axum_test::TestServer;
use powledger::api::build_api_router;
use powledger::config::Config;
use powledger::node::Node;
use serde_json::{json, Value};
use std::sync::Arc;

const NODE_ID: &str = "0123456789abcdef0123456789abcdef";

fn test_config() -> Config {
    let mut config = Config::default();
    config.miner.difficulty = 2;
    config.consensus.peer_timeout_secs = 1;
    config
}

fn test_server(config: Config) -> (TestServer, Arc<Node>) {
    let node = Arc::new(Node::with_identifier(config, NODE_ID).expect("Failed to create node"));
    let server =
        TestServer::new(build_api_router(node.clone())).expect("Failed to create test server");
    (server, node)
}

#[tokio::test]
async fn test_fresh_node_serves_genesis() {
    let (server, _node) = test_server(test_config());

    let response = server.get("/chain").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["length"], 1);
    assert_eq!(json["chain"][0]["index"], 1);
    assert_eq!(json["chain"][0]["proof"], 100);
    assert_eq!(json["chain"][0]["previous_hash"], "1");
    assert!(json["chain"][0]["timestamp"].is_number());
    assert!(json["chain"][0]["transactions"].as_array().unwrap().is_empty());

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["node_id"], NODE_ID);
    assert_eq!(json["length"], 1);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_transaction_then_mine() {
    let (server, node) = test_server(test_config());

    let response = server
        .post("/transactions/new")
        .json(&json!({ "sender": "alice", "recipient": "bob", "amount": 5 }))
        .await;
    assert_eq!(response.status_code(), 201);
    let json: Value = response.json();
    assert_eq!(json["message"], "Transaction will be added to Block 2");

    let response = server.get("/mine").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["message"], "New Block Forged");
    assert_eq!(json["index"], 2);
    assert!(json["proof"].is_u64());
    assert!(json["previous_hash"].as_str().unwrap().len() == 64);
    assert_eq!(
        json["transactions"],
        json!([
            { "sender": "alice", "recipient": "bob", "amount": 5.0 },
            { "sender": "0", "recipient": NODE_ID, "amount": 1.0 }
        ])
    );

    let json: Value = server.get("/chain").await.json();
    assert_eq!(json["length"], 2);
    assert!(node.pending_transactions().await.is_empty());
}

#[tokio::test]
async fn test_missing_transaction_fields_rejected() {
    let (server, node) = test_server(test_config());

    let response = server
        .post("/transactions/new")
        .json(&json!({ "sender": "alice", "amount": 5 }))
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].is_string());
    assert!(node.pending_transactions().await.is_empty());
}

#[tokio::test]
async fn test_register_nodes() {
    let (server, _node) = test_server(test_config());

    let response = server.post("/nodes/register").json(&json!({})).await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    let response = server
        .post("/nodes/register")
        .json(&json!({ "nodes": ["http://127.0.0.1:5001", "127.0.0.1:5001", "http://127.0.0.1:5002/"] }))
        .await;
    assert_eq!(response.status_code(), 201);
    let json: Value = response.json();
    assert_eq!(json["message"], "New nodes have been added");
    assert_eq!(json["total_nodes"], json!(["127.0.0.1:5001", "127.0.0.1:5002"]));

    let response = server
        .post("/nodes/register")
        .json(&json!({ "nodes": ["http://"] }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server.get("/nodes").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["count"], 2);
    assert!(json["nodes"].is_array());
}

#[tokio::test]
async fn test_resolve_without_peers_is_authoritative() {
    let (server, _node) = test_server(test_config());
    server.get("/mine").await;
    let before: Value = server.get("/chain").await.json();

    let response = server.get("/nodes/resolve").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["message"], "Our chain is authoritative");
    assert_eq!(json["replaced"], false);
    assert_eq!(json["chain"], before["chain"]);
}

#[tokio::test]
async fn test_require_transactions_policy() {
    let mut config = test_config();
    config.miner.require_transactions = true;
    let (server, _node) = test_server(config);

    let response = server.get("/mine").await;
    assert_eq!(response.status_code(), 409);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    server
        .post("/transactions/new")
        .json(&json!({ "sender": "alice", "recipient": "bob", "amount": 1 }))
        .await;
    let response = server.get("/mine").await;
    assert_eq!(response.status_code(), 200);
}
