//! REST API for a powledger node
//!
//! Thin routing layer over [`Node`]: it checks request bodies, calls into the
//! node and renders the results as JSON.

use axum::{
    extract::{Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::ChainError;
use crate::node::Node;
use crate::transaction::Transaction;

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BlockchainError(ChainError),
    InvalidInput(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BlockchainError(e) => {
                let status = match &e {
                    ChainError::InvalidPeerAddress(_) => StatusCode::BAD_REQUEST,
                    ChainError::NoPendingTransactions => StatusCode::CONFLICT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::BlockchainError(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /transactions/new`. Fields are optional so that missing
/// ones can be reported as a client error instead of a decode failure.
#[derive(Debug, Deserialize)]
pub struct NewTransactionRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterNodesResponse {
    pub message: String,
    pub total_nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub message: String,
    pub replaced: bool,
    pub chain: Vec<crate::blockchain::Block>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    Router::new()
        .route("/chain", get(full_chain))
        .route("/transactions/new", post(new_transaction))
        .route("/mine", get(mine))
        .route("/nodes", get(list_nodes))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve_conflicts))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(cors)
}

/// Serve the API on an already bound listener until the server stops.
pub async fn serve(listener: tokio::net::TcpListener, node: Arc<Node>) -> std::io::Result<()> {
    axum::serve(listener, build_api_router(node)).await
}

/// Bind `addr` and serve the API.
pub async fn run_api_server(
    node: Arc<Node>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        node_id = %node.identifier(),
        "API server listening"
    );

    serve(listener, node).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn full_chain(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(node.chain().await)
}

async fn new_transaction(
    State(node): State<Arc<Node>>,
    Json(req): Json<NewTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (sender, recipient, amount) = match (req.sender, req.recipient, req.amount) {
        (Some(sender), Some(recipient), Some(amount)) => (sender, recipient, amount),
        _ => return Err(ApiError::InvalidInput("Missing values".to_string())),
    };

    let index = node.submit_transaction(sender, recipient, amount).await;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Transaction will be added to Block {}", index),
        }),
    ))
}

async fn mine(State(node): State<Arc<Node>>) -> Result<Json<MineResponse>, ApiError> {
    let block = node.mine().await?;

    Ok(Json(MineResponse {
        message: "New Block Forged".to_string(),
        index: block.index,
        timestamp: block.timestamp,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

async fn register_nodes(
    State(node): State<Arc<Node>>,
    Json(req): Json<RegisterNodesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let nodes = req.nodes.ok_or_else(|| {
        ApiError::InvalidInput("Error: Please supply a valid list of nodes".to_string())
    })?;

    let total_nodes = node.register_nodes(nodes.as_slice()).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterNodesResponse {
            message: "New nodes have been added".to_string(),
            total_nodes,
        }),
    ))
}

async fn list_nodes(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let nodes = node.peers().await;
    Json(serde_json::json!({
        "count": nodes.len(),
        "nodes": nodes
    }))
}

async fn resolve_conflicts(State(node): State<Arc<Node>>) -> Json<ResolveResponse> {
    let replaced = node.resolve_conflicts().await;
    let message = if replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };

    Json(ResolveResponse {
        message: message.to_string(),
        replaced,
        chain: node.chain().await.chain,
    })
}

async fn health_check(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let length = node.chain_length().await;
    Json(serde_json::json!({
        "status": "healthy",
        "node_id": node.identifier(),
        "length": length,
        "blocks_mined": node.blocks_mined(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
