// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

mod error;

use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Json, Path, State};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use alloy_primitives::{Address, Signature};
use app_core::encoding::L2MessageEncoder;
use app_core::transaction::{Eip712Signer, L2Transaction, SignedTransaction};

use crate::backend::SequencerBackend;
use crate::storage::Storage;

pub use error::ApiError;

pub type DevBackend = SequencerBackend<Storage, Eip712Signer, L2MessageEncoder>;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<DevBackend>,
}

#[derive(Debug, Deserialize)]
struct TxRequest {
    transaction: L2Transaction,
    signature: String,
}

#[derive(Debug, Serialize)]
struct TxResponse {
    ok: bool,
    sequence_number: u64,
    sender: String,
    block_number: u64,
}

#[derive(Debug, Deserialize)]
struct RevertRequest {
    snapshot_id: u64,
}

#[derive(Debug, Serialize)]
struct SnapshotResponse {
    snapshot_id: u64,
}

#[derive(Debug, Serialize)]
struct RevertResponse {
    ok: bool,
    frontier: u64,
}

#[derive(Debug, Serialize)]
struct BlockResponse {
    height: u64,
    hash: String,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Serialize)]
struct PendingResponse {
    pending: Option<u64>,
}

pub fn router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/tx", post(submit_tx))
        .route("/evm/snapshot", post(evm_snapshot))
        .route("/evm/revert", post(evm_revert))
        .route("/l1/blocks/{height}", get(l1_block))
        .route("/inbox/count", get(inbox_count))
        .route("/pending/{address}", get(pending_transaction_count))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

async fn submit_tx(
    State(state): State<Arc<AppState>>,
    req: Result<Json<TxRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<TxResponse>, ApiError> {
    let Json(req) = req.map_err(|err| ApiError::bad_request(format!("invalid JSON: {err}")))?;

    let signature_bytes = decode_hex_0x(&req.signature).map_err(ApiError::bad_request)?;
    if signature_bytes.len() != SignedTransaction::SIGNATURE_BYTES {
        return Err(ApiError::bad_request("signature must be 65 bytes"));
    }
    let signature = parse_signature(&signature_bytes)?;
    let signed = SignedTransaction::new(req.transaction, signature);

    let accepted = with_backend(&state, move |backend| {
        backend.submit_signed_transaction(&signed)
    })
    .await??;

    info!(
        sequence_number = accepted.sequence_number,
        block_number = accepted.chain_binding.block_number,
        sender = %accepted.sender,
        "tx sequenced"
    );

    Ok(Json(TxResponse {
        ok: true,
        sequence_number: accepted.sequence_number,
        sender: accepted.sender.to_string(),
        block_number: accepted.chain_binding.block_number,
    }))
}

// Snapshots are not tracked; revert takes an L1 height instead.
async fn evm_snapshot() -> Json<SnapshotResponse> {
    info!("snapshot");
    Json(SnapshotResponse { snapshot_id: 0 })
}

async fn evm_revert(
    State(state): State<Arc<AppState>>,
    req: Result<Json<RevertRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<RevertResponse>, ApiError> {
    let Json(req) = req.map_err(|err| ApiError::bad_request(format!("invalid JSON: {err}")))?;
    let snapshot_id = req.snapshot_id;
    info!(snap = snapshot_id, "revert");

    let frontier = with_backend(&state, move |backend| {
        backend.reorg(snapshot_id).map(|()| backend.l1_frontier())
    })
    .await??;

    Ok(Json(RevertResponse { ok: true, frontier }))
}

async fn l1_block(
    State(state): State<Arc<AppState>>,
    Path(height): Path<u64>,
) -> Result<Json<BlockResponse>, ApiError> {
    let block = with_backend(&state, move |backend| backend.l1_block(height)).await??;
    Ok(Json(BlockResponse {
        height: block.id.height,
        hash: alloy_primitives::hex::encode_prefixed(block.id.hash.as_slice()),
        timestamp: block.timestamp,
    }))
}

async fn inbox_count(State(state): State<Arc<AppState>>) -> Result<Json<CountResponse>, ApiError> {
    let count = with_backend(&state, |backend| backend.message_count()).await?;
    Ok(Json(CountResponse { count }))
}

async fn pending_transaction_count(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<PendingResponse>, ApiError> {
    let address = parse_address(&address).map_err(ApiError::bad_request)?;
    let pending =
        with_backend(&state, move |backend| backend.pending_transaction_count(address)).await?;
    Ok(Json(PendingResponse { pending }))
}

// The backend blocks on its lock and on SQLite, so it runs off the async workers.
async fn with_backend<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&DevBackend) -> T + Send + 'static,
    T: Send + 'static,
{
    let backend = Arc::clone(&state.backend);
    tokio::task::spawn_blocking(move || f(&backend))
        .await
        .map_err(|err| ApiError::internal_error(format!("backend task failed: {err}")))
}

fn decode_hex_0x(value: &str) -> Result<Vec<u8>, String> {
    if !value.starts_with("0x") {
        return Err("hex string must start with 0x".to_string());
    }
    alloy_primitives::hex::decode(value).map_err(|err| format!("invalid hex: {err}"))
}

fn parse_address(value: &str) -> Result<Address, String> {
    let bytes = decode_hex_0x(value)?;
    if bytes.len() != 20 {
        return Err("address must be 20 bytes".to_string());
    }
    Ok(Address::from_slice(&bytes))
}

fn parse_signature(bytes: &[u8]) -> Result<Signature, ApiError> {
    Signature::from_raw(bytes).map_err(|err| match err {
        alloy_primitives::SignatureError::FromBytes(_) => {
            ApiError::bad_request("signature must be 65 bytes")
        }
        alloy_primitives::SignatureError::FromHex(_) => {
            ApiError::bad_request("invalid signature hex")
        }
        _ => ApiError::invalid_signature("invalid signature"),
    })
}
