//! HTTP surface.
//!
//! All bodies are JSON. POST routes carry a signed request; GET routes are
//! unauthenticated reads. Anything outside the route table is a 404 with an
//! empty JSON object.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use vouchnet_core::service::{ActionService, QueryService, RoleReceipt, SignedRequest};
use vouchnet_core::{Error, IdtAmount, Nonce};

/// Shared service state.
pub struct AppState {
    pub actions: ActionService,
    pub queries: QueryService,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/vouch/{user}", post(vouch))
        .route("/idt/{user}", get(idt))
        .route("/proof/{user}", post(proof))
        .route("/punish/{user}", post(punish))
        .route("/is_moderator/{user}", get(is_moderator))
        .route("/moderators", get(moderators))
        .route("/add_moderator/{user}", post(add_moderator))
        .route("/remove_moderator/{user}", post(remove_moderator))
        .route("/is_admin/{user}", get(is_admin))
        .route("/admins", get(admins))
        .route("/add_admin/{user}", post(add_admin))
        .route("/remove_admin/{user}", post(remove_admin))
        .fallback(not_found)
        .with_state(state)
}

/// Signed request body shared by all role and vouch actions.
#[derive(Debug, Deserialize)]
struct SignedBody {
    signature: String,
    nonce: Nonce,
    signer: String,
}

/// Proof and punish additionally carry a balance and a proof id.
#[derive(Debug, Deserialize)]
struct ProofBody {
    signature: String,
    nonce: Nonce,
    signer: String,
    idt: IdtAmount,
    proof_id: String,
}

fn error_response(err: Error) -> Response {
    let status = match &err {
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        Error::BadSignature => StatusCode::UNAUTHORIZED,
        Error::NonceConsumed(_) => StatusCode::CONFLICT,
        Error::NotAllowed => StatusCode::FORBIDDEN,
        Error::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NotFound => StatusCode::NOT_FOUND,
        Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

/// Missing fields and malformed JSON are client errors regardless of how
/// the extractor classifies them.
fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(Error::BadRequest(rejection.body_text())),
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({}))).into_response()
}

// =============================================================================
// ACTIONS
// =============================================================================

async fn vouch(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    body: Result<Json<SignedBody>, JsonRejection>,
) -> Response {
    let result = parse_body(body).and_then(|body| {
        let request = SignedRequest::decode(&body.signer, &body.signature, body.nonce)?;
        state.actions.vouch(&user, &request)
    });
    match result {
        Ok(receipt) => Json(json!({
            "from": receipt.from,
            "to": receipt.to,
            "idt": receipt.idt,
        }))
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn proof(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    body: Result<Json<ProofBody>, JsonRejection>,
) -> Response {
    let result = parse_body(body).and_then(|body| {
        let request = SignedRequest::decode(&body.signer, &body.signature, body.nonce)?;
        state
            .actions
            .set_proof(&user, &request, body.idt, &body.proof_id)
    });
    match result {
        Ok(receipt) => Json(json!({
            "from": receipt.from,
            "to": receipt.to,
            "idt": receipt.balance,
            "proof_id": receipt.proof_id,
        }))
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn punish(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    body: Result<Json<ProofBody>, JsonRejection>,
) -> Response {
    let result = parse_body(body).and_then(|body| {
        let request = SignedRequest::decode(&body.signer, &body.signature, body.nonce)?;
        state
            .actions
            .punish(&user, &request, body.idt, &body.proof_id)
    });
    match result {
        Ok(receipt) => Json(json!({
            "from": receipt.from,
            "to": receipt.to,
            "idt": receipt.idt,
            "penalty": receipt.penalty,
        }))
        .into_response(),
        Err(err) => error_response(err),
    }
}

fn role_response(receipt: Result<RoleReceipt, Error>, member_key: &str) -> Response {
    match receipt {
        Ok(receipt) => {
            let mut body = serde_json::Map::new();
            body.insert("from".to_string(), json!(receipt.from));
            body.insert(member_key.to_string(), json!(receipt.member));
            Json(serde_json::Value::Object(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn add_moderator(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    body: Result<Json<SignedBody>, JsonRejection>,
) -> Response {
    let result = parse_body(body).and_then(|body| {
        let request = SignedRequest::decode(&body.signer, &body.signature, body.nonce)?;
        state.actions.add_moderator(&user, &request)
    });
    role_response(result, "moderator")
}

async fn remove_moderator(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    body: Result<Json<SignedBody>, JsonRejection>,
) -> Response {
    let result = parse_body(body).and_then(|body| {
        let request = SignedRequest::decode(&body.signer, &body.signature, body.nonce)?;
        state.actions.remove_moderator(&user, &request)
    });
    role_response(result, "moderator")
}

async fn add_admin(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    body: Result<Json<SignedBody>, JsonRejection>,
) -> Response {
    let result = parse_body(body).and_then(|body| {
        let request = SignedRequest::decode(&body.signer, &body.signature, body.nonce)?;
        state.actions.add_admin(&user, &request)
    });
    role_response(result, "admin")
}

async fn remove_admin(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    body: Result<Json<SignedBody>, JsonRejection>,
) -> Response {
    let result = parse_body(body).and_then(|body| {
        let request = SignedRequest::decode(&body.signer, &body.signature, body.nonce)?;
        state.actions.remove_admin(&user, &request)
    });
    role_response(result, "admin")
}

// =============================================================================
// QUERIES
// =============================================================================

async fn idt(State(state): State<Arc<AppState>>, Path(user): Path<String>) -> Response {
    match state.queries.idt(&user) {
        Ok(idt) => Json(json!({ "idt": idt })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn is_moderator(State(state): State<Arc<AppState>>, Path(user): Path<String>) -> Response {
    match state.queries.is_moderator(&user) {
        Ok(answer) => Json(json!({ "is_moderator": answer })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn is_admin(State(state): State<Arc<AppState>>, Path(user): Path<String>) -> Response {
    match state.queries.is_admin(&user) {
        Ok(answer) => Json(json!({ "is_admin": answer })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn moderators(State(state): State<Arc<AppState>>) -> Response {
    match state.queries.list_moderators() {
        Ok(list) => Json(list).into_response(),
        Err(err) => error_response(err),
    }
}

async fn admins(State(state): State<Arc<AppState>>) -> Response {
    match state.queries.list_admins() {
        Ok(list) => Json(list).into_response(),
        Err(err) => error_response(err),
    }
}
