//! Search relay.
//!
//! Browsers cannot call the shopping-search endpoint directly (CORS, and
//! the API key must stay server-side), so this stateless handler forwards
//! the inbound query string upstream with the server-held key injected and
//! mirrors the status and JSON body back.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

/// Shared relay state.
#[derive(Clone)]
pub struct RelayState {
    pub upstream: String,
    pub api_key: Option<String>,
    pub http: reqwest::Client,
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/search", get(search).options(preflight))
        .with_state(state)
}

/// Serve the relay until the process is stopped.
pub async fn serve(addr: SocketAddr, state: RelayState) -> Result<(), String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind {}: {}", addr, e))?;
    log::info!("Search relay listening on {}", addr);
    axum::serve(listener, router(state))
        .await
        .map_err(|e| format!("relay server: {}", e))
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type, Accept"),
    );
    headers
}

/// CORS preflight: 200, no body.
async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, cors_headers())
}

async fn search(
    State(state): State<RelayState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(api_key) = state.api_key.clone() else {
        log::error!("Relay request refused: no API key configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            cors_headers(),
            Json(json!({ "error": "search API key not configured on the server" })),
        );
    };

    // The server-held key always wins over anything the client sent.
    params.insert("api_key".to_string(), api_key);

    match forward(&state, &params).await {
        Ok((status, body)) => (status, cors_headers(), Json(body)),
        Err(e) => {
            log::error!("Relay request failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                cors_headers(),
                Json(json!({ "error": e })),
            )
        }
    }
}

/// Forward the query upstream, mirroring status and body.
async fn forward(
    state: &RelayState,
    params: &HashMap<String, String>,
) -> Result<(StatusCode, Value), String> {
    let resp = state
        .http
        .get(&state.upstream)
        .query(params)
        .send()
        .await
        .map_err(|e| format!("upstream request failed: {}", e))?;

    let status =
        StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Ok((status, json!({ "error": text })));
    }

    let body: Value = resp
        .json()
        .await
        .map_err(|e| format!("upstream returned non-JSON body: {}", e))?;

    Ok((status, body))
}
