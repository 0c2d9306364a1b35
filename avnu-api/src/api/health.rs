//! Health endpoint

use axum::Json;
use serde_json::{json, Value};

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "module": "avnu-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
