use axum::Json;
use serde_json::{json, Value};
use tracing::debug;

pub async fn ping() -> Json<Value> {
    debug!("Ping");
    Json(json!({ "status": "ok" }))
}
