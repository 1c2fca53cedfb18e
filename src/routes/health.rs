use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Reports which backend is active and whether it answers. A dead
/// backend is a 500 with the error message, never a crash.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Backend reachable"),
        (status = 500, description = "Backend unavailable"),
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let db_label = state.kind.label();
    let Some(db) = state.db.as_ref() else {
        let body = serde_json::json!({ "db": db_label, "error": "database unavailable" });
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    };

    match db.ping().await {
        Ok(()) => Json(serde_json::json!({ "db": db_label, "ok": true })).into_response(),
        Err(err) => {
            let body = serde_json::json!({ "db": db_label, "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
