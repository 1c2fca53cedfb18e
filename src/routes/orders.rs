use axum::{
    Json, Router,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header,
    routing::{delete, get, post, put},
};
use serde_json::Value;

use crate::{
    dto::{
        SuccessResponse,
        orders::{OrderPlaced, PlaceOrderRequest, UpdateStatusRequest},
    },
    error::{AppError, AppResult},
    models::OrderSummary,
    services::order_service,
    state::AppState,
    upload::save_upload,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/", post(place_order))
        .route("/{id}", delete(delete_order))
        .route("/{id}/status", put(set_status))
}

/// The storefront submits orders as multipart (so a payment screenshot
/// can ride along, with `items` as JSON text) or as a plain JSON body.
async fn parse_order_payload(state: &AppState, req: Request) -> AppResult<PlaceOrderRequest> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(payload) = Json::<PlaceOrderRequest>::from_request(req, state)
            .await
            .map_err(|err| AppError::Validation(err.to_string()))?;
        return Ok(payload);
    }

    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|err| AppError::Validation(err.to_string()))?;
    let mut payload = PlaceOrderRequest::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "email" => payload.email = Some(field.text().await.unwrap_or_default()),
            "items" => {
                let text = field.text().await.unwrap_or_default();
                payload.items = serde_json::from_str(&text)
                    .map_err(|_| AppError::Validation("Invalid items".into()))?;
            }
            "total" => payload.total = Value::String(field.text().await.unwrap_or_default()),
            "method" => payload.method = Value::String(field.text().await.unwrap_or_default()),
            "customerName" => {
                payload.customer_name = Some(field.text().await.unwrap_or_default())
            }
            "name" => payload.name = Some(field.text().await.unwrap_or_default()),
            "address" => payload.address = Some(field.text().await.unwrap_or_default()),
            "contactNumber" => {
                payload.contact_number = Some(field.text().await.unwrap_or_default())
            }
            "piecesCount" => {
                payload.pieces_count = Value::String(field.text().await.unwrap_or_default())
            }
            "colorPreferences" => {
                payload.color_preferences = Some(field.text().await.unwrap_or_default())
            }
            "screenshot" => {
                let filename = field.file_name().unwrap_or("screenshot").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::Validation(err.to_string()))?;
                let url = save_upload(&state.config.upload_dir, &filename, &bytes).await?;
                payload.screenshot_url = Some(url);
            }
            _ => {}
        }
    }
    Ok(payload)
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders with items aggregated", body = Vec<OrderSummary>)
    ),
    tag = "Orders"
)]
pub async fn list_orders(State(state): State<AppState>) -> AppResult<Json<Vec<OrderSummary>>> {
    let orders = order_service::list_orders(&state).await?;
    Ok(Json(orders))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    responses(
        (status = 200, description = "Order placed", body = OrderPlaced),
        (status = 400, description = "Validation failure, nothing written"),
    ),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    req: Request,
) -> AppResult<Json<OrderPlaced>> {
    let payload = parse_order_payload(&state, req).await?;
    let order_id = order_service::place_order(&state, payload).await?;
    Ok(Json(OrderPlaced {
        success: true,
        order_id,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = i64, Path, description = "Order ID")),
    responses((status = 200, description = "Order deleted", body = SuccessResponse)),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    order_service::delete_order(&state, id).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = i64, Path, description = "Order ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = SuccessResponse),
        (status = 400, description = "Missing status"),
    ),
    tag = "Orders"
)]
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<SuccessResponse>> {
    order_service::set_status(&state, id, payload.status).await?;
    Ok(Json(SuccessResponse::ok()))
}
