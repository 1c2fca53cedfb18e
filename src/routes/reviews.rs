use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::{SuccessResponse, reviews::CreateReviewRequest},
    error::AppResult,
    models::Review,
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(create_review))
        .route("/reviews/{product_id}", get(list_reviews))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 200, description = "Review recorded", body = SuccessResponse),
        (status = 400, description = "Missing fields"),
    ),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<Json<SuccessResponse>> {
    review_service::create_review(&state, payload).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    get,
    path = "/api/reviews/{product_id}",
    params(("product_id" = i64, Path, description = "Product ID")),
    responses((status = 200, description = "Approved reviews, newest first", body = Vec<Review>)),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = review_service::list_reviews(&state, product_id).await?;
    Ok(Json(reviews))
}
