use axum::{
    Json, Router,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{HeaderMap, header},
    routing::{delete, get, post, put},
};
use serde_json::Value;

use crate::{
    dto::{
        SuccessResponse,
        products::{ProductCreated, ProductPayload},
    },
    error::{AppError, AppResult},
    models::Product,
    services::product_service,
    state::AppState,
    upload::save_upload,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/{id}", put(update_product))
        .route("/{id}", delete(delete_product))
}

/// Origin used to absolutize backend-relative image URLs, taken from the
/// Host header the storefront connected through. Behind a TLS-terminating
/// proxy the scheme comes from `x-forwarded-proto`.
pub fn request_base(headers: &HeaderMap, state: &AppState) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}:{}", state.config.host, state.config.port));
    format!("{scheme}://{host}")
}

/// Accept either a multipart form (admin dashboard uploads) or a JSON
/// body with the same field names. Uploaded files are stored first and
/// their URLs attached to the payload.
async fn parse_product_payload(state: &AppState, req: Request) -> AppResult<ProductPayload> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(payload) = Json::<ProductPayload>::from_request(req, state)
            .await
            .map_err(|err| AppError::Validation(err.to_string()))?;
        return Ok(payload);
    }

    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|err| AppError::Validation(err.to_string()))?;
    let mut payload = ProductPayload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => payload.name = Some(field.text().await.unwrap_or_default()),
            "price" => payload.price = Value::String(field.text().await.unwrap_or_default()),
            "desc" => payload.desc = Some(field.text().await.unwrap_or_default()),
            "image_url" => payload.image_url = Some(field.text().await.unwrap_or_default()),
            "images" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::Validation(err.to_string()))?;
                let url = save_upload(&state.config.upload_dir, &filename, &bytes).await?;
                payload.uploads.push(url);
            }
            _ => {}
        }
    }
    Ok(payload)
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "All products with resolved images", body = Vec<Product>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<Product>>> {
    let base = request_base(&headers, &state);
    let products = product_service::list_products(&state, &base).await?;
    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/api/products",
    responses(
        (status = 200, description = "Product created", body = ProductCreated),
        (status = 400, description = "Invalid price or missing name"),
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    req: Request,
) -> AppResult<Json<ProductCreated>> {
    let payload = parse_product_payload(&state, req).await?;
    let id = product_service::create_product(&state, payload).await?;
    Ok(Json(ProductCreated { success: true, id }))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product updated", body = SuccessResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    req: Request,
) -> AppResult<Json<SuccessResponse>> {
    let payload = parse_product_payload(&state, req).await?;
    product_service::update_product(&state, id, payload).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = SuccessResponse),
        (status = 400, description = "Referenced by existing order items"),
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuccessResponse>> {
    product_service::delete_product(&state, id).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AppConfig, SmtpConfig},
        db::DbKind,
    };

    fn state() -> AppState {
        let config = AppConfig {
            database_url: None,
            host: "127.0.0.1".to_string(),
            port: 3000,
            upload_dir: std::path::PathBuf::from("uploads"),
            owner_emails: Vec::new(),
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 587,
                user: None,
                pass: None,
            },
        };
        AppState::new(None, DbKind::Sqlite, config)
    }

    #[test]
    fn base_defaults_to_http_and_config_host() {
        let headers = HeaderMap::new();
        assert_eq!(request_base(&headers, &state()), "http://127.0.0.1:3000");
    }

    #[test]
    fn base_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "shop.example.com".parse().unwrap());
        assert_eq!(request_base(&headers, &state()), "http://shop.example.com");
    }

    #[test]
    fn base_honors_forwarded_proto_behind_tls_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "shop.example.com".parse().unwrap());
        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        assert_eq!(request_base(&headers, &state()), "https://shop.example.com");

        headers.insert("x-forwarded-proto", "https, http".parse().unwrap());
        assert_eq!(request_base(&headers, &state()), "https://shop.example.com");
    }
}
