use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User shape returned to the storefront; the digest never leaves the
/// server.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Catalog product with its image sequence resolved (primary first, then
/// extras, absolutized when backend-relative).
#[derive(Debug, Serialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLine {
    pub name: Option<String>,
    pub qty: Option<i32>,
}

/// Order header with its line items aggregated, as the admin dashboard
/// consumes it.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummary {
    pub id: i64,
    pub email: String,
    pub total: f64,
    pub date: Option<DateTime<FixedOffset>>,
    pub status: String,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Review {
    pub id: i64,
    pub user_name: Option<String>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<FixedOffset>>,
}
