use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// One raw line item as the client submits it. Fields arrive as numbers
/// or numeric strings; anything that fails coercion is dropped during
/// sanitization rather than failing the whole payload.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct LineItemInput {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub id: Value,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub qty: Value,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub price: Value,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub email: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub total: Value,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub method: Value,
    pub customer_name: Option<String>,
    /// Legacy storefront builds send `name` instead of `customerName`.
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub pieces_count: Value,
    pub color_preferences: Option<String>,
    #[serde(skip)]
    pub screenshot_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPlaced {
    pub success: bool,
    #[serde(rename = "orderId")]
    pub order_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

/// JS-style `Number()` coercion: numbers pass through, numeric strings
/// parse, everything else is `None`.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn coerce_i64(value: &Value) -> Option<i64> {
    coerce_f64(value).map(|f| f as i64)
}
