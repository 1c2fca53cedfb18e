use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub product_id: Value,
    pub name: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub rating: Value,
    pub comment: Option<String>,
}
