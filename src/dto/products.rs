use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Product fields from either a multipart form (admin dashboard) or a
/// JSON body. Uploaded image URLs are attached by the route layer after
/// the files land in storage.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductPayload {
    pub name: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub price: Value,
    pub desc: Option<String>,
    pub image_url: Option<String>,
    #[serde(skip)]
    pub uploads: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductCreated {
    pub success: bool,
    pub id: i64,
}
