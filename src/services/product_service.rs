use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};

use crate::{
    dto::{orders::coerce_f64, products::ProductPayload},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        product_images::{self, Column as ImageCol, Entity as ProductImages},
        products::{self, Entity as Products},
    },
    error::{AppError, AppResult},
    models::Product,
    state::AppState,
};

const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400";

/// All products with their image sequences resolved: primary image first,
/// extras after, backend-relative URLs absolutized against `base`.
pub async fn list_products(state: &AppState, base: &str) -> AppResult<Vec<Product>> {
    let db = state.db()?;

    let products = Products::find().all(db).await?;
    let images = ProductImages::find().all(db).await?;

    let mut extra: HashMap<i64, Vec<String>> = HashMap::new();
    for image in images {
        if let (Some(product_id), Some(url)) = (image.product_id, image.url) {
            extra.entry(product_id).or_default().push(url);
        }
    }

    Ok(products
        .into_iter()
        .map(|p| {
            let mut urls: Vec<String> = Vec::new();
            if let Some(primary) = &p.image_url {
                urls.push(primary.clone());
            }
            urls.extend(extra.remove(&p.id).unwrap_or_default());
            let mut resolved: Vec<String> = urls
                .into_iter()
                .filter(|u| !u.is_empty())
                .map(|u| absolutize(&u, base))
                .collect();
            if resolved.is_empty() {
                resolved.push(format!("{base}/placeholder.svg"));
            }
            Product {
                id: p.id,
                name: p.name,
                price: p.price,
                description: p.description,
                category: p.category,
                image_url: p.image_url,
                images: resolved,
            }
        })
        .collect())
}

fn absolutize(url: &str, base: &str) -> String {
    if url.starts_with('/') {
        format!("{base}{url}")
    } else {
        url.to_string()
    }
}

pub async fn create_product(state: &AppState, payload: ProductPayload) -> AppResult<i64> {
    let db = state.db()?;

    let name = payload
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Name is required".into()))?;
    let price = coerce_f64(&payload.price)
        .filter(|p| *p >= 0.0)
        .ok_or_else(|| AppError::Validation("Invalid price".into()))?;

    let primary = payload
        .uploads
        .first()
        .cloned()
        .or(payload.image_url)
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    let product = products::ActiveModel {
        id: NotSet,
        name: Set(name),
        price: Set(price),
        description: Set(payload.desc),
        category: Set(Some("suits".to_string())),
        image_url: Set(Some(primary)),
    }
    .insert(db)
    .await
    .map_err(|err| {
        if crate::error::is_unique_violation(&err) {
            AppError::Conflict("Product name already exists".into())
        } else {
            err.into()
        }
    })?;

    for url in payload.uploads.iter().skip(1) {
        product_images::ActiveModel {
            id: NotSet,
            product_id: Set(Some(product.id)),
            url: Set(Some(url.clone())),
        }
        .insert(db)
        .await?;
    }

    Ok(product.id)
}

/// Update provided scalar fields; a first new image replaces the primary
/// URL and the rest append as extra images. Existing extras stay.
pub async fn update_product(state: &AppState, id: i64, payload: ProductPayload) -> AppResult<()> {
    let db = state.db()?;

    let existing = Products::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: products::ActiveModel = existing.into();
    if let Some(name) = payload.name.filter(|n| !n.trim().is_empty()) {
        active.name = Set(name);
    }
    if let Some(price) = coerce_f64(&payload.price) {
        if price < 0.0 {
            return Err(AppError::Validation("Invalid price".into()));
        }
        active.price = Set(price);
    }
    if let Some(desc) = payload.desc {
        active.description = Set(Some(desc));
    }
    if let Some(primary) = payload.uploads.first().cloned().or(payload.image_url) {
        active.image_url = Set(Some(primary));
    }
    active.update(db).await.map_err(|err| {
        if crate::error::is_unique_violation(&err) {
            AppError::Conflict("Product name already exists".into())
        } else {
            err.into()
        }
    })?;

    for url in payload.uploads.iter().skip(1) {
        product_images::ActiveModel {
            id: NotSet,
            product_id: Set(Some(id)),
            url: Set(Some(url.clone())),
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

/// Delete a product and its owned images atomically, unless any
/// historical order line still references it.
pub async fn delete_product(state: &AppState, id: i64) -> AppResult<()> {
    let db = state.db()?;
    let txn = db.begin().await?;

    let referencing = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&txn)
        .await?;
    if referencing > 0 {
        // Dropping the transaction rolls it back; nothing was mutated.
        return Err(AppError::ReferentialConstraint);
    }

    ProductImages::delete_many()
        .filter(ImageCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    Products::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}
