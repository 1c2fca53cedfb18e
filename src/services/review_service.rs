use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::{
    dto::{orders::coerce_i64, reviews::CreateReviewRequest},
    entity::reviews::{self, Column as ReviewCol, Entity as Reviews},
    error::{AppError, AppResult},
    models::Review,
    state::AppState,
};

pub async fn create_review(state: &AppState, payload: CreateReviewRequest) -> AppResult<()> {
    let db = state.db()?;

    let product_id = coerce_i64(&payload.product_id).filter(|id| *id > 0);
    let name = payload.name.filter(|n| !n.trim().is_empty());
    let rating = coerce_i64(&payload.rating);
    let (product_id, name, rating) = match (product_id, name, rating) {
        (Some(p), Some(n), Some(r)) => (p, n, r),
        _ => return Err(AppError::Validation("Missing fields".into())),
    };
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation("Invalid rating".into()));
    }

    reviews::ActiveModel {
        id: NotSet,
        product_id: Set(Some(product_id)),
        user_name: Set(Some(name)),
        rating: Set(Some(rating as i32)),
        comment: Set(Some(payload.comment.unwrap_or_default())),
        status: Set("Approved".to_string()),
        created_at: Set(Some(Utc::now().into())),
    }
    .insert(db)
    .await?;

    Ok(())
}

pub async fn list_reviews(state: &AppState, product_id: i64) -> AppResult<Vec<Review>> {
    let db = state.db()?;

    let rows = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product_id))
        .filter(ReviewCol::Status.eq("Approved"))
        .order_by_desc(ReviewCol::CreatedAt)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|r| Review {
            id: r.id,
            user_name: r.user_name,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        })
        .collect())
}
