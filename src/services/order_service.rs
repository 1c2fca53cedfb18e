use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};

use crate::{
    dto::orders::{LineItemInput, PlaceOrderRequest, coerce_f64, coerce_i64},
    entity::{
        order_items::{self, Column as OrderItemCol, Entity as OrderItems},
        orders::{self, Column as OrderCol, Entity as Orders},
        payments::{self, Column as PaymentCol, Entity as Payments},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    models::{OrderLine, OrderSummary},
    notify::{OrderNotification, notify_order_placed},
    state::AppState,
};

/// A line item that survived sanitization: resolvable product, positive
/// quantity, non-negative price.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeItem {
    pub product_id: i64,
    pub qty: i32,
    pub price: f64,
}

pub fn sanitize_items(items: &[LineItemInput]) -> Vec<SafeItem> {
    items
        .iter()
        .filter_map(|item| {
            let product_id = coerce_i64(&item.id)?;
            // Checked narrowing; a quantity outside i32 is dropped like
            // any other unusable item rather than wrapping negative.
            let qty = i32::try_from(coerce_i64(&item.qty)?).ok()?;
            let price = coerce_f64(&item.price)?;
            if product_id > 0 && qty > 0 && price >= 0.0 {
                Some(SafeItem {
                    product_id,
                    qty,
                    price,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Persist order header, line items and one pending payment as a single
/// atomic unit, then fan out the owner notification post-commit.
///
/// All validation happens before the transaction opens: a rejected
/// payload leaves zero rows behind. The total is taken from the client
/// as-is rather than recomputed from the sanitized items.
pub async fn place_order(state: &AppState, payload: PlaceOrderRequest) -> AppResult<i64> {
    let db = state.db()?;

    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".into()))?
        .to_string();
    if payload.items.is_empty() {
        return Err(AppError::Validation("Items are required".into()));
    }
    let safe_items = sanitize_items(&payload.items);
    if safe_items.is_empty() {
        return Err(AppError::Validation("Invalid items".into()));
    }
    let total = coerce_f64(&payload.total)
        .ok_or_else(|| AppError::Validation("Invalid total".into()))?;
    let method = payload
        .method
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| "Unknown".to_string());
    let customer_name = payload.customer_name.clone().or_else(|| payload.name.clone());
    let pieces_count = coerce_i64(&payload.pieces_count).and_then(|n| i32::try_from(n).ok());

    let now = Utc::now().into();
    let txn = db.begin().await?;

    let order = orders::ActiveModel {
        id: NotSet,
        user_email: Set(email.clone()),
        total_amount: Set(total),
        status: Set("Pending".to_string()),
        created_at: Set(Some(now)),
        customer_name: Set(customer_name.clone()),
        address: Set(payload.address.clone()),
        contact_number: Set(payload.contact_number.clone()),
        pieces_count: Set(pieces_count),
        color_preferences: Set(payload.color_preferences.clone()),
        screenshot_url: Set(payload.screenshot_url.clone()),
    }
    .insert(&txn)
    .await?;

    for item in &safe_items {
        order_items::ActiveModel {
            id: NotSet,
            order_id: Set(Some(order.id)),
            product_id: Set(Some(item.product_id)),
            quantity: Set(Some(item.qty)),
            price_at_time: Set(Some(item.price)),
        }
        .insert(&txn)
        .await?;
    }

    payments::ActiveModel {
        id: NotSet,
        order_id: Set(Some(order.id)),
        method: Set(Some(method.clone())),
        status: Set("Pending".to_string()),
        paid_amount: Set(Some(total)),
        transaction_id: Set(None),
        payer_email: Set(Some(email.clone())),
        created_at: Set(Some(now)),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    // Post-commit hook, detached from the request's error channel.
    let notification = OrderNotification {
        email,
        customer_name,
        contact_number: payload.contact_number,
        address: payload.address,
        pieces_count,
        color_preferences: payload.color_preferences,
        total,
        method,
    };
    tokio::spawn(notify_order_placed(
        db.clone(),
        state.config.clone(),
        order.id,
        notification,
    ));

    Ok(order.id)
}

pub async fn list_orders(state: &AppState) -> AppResult<Vec<OrderSummary>> {
    let db = state.db()?;

    let orders = Orders::find().all(db).await?;
    let items = OrderItems::find()
        .find_also_related(Products)
        .all(db)
        .await?;

    let mut lines: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    for (item, product) in items {
        if let Some(order_id) = item.order_id {
            lines.entry(order_id).or_default().push(OrderLine {
                name: product.map(|p| p.name),
                qty: item.quantity,
            });
        }
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderSummary {
            items: lines.remove(&order.id).unwrap_or_default(),
            id: order.id,
            email: order.user_email,
            total: order.total_amount,
            date: order.created_at,
            status: order.status,
        })
        .collect())
}

/// Remove an order and everything it owns. The cascade is explicit so
/// the embedded backend behaves identically to the networked one.
pub async fn delete_order(state: &AppState, id: i64) -> AppResult<()> {
    let db = state.db()?;
    let txn = db.begin().await?;

    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(id))
        .exec(&txn)
        .await?;
    Payments::delete_many()
        .filter(PaymentCol::OrderId.eq(id))
        .exec(&txn)
        .await?;
    Orders::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Free-text status; any non-empty string is accepted.
pub async fn set_status(state: &AppState, id: i64, status: Option<String>) -> AppResult<()> {
    let db = state.db()?;
    let status = status
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Missing status".into()))?;

    Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(status))
        .filter(OrderCol::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: serde_json::Value, qty: serde_json::Value, price: serde_json::Value) -> LineItemInput {
        LineItemInput { id, qty, price }
    }

    #[test]
    fn drops_items_failing_validation() {
        let items = vec![
            item(json!(1), json!(2), json!(1000)),
            item(json!(0), json!(2), json!(1000)),
            item(json!(2), json!(0), json!(1000)),
            item(json!(3), json!(-1), json!(1000)),
            item(json!(4), json!(1), json!(-5)),
            item(json!("5"), json!("3"), json!("250.5")),
            item(json!("junk"), json!(1), json!(10)),
        ];
        let safe = sanitize_items(&items);
        assert_eq!(
            safe,
            vec![
                SafeItem { product_id: 1, qty: 2, price: 1000.0 },
                SafeItem { product_id: 5, qty: 3, price: 250.5 },
            ]
        );
    }

    #[test]
    fn quantities_beyond_i32_are_dropped_not_wrapped() {
        let items = vec![
            item(json!(1), json!(2_147_483_648_i64), json!(10)),
            item(json!(2), json!("9999999999"), json!(10)),
            item(json!(3), json!(2), json!(10)),
        ];
        let safe = sanitize_items(&items);
        assert_eq!(
            safe,
            vec![SafeItem { product_id: 3, qty: 2, price: 10.0 }]
        );
        assert!(safe.iter().all(|s| s.qty >= 1));
    }

    #[test]
    fn free_items_are_kept() {
        let safe = sanitize_items(&[item(json!(9), json!(1), json!(0))]);
        assert_eq!(safe.len(), 1);
        assert_eq!(safe[0].price, 0.0);
    }
}
