use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use suitstore_api::{
    config::{AppConfig, SmtpConfig},
    db::{DbKind, connect_embedded, init_schema},
    dto::{
        orders::{LineItemInput, PlaceOrderRequest},
        products::ProductPayload,
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::Entity as Orders,
        payments::{Column as PaymentCol, Entity as Payments},
        product_images::{Column as ImageCol, Entity as ProductImages},
        products::Entity as Products,
    },
    error::AppError,
    services::{order_service, product_service},
    state::AppState,
};

async fn setup_state() -> anyhow::Result<AppState> {
    let conn = connect_embedded("sqlite::memory:").await?;
    init_schema(&conn).await;
    let config = AppConfig {
        database_url: None,
        host: "127.0.0.1".to_string(),
        port: 0,
        upload_dir: std::env::temp_dir(),
        owner_emails: Vec::new(),
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            user: None,
            pass: None,
        },
    };
    Ok(AppState::new(Some(conn), DbKind::Sqlite, config))
}

fn product(name: &str, price: f64) -> ProductPayload {
    ProductPayload {
        name: Some(name.to_string()),
        price: json!(price),
        desc: Some("test product".to_string()),
        image_url: None,
        uploads: Vec::new(),
    }
}

fn line_item(id: i64, qty: i64, price: f64) -> LineItemInput {
    LineItemInput {
        id: json!(id),
        qty: json!(qty),
        price: json!(price),
    }
}

fn order_request(email: &str, items: Vec<LineItemInput>, total: f64) -> PlaceOrderRequest {
    PlaceOrderRequest {
        email: Some(email.to_string()),
        items,
        total: json!(total),
        method: json!("JazzCash"),
        customer_name: Some("A Customer".to_string()),
        address: Some("Somewhere 12".to_string()),
        contact_number: Some("0300-0000000".to_string()),
        pieces_count: json!(3),
        color_preferences: Some("navy".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn placing_an_order_writes_all_three_tables() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product_id = product_service::create_product(&state, product("Suit1", 1000.0)).await?;

    let order_id =
        order_service::place_order(&state, order_request("a@x.com", vec![line_item(product_id, 2, 1000.0)], 2000.0))
            .await?;

    let db = state.db()?;
    let order = Orders::find_by_id(order_id).one(db).await?.expect("order row");
    assert_eq!(order.user_email, "a@x.com");
    assert_eq!(order.total_amount, 2000.0);
    assert_eq!(order.status, "Pending");
    assert_eq!(order.pieces_count, Some(3));

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(db)
        .await?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, Some(product_id));
    assert_eq!(items[0].quantity, Some(2));
    assert_eq!(items[0].price_at_time, Some(1000.0));

    let payments = Payments::find()
        .filter(PaymentCol::OrderId.eq(order_id))
        .all(db)
        .await?;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, "Pending");
    assert_eq!(payments[0].paid_amount, Some(2000.0));
    assert_eq!(payments[0].payer_email.as_deref(), Some("a@x.com"));
    Ok(())
}

#[tokio::test]
async fn rejected_payloads_leave_no_rows_behind() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product_id = product_service::create_product(&state, product("Suit2", 500.0)).await?;
    let db = state.db()?;

    // Blank email.
    let err = order_service::place_order(
        &state,
        order_request("   ", vec![line_item(product_id, 1, 500.0)], 500.0),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Every item fails sanitization.
    let err = order_service::place_order(
        &state,
        order_request(
            "a@x.com",
            vec![line_item(0, 1, 500.0), line_item(product_id, 0, 500.0)],
            500.0,
        ),
    )
    .await
    .unwrap_err();
    match err {
        AppError::Validation(msg) => assert_eq!(msg, "Invalid items"),
        other => panic!("unexpected error: {other:?}"),
    }

    // No items at all.
    let err = order_service::place_order(&state, order_request("a@x.com", Vec::new(), 0.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(Orders::find().count(db).await?, 0);
    assert_eq!(OrderItems::find().count(db).await?, 0);
    assert_eq!(Payments::find().count(db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn invalid_line_items_are_dropped_not_fatal() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product_id = product_service::create_product(&state, product("Suit3", 750.0)).await?;

    let order_id = order_service::place_order(
        &state,
        order_request(
            "b@x.com",
            vec![
                line_item(product_id, 2, 750.0),
                line_item(-1, 2, 750.0),
                line_item(product_id, 1, -10.0),
            ],
            1500.0,
        ),
    )
    .await?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(state.db()?)
        .await?;
    assert_eq!(items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn product_delete_is_blocked_while_order_items_reference_it() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product_id = product_service::create_product(&state, product("Suit4", 1200.0)).await?;
    order_service::place_order(
        &state,
        order_request("c@x.com", vec![line_item(product_id, 1, 1200.0)], 1200.0),
    )
    .await?;

    let err = product_service::delete_product(&state, product_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ReferentialConstraint));

    // The product row is untouched.
    let still_there = Products::find_by_id(product_id).one(state.db()?).await?;
    assert!(still_there.is_some());
    Ok(())
}

#[tokio::test]
async fn product_delete_cascades_owned_images() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let payload = ProductPayload {
        uploads: vec!["/uploads/a.png".to_string(), "/uploads/b.png".to_string()],
        ..product("Suit5", 900.0)
    };
    let product_id = product_service::create_product(&state, payload).await?;
    let db = state.db()?;
    assert_eq!(
        ProductImages::find()
            .filter(ImageCol::ProductId.eq(product_id))
            .count(db)
            .await?,
        1
    );

    product_service::delete_product(&state, product_id).await?;
    assert!(Products::find_by_id(product_id).one(db).await?.is_none());
    assert_eq!(
        ProductImages::find()
            .filter(ImageCol::ProductId.eq(product_id))
            .count(db)
            .await?,
        0
    );
    Ok(())
}

#[tokio::test]
async fn order_delete_cascades_items_and_payments() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product_id = product_service::create_product(&state, product("Suit6", 300.0)).await?;
    let order_id = order_service::place_order(
        &state,
        order_request("d@x.com", vec![line_item(product_id, 4, 300.0)], 1200.0),
    )
    .await?;

    order_service::delete_order(&state, order_id).await?;

    let db = state.db()?;
    assert_eq!(Orders::find().count(db).await?, 0);
    assert_eq!(OrderItems::find().count(db).await?, 0);
    assert_eq!(Payments::find().count(db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn status_updates_are_free_text_but_never_empty() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product_id = product_service::create_product(&state, product("Suit7", 450.0)).await?;
    let order_id = order_service::place_order(
        &state,
        order_request("e@x.com", vec![line_item(product_id, 1, 450.0)], 450.0),
    )
    .await?;

    order_service::set_status(&state, order_id, Some("Received".to_string())).await?;
    let summaries = order_service::list_orders(&state).await?;
    let summary = summaries.iter().find(|o| o.id == order_id).expect("summary");
    assert_eq!(summary.status, "Received");
    assert_eq!(summary.items.len(), 1);
    assert_eq!(summary.items[0].name.as_deref(), Some("Suit7"));

    let err = order_service::set_status(&state, order_id, None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn price_snapshot_is_frozen_against_later_catalog_changes() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product_id = product_service::create_product(&state, product("Suit8", 800.0)).await?;
    let order_id = order_service::place_order(
        &state,
        order_request("f@x.com", vec![line_item(product_id, 1, 800.0)], 800.0),
    )
    .await?;

    // Reprice the product after the order committed.
    let reprice = ProductPayload {
        price: json!(999.0),
        ..ProductPayload::default()
    };
    product_service::update_product(&state, product_id, reprice).await?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(state.db()?)
        .await?;
    assert_eq!(items[0].price_at_time, Some(800.0));
    Ok(())
}

#[tokio::test]
async fn listed_products_resolve_images_primary_first() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let payload = ProductPayload {
        uploads: vec!["/uploads/front.png".to_string(), "/uploads/back.png".to_string()],
        ..product("Suit9", 650.0)
    };
    product_service::create_product(&state, payload).await?;

    let listed = product_service::list_products(&state, "http://localhost:3000").await?;
    let suit = listed.iter().find(|p| p.name == "Suit9").expect("product");
    assert_eq!(
        suit.images,
        vec![
            "http://localhost:3000/uploads/front.png".to_string(),
            "http://localhost:3000/uploads/back.png".to_string(),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn oversized_quantities_never_store_negative() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product_id = product_service::create_product(&state, product("Suit10", 100.0)).await?;
    let db = state.db()?;

    // An order whose only item exceeds i32 is rejected outright.
    let err = order_service::place_order(
        &state,
        order_request(
            "g@x.com",
            vec![line_item(product_id, 2_147_483_648, 100.0)],
            100.0,
        ),
    )
    .await
    .unwrap_err();
    match err {
        AppError::Validation(msg) => assert_eq!(msg, "Invalid items"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(OrderItems::find().count(db).await?, 0);

    // Mixed with a usable item, only the usable one lands.
    let order_id = order_service::place_order(
        &state,
        order_request(
            "g@x.com",
            vec![
                line_item(product_id, 2_147_483_648, 100.0),
                line_item(product_id, 2, 100.0),
            ],
            200.0,
        ),
    )
    .await?;
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(db)
        .await?;
    assert_eq!(items.len(), 1);
    assert!(items[0].quantity.unwrap() >= 1);

    // An out-of-range pieces count is stored as absent, not wrapped.
    let mut request = order_request("h@x.com", vec![line_item(product_id, 1, 100.0)], 100.0);
    request.pieces_count = json!(2_147_483_648_i64);
    let order_id = order_service::place_order(&state, request).await?;
    let order = Orders::find_by_id(order_id).one(db).await?.expect("order row");
    assert_eq!(order.pieces_count, None);
    Ok(())
}

#[tokio::test]
async fn renaming_a_product_onto_a_taken_name_is_a_conflict() -> anyhow::Result<()> {
    let state = setup_state().await?;
    product_service::create_product(&state, product("Suit11", 100.0)).await?;
    let other_id = product_service::create_product(&state, product("Suit12", 200.0)).await?;

    let rename = ProductPayload {
        name: Some("Suit11".to_string()),
        ..ProductPayload::default()
    };
    let err = product_service::update_product(&state, other_id, rename)
        .await
        .unwrap_err();
    match err {
        AppError::Conflict(msg) => assert_eq!(msg, "Product name already exists"),
        other => panic!("unexpected error: {other:?}"),
    }

    // The row keeps its old name.
    let unchanged = Products::find_by_id(other_id).one(state.db()?).await?.expect("product");
    assert_eq!(unchanged.name, "Suit12");
    Ok(())
}
