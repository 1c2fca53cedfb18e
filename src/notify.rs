use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

use crate::{
    config::AppConfig,
    entity::users::{Column as UserCol, Entity as Users},
};

/// Metadata echoed into the owner notification for a freshly committed
/// order.
#[derive(Debug, Clone)]
pub struct OrderNotification {
    pub email: String,
    pub customer_name: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub pieces_count: Option<i32>,
    pub color_preferences: Option<String>,
    pub total: f64,
    pub method: String,
}

/// Best-effort mail fan-out after an order commits. Never returns an
/// error; this path must not throw past its boundary.
pub async fn notify_order_placed(
    db: DatabaseConnection,
    config: AppConfig,
    order_id: i64,
    info: OrderNotification,
) {
    if let Err(err) = try_notify(&db, &config, order_id, &info).await {
        tracing::warn!(error = %err, order_id, "order notification failed");
    }
}

async fn try_notify(
    db: &DatabaseConnection,
    config: &AppConfig,
    order_id: i64,
    info: &OrderNotification,
) -> anyhow::Result<()> {
    let recipients = if config.owner_emails.is_empty() {
        Users::find()
            .filter(UserCol::Role.eq("admin"))
            .select_only()
            .column(UserCol::Email)
            .into_tuple::<String>()
            .all(db)
            .await?
    } else {
        config.owner_emails.clone()
    };
    if recipients.is_empty() {
        return Ok(());
    }

    let (user, pass) = match (&config.smtp.user, &config.smtp.pass) {
        (Some(u), Some(p)) => (u.clone(), p.clone()),
        // No transport credentials configured: silent no-op.
        _ => return Ok(()),
    };

    let dash = "-".to_string();
    let body = format!(
        "Order ID: {order_id}\nEmail: {}\nName: {}\nContact: {}\nAddress: {}\nPieces: {}\nColors: {}\nTotal: {}\nPayment Method: {}",
        info.email,
        info.customer_name.as_ref().unwrap_or(&dash),
        info.contact_number.as_ref().unwrap_or(&dash),
        info.address.as_ref().unwrap_or(&dash),
        info.pieces_count.map(|n| n.to_string()).unwrap_or_else(|| dash.clone()),
        info.color_preferences.as_ref().unwrap_or(&dash),
        info.total,
        info.method,
    );

    let mut builder = Message::builder()
        .from(user.parse()?)
        .subject(format!("New Order #{order_id}"))
        .header(ContentType::TEXT_PLAIN);
    for recipient in &recipients {
        builder = builder.to(recipient.parse()?);
    }
    let message = builder.body(body)?;

    let creds = Credentials::new(user, pass);
    let relay = if config.smtp.port == 465 {
        AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp.host)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp.host)?
    };
    let transport = relay.port(config.smtp.port).credentials(creds).build();

    transport.send(message).await?;
    tracing::info!(order_id, recipients = recipients.len(), "order notification sent");
    Ok(())
}
