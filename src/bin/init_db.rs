//! Standalone schema initializer: connects to whatever backend the
//! environment selects, ensures tables and seed admin accounts exist,
//! then exits. Useful for provisioning a fresh database before first
//! boot.

use suitstore_api::{config::AppConfig, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let (conn, kind) = db::connect(&config).await;
    let conn = conn.ok_or_else(|| anyhow::anyhow!("no {} backend reachable", kind.label()))?;

    db::init_schema(&conn).await;
    println!("Schema ensured on {} backend.", kind.label());
    Ok(())
}
