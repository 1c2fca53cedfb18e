use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};

use crate::config::AppConfig;

/// Which engine a connection targets. The embedded engine is the fallback
/// whenever `DATABASE_URL` is absent or not a usable Postgres URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Sqlite,
    Postgres,
}

impl DbKind {
    pub fn label(&self) -> &'static str {
        match self {
            DbKind::Sqlite => "sqlite",
            DbKind::Postgres => "postgres",
        }
    }
}

const DEFAULT_SQLITE_URL: &str = "sqlite://suitstore.db?mode=rwc";

/// A URL selects the networked backend only with a `postgres`/`postgresql`
/// scheme and a real hostname (`base` is the unconfigured placeholder).
pub fn is_postgres_url(url: &str) -> bool {
    let rest = match url
        .strip_prefix("postgres://")
        .or_else(|| url.strip_prefix("postgresql://"))
    {
        Some(rest) => rest,
        None => return false,
    };
    match extract_host(rest) {
        Some(host) => !host.is_empty() && host != "base",
        None => false,
    }
}

fn extract_host(after_scheme: &str) -> Option<&str> {
    let authority = after_scheme.split(['/', '?']).next()?;
    let host_port = authority.rsplit('@').next()?;
    Some(host_port.split(':').next().unwrap_or(host_port))
}

/// Rewrite a pooled endpoint hostname to its direct form, e.g.
/// `ep-x-pooler.region.aws.neon.tech` -> `ep-x.region.aws.neon.tech`.
/// Returns `None` when the URL has no pooled hostname.
pub fn alt_postgres_url(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("postgres://")
        .or_else(|| url.strip_prefix("postgresql://"))?;
    let host = extract_host(rest)?;
    if !host.contains("-pooler.") {
        return None;
    }
    let direct = host.replacen("-pooler.", ".", 1);
    Some(url.replacen(host, &direct, 1))
}

/// Select and open the storage backend. Postgres connection failures try
/// the direct endpoint once; if every candidate fails the process still
/// boots and the health probe reports the outage.
pub async fn connect(config: &AppConfig) -> (Option<DatabaseConnection>, DbKind) {
    if let Some(url) = config.database_url.as_deref().filter(|u| is_postgres_url(u)) {
        let mut candidates = vec![url.to_string()];
        if let Some(alt) = alt_postgres_url(url) {
            candidates.push(alt);
        }
        for candidate in candidates {
            let mut opts = ConnectOptions::new(candidate);
            opts.max_connections(5)
                .connect_timeout(Duration::from_secs(8))
                .sqlx_logging(false);
            match Database::connect(opts).await {
                Ok(conn) => match conn.ping().await {
                    Ok(()) => {
                        tracing::info!("connected to postgres backend");
                        return (Some(conn), DbKind::Postgres);
                    }
                    Err(err) => tracing::warn!(error = %err, "postgres endpoint unreachable"),
                },
                Err(err) => tracing::warn!(error = %err, "postgres connect failed"),
            }
        }
        tracing::error!("all postgres endpoints failed; serving without a database");
        return (None, DbKind::Postgres);
    }

    let url = match config.database_url.as_deref() {
        Some(u) if u.starts_with("sqlite:") => u.to_string(),
        _ => DEFAULT_SQLITE_URL.to_string(),
    };
    match connect_embedded(&url).await {
        Ok(conn) => {
            tracing::info!(url = %url, "connected to sqlite backend");
            (Some(conn), DbKind::Sqlite)
        }
        Err(err) => {
            tracing::error!(error = %err, url = %url, "sqlite open failed");
            (None, DbKind::Sqlite)
        }
    }
}

/// Open the embedded engine with a single pooled connection so that
/// multi-statement transactions from concurrent requests serialize
/// instead of interleaving on one writer.
pub async fn connect_embedded(url: &str) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let mut opts = ConnectOptions::new(url.to_string());
    opts.max_connections(1).sqlx_logging(false);
    Database::connect(opts).await
}

const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, email TEXT UNIQUE NOT NULL, password TEXT NOT NULL, role TEXT DEFAULT 'customer')",
    "CREATE TABLE IF NOT EXISTS products (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, price REAL NOT NULL, description TEXT, category TEXT, image_url TEXT)",
    "CREATE TABLE IF NOT EXISTS product_images (id INTEGER PRIMARY KEY AUTOINCREMENT, product_id INTEGER REFERENCES products(id) ON DELETE CASCADE, url TEXT)",
    "CREATE TABLE IF NOT EXISTS orders (id INTEGER PRIMARY KEY AUTOINCREMENT, user_email TEXT NOT NULL, total_amount REAL NOT NULL, status TEXT DEFAULT 'Pending', created_at TEXT, customer_name TEXT, address TEXT, contact_number TEXT, pieces_count INTEGER, color_preferences TEXT, screenshot_url TEXT)",
    "CREATE TABLE IF NOT EXISTS order_items (id INTEGER PRIMARY KEY AUTOINCREMENT, order_id INTEGER REFERENCES orders(id) ON DELETE CASCADE, product_id INTEGER REFERENCES products(id), quantity INTEGER, price_at_time REAL)",
    "CREATE TABLE IF NOT EXISTS payments (id INTEGER PRIMARY KEY AUTOINCREMENT, order_id INTEGER REFERENCES orders(id) ON DELETE CASCADE, method TEXT, status TEXT DEFAULT 'Pending', paid_amount REAL, transaction_id TEXT, payer_email TEXT, created_at TEXT)",
    "CREATE TABLE IF NOT EXISTS reviews (id INTEGER PRIMARY KEY AUTOINCREMENT, product_id INTEGER REFERENCES products(id) ON DELETE SET NULL, user_name TEXT, rating INTEGER, comment TEXT, status TEXT DEFAULT 'Approved', created_at TEXT)",
    "INSERT OR IGNORE INTO users (name, email, password, role) VALUES ('Admin', 'admin@store.com', 'admin123', 'admin')",
    "INSERT OR IGNORE INTO users (name, email, password, role) VALUES ('Owner', 'owner@store.com', 'owner123', 'admin')",
];

const PG_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL, email TEXT UNIQUE NOT NULL, password TEXT NOT NULL, role TEXT DEFAULT 'customer')",
    "CREATE TABLE IF NOT EXISTS products (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL UNIQUE, price DOUBLE PRECISION NOT NULL, description TEXT, category TEXT, image_url TEXT)",
    "CREATE TABLE IF NOT EXISTS product_images (id BIGSERIAL PRIMARY KEY, product_id BIGINT REFERENCES products(id) ON DELETE CASCADE, url TEXT)",
    "CREATE TABLE IF NOT EXISTS orders (id BIGSERIAL PRIMARY KEY, user_email TEXT NOT NULL, total_amount DOUBLE PRECISION NOT NULL, status TEXT DEFAULT 'Pending', created_at TIMESTAMPTZ, customer_name TEXT, address TEXT, contact_number TEXT, pieces_count INTEGER, color_preferences TEXT, screenshot_url TEXT)",
    "CREATE TABLE IF NOT EXISTS order_items (id BIGSERIAL PRIMARY KEY, order_id BIGINT REFERENCES orders(id) ON DELETE CASCADE, product_id BIGINT REFERENCES products(id), quantity INTEGER, price_at_time DOUBLE PRECISION)",
    "CREATE TABLE IF NOT EXISTS payments (id BIGSERIAL PRIMARY KEY, order_id BIGINT REFERENCES orders(id) ON DELETE CASCADE, method TEXT, status TEXT DEFAULT 'Pending', paid_amount DOUBLE PRECISION, transaction_id TEXT, payer_email TEXT, created_at TIMESTAMPTZ)",
    "CREATE TABLE IF NOT EXISTS reviews (id BIGSERIAL PRIMARY KEY, product_id BIGINT REFERENCES products(id) ON DELETE SET NULL, user_name TEXT, rating INTEGER, comment TEXT, status TEXT DEFAULT 'Approved', created_at TIMESTAMPTZ)",
    "INSERT INTO users (name, email, password, role) VALUES ('Admin', 'admin@store.com', 'admin123', 'admin') ON CONFLICT (email) DO NOTHING",
    "INSERT INTO users (name, email, password, role) VALUES ('Owner', 'owner@store.com', 'owner123', 'admin') ON CONFLICT (email) DO NOTHING",
];

/// Idempotently ensure tables and seed admin accounts. Best-effort: the
/// store must boot and serve reads even if one statement races or fails,
/// so every error is logged and skipped.
pub async fn init_schema(conn: &DatabaseConnection) {
    let backend = conn.get_database_backend();
    let statements = match backend {
        DbBackend::Postgres => PG_SCHEMA,
        _ => SQLITE_SCHEMA,
    };
    for sql in statements {
        if let Err(err) = conn
            .execute(Statement::from_string(backend, (*sql).to_string()))
            .await
        {
            tracing::warn!(error = %err, "schema init statement skipped");
        }
    }
}
