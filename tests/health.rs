use axum::extract::State;
use axum::http::StatusCode;
use suitstore_api::{
    config::{AppConfig, SmtpConfig},
    db::{DbKind, connect_embedded, init_schema},
    routes::health::health_check,
    state::AppState,
};

fn test_config() -> AppConfig {
    AppConfig {
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
    }
}

#[tokio::test]
async fn health_reports_ok_on_a_live_backend() -> anyhow::Result<()> {
    let conn = connect_embedded("sqlite::memory:").await?;
    init_schema(&conn).await;
    let state = AppState::new(Some(conn), DbKind::Sqlite, test_config());

    let response = health_check(State(state)).await;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn health_reports_failure_without_crashing_when_no_backend() {
    let state = AppState::new(None, DbKind::Postgres, test_config());

    let response = health_check(State(state)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
