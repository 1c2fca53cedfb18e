use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    db::DbKind,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct AppState {
    /// `None` when every backend candidate failed at startup; handlers
    /// surface `BackendUnavailable` instead of the process crashing.
    pub db: Option<DatabaseConnection>,
    pub kind: DbKind,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: Option<DatabaseConnection>, kind: DbKind, config: AppConfig) -> Self {
        Self { db, kind, config }
    }

    pub fn db(&self) -> AppResult<&DatabaseConnection> {
        self.db.as_ref().ok_or(AppError::BackendUnavailable)
    }
}
