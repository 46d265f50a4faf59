pub mod models;
pub mod quiz;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::path::Path;
use std::time::Duration;
use util::config;

/// Opens the application database.
///
/// `DATABASE_PATH` may be a full DSN or a plain SQLite file path. Pool acquire and
/// connect timeouts come from `DB_TIMEOUT_MS` so no persistence call can block a
/// request indefinitely.
pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    let path_or_url = config::database_path();
    let url = if path_or_url.starts_with("sqlite:")
        || path_or_url.starts_with("postgres://")
        || path_or_url.starts_with("mysql://")
    {
        path_or_url
    } else {
        // SQLite won't create intermediate dirs.
        if let Some(parent) = Path::new(&path_or_url).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        format!("sqlite://{path_or_url}?mode=rwc")
    };

    let timeout = Duration::from_millis(config::db_timeout_ms());
    let mut options = ConnectOptions::new(url);
    options
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .sqlx_logging(false);

    Database::connect(options).await
}

/// Generates a fresh opaque identifier for a new row.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
