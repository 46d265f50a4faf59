use migration::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

/// Connects to a fresh in-memory SQLite database with every migration applied.
///
/// The pool is pinned to one connection: each SQLite in-memory connection is its
/// own database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Connects to a SQLite file under `dir` with a real pool, for tests that need
/// several connections writing at once.
pub async fn setup_file_test_db(dir: &std::path::Path, max_connections: u32) -> DatabaseConnection {
    let url = format!("sqlite://{}?mode=rwc", dir.join("test.db").display());
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(max_connections)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to file db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}
