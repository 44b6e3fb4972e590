//! SQLite pool factory and migration runner.

use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use bookstore_kernel::settings::DatabaseSettings;
use bookstore_kernel::Migration;

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        id         TEXT PRIMARY KEY,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// Open a connection pool for the configured database, creating the file if needed.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    // In-memory databases live only as long as their connection, so pooled
    // connections are never reaped.
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to database '{}'", settings.url))?;

    tracing::info!(
        target: "bookstore-db",
        url = %settings.url,
        max_connections = settings.max_connections,
        "database pool ready"
    );

    Ok(pool)
}

/// Apply every migration not yet recorded in `_migrations`.
///
/// Each migration runs in its own transaction together with its bookkeeping row,
/// so a failing migration leaves no partial schema behind. Returns how many
/// migrations were applied.
pub async fn run_migrations(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::query(MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .context("failed to create migrations table")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let key = format!("{}/{}", module, migration.id);

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
                .bind(&key)
                .fetch_optional(pool)
                .await
                .with_context(|| format!("failed to look up migration '{}'", key))?;
        if existing.is_some() {
            tracing::debug!(target: "bookstore-db", migration = %key, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await.context("failed to open migration transaction")?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration '{}' failed", key))?;
        sqlx::query("INSERT INTO _migrations (id) VALUES (?)")
            .bind(&key)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to record migration '{}'", key))?;
        tx.commit()
            .await
            .with_context(|| format!("failed to commit migration '{}'", key))?;

        tracing::info!(target: "bookstore-db", migration = %key, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
