//! Application bootstrap: pool, module registry, migrations and the serve loop.

use anyhow::Context;
use axum::Router;
use sqlx::SqlitePool;

use bookstore_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// A fully initialised service, ready to serve.
pub struct Application {
    settings: Settings,
    registry: ModuleRegistry,
    pool: SqlitePool,
}

impl Application {
    /// Connect the database, register modules, apply pending migrations and
    /// initialise every module.
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let pool = bookstore_db::connect(&settings.database).await?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &pool);
        tracing::info!(modules = registry.module_count(), "modules registered");

        let applied = migrate(&registry, &pool).await?;
        tracing::info!(applied, "database schema up to date");

        registry
            .init_modules(&InitCtx {
                settings: &settings,
            })
            .await
            .context("module initialization failed")?;

        Ok(Self {
            settings,
            registry,
            pool,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The complete HTTP router, middleware included
    pub fn router(&self) -> Router {
        bookstore_http::build_router(&self.registry, &self.settings)
    }

    /// Start modules, serve until a shutdown signal, then stop modules and
    /// close the pool.
    pub async fn run(self) -> anyhow::Result<()> {
        let ctx = InitCtx {
            settings: &self.settings,
        };
        self.registry
            .start_modules(&ctx)
            .await
            .context("module start failed")?;

        let served = bookstore_http::start_server(&self.registry, &self.settings).await;

        if let Err(err) = self.registry.stop_modules().await {
            tracing::error!(error = %err, "module shutdown failed");
        }
        self.pool.close().await;
        tracing::info!("bookstore-app stopped");

        served
    }
}

/// Apply every registered module's pending migrations, returning how many ran.
pub async fn migrate(registry: &ModuleRegistry, pool: &SqlitePool) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    bookstore_db::run_migrations(pool, &migrations)
        .await
        .context("failed to apply migrations")
}

/// Connect to the configured database and bring its schema up to date.
pub async fn migrate_database(settings: &Settings) -> anyhow::Result<usize> {
    let pool = bookstore_db::connect(&settings.database).await?;
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &pool);

    let applied = migrate(&registry, &pool).await;
    pool.close().await;
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_kernel::settings::DatabaseSettings;

    fn in_memory_settings() -> Settings {
        Settings {
            database: DatabaseSettings::in_memory(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn build_applies_schema_once() {
        let app = Application::build(in_memory_settings()).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(app.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, app.pool());
        assert_eq!(migrate(&registry, app.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn migrate_database_reports_applied_migrations() {
        assert_eq!(migrate_database(&in_memory_settings()).await.unwrap(), 1);
    }
}
