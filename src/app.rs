//! Application bootstrap: storage selection, module lifecycle and serving.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;

use bookshelf_db::Database;
use bookshelf_kernel::settings::{DatabaseBackend, DatabaseSettings, Settings};
use bookshelf_kernel::{InitCtx, ModuleRegistry};

use crate::books::store::{MemoryBookStore, SharedStore, SqliteBookStore};
use crate::modules;

/// Book store plus the database behind it, if any.
pub struct Storage {
    pub store: SharedStore,
    pub database: Option<Database>,
}

impl Storage {
    pub fn open(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        if settings.is_in_memory() {
            tracing::warn!(backend = ?settings.backend, "books will not survive a restart");
        }

        match settings.backend {
            DatabaseBackend::Memory => Ok(Self {
                store: Arc::new(MemoryBookStore::new()),
                database: None,
            }),
            DatabaseBackend::Sqlite => {
                let database = Database::connect(settings)
                    .with_context(|| format!("failed to open database '{}'", settings.path))?;
                Ok(Self {
                    store: Arc::new(SqliteBookStore::new(database.clone())),
                    database: Some(database),
                })
            }
        }
    }
}

/// Registered modules and the storage they share.
pub struct Application {
    pub registry: ModuleRegistry,
    pub storage: Storage,
}

impl Application {
    /// Open storage, register modules and bring the schema up to date
    pub async fn assemble(settings: &Settings) -> anyhow::Result<Self> {
        let storage = Storage::open(&settings.database)?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, storage.store.clone())?;

        let app = Self { registry, storage };
        app.migrate().await?;
        Ok(app)
    }

    /// Apply pending migrations; a no-op for the memory backend
    pub async fn migrate(&self) -> anyhow::Result<usize> {
        let Some(database) = &self.storage.database else {
            return Ok(0);
        };

        let applied = database
            .migrate(&self.registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, "migrations up to date");
        Ok(applied)
    }

    /// Drop every table, then recreate the schema. The memory backend has
    /// nothing persistent to drop.
    pub async fn reset(&self) -> anyhow::Result<()> {
        if let Some(database) = &self.storage.database {
            database
                .drop_all()
                .await
                .context("failed to drop tables")?;
        }
        self.migrate().await?;
        Ok(())
    }

    pub fn store(&self) -> SharedStore {
        self.storage.store.clone()
    }

    pub fn router(&self, settings: &Settings) -> Router {
        bookshelf_http::build_router(&self.registry, settings)
    }
}

/// Run the server until Ctrl-C, driving the module lifecycle around it
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let app = Application::assemble(&settings).await?;
    let ctx = InitCtx {
        settings: &settings,
    };

    app.registry.init_all(&ctx).await?;
    app.registry.start_all(&ctx).await?;

    let served = bookshelf_http::start_server(&app.registry, &settings, shutdown_signal()).await;

    app.registry.stop_all().await?;
    tracing::info!("bookshelf shutdown complete");
    served
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(error = %err, "failed to listen for shutdown signal"),
    }
}
