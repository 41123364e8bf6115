//! SQLite connection factory, migration runner and teardown.
//!
//! `rusqlite` is blocking, so every statement goes through [`Database::call`],
//! which runs the closure on tokio's blocking pool while holding the
//! connection lock.

use std::sync::{Arc, Mutex};

use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use bookshelf_kernel::settings::DatabaseSettings;
use bookshelf_kernel::Migration;

const MIGRATIONS_TABLE: &str = "_migrations";

/// Scalar SQL function lowercasing text with full Unicode case mapping.
/// SQLite's own `lower()` and `LIKE` only fold ASCII.
pub const UNICODE_LOWER: &str = "unicode_lower";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("database connection lock poisoned")]
    Poisoned,
}

/// Shared handle to a single SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the database described by `settings`.
    ///
    /// A path of `:memory:` yields a private in-memory database that lives as
    /// long as the handle.
    pub fn connect(settings: &DatabaseSettings) -> Result<Self, DbError> {
        let conn = if settings.path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&settings.path)?
        };

        tracing::info!(target: "bookshelf-db", path = %settings.path, "database connected");
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, DbError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an open connection, registering the custom SQL functions.
    pub fn from_connection(conn: Connection) -> Result<Self, DbError> {
        register_functions(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut Connection) -> Result<T, rusqlite::Error> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| DbError::Poisoned)?;
            f(&mut guard).map_err(DbError::from)
        })
        .await?
    }

    /// Apply every migration not yet recorded in `_migrations`.
    ///
    /// Each migration runs in its own transaction together with its
    /// bookkeeping row. Returns how many were applied.
    pub async fn migrate(&self, migrations: &[(String, Migration)]) -> Result<usize, DbError> {
        let migrations = migrations.to_vec();

        let applied = self
            .call(move |conn| {
                conn.execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
                        module     TEXT NOT NULL,
                        id         TEXT NOT NULL,
                        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                        PRIMARY KEY (module, id)
                    )"
                ))?;

                let mut applied = Vec::new();
                for (module, migration) in &migrations {
                    let tx = conn.transaction()?;
                    let seen = tx
                        .query_row(
                            &format!(
                                "SELECT 1 FROM {MIGRATIONS_TABLE} WHERE module = ?1 AND id = ?2"
                            ),
                            params![module, migration.id],
                            |_| Ok(()),
                        )
                        .optional()?
                        .is_some();
                    if seen {
                        continue;
                    }

                    tx.execute_batch(migration.up)?;
                    tx.execute(
                        &format!("INSERT INTO {MIGRATIONS_TABLE} (module, id) VALUES (?1, ?2)"),
                        params![module, migration.id],
                    )?;
                    tx.commit()?;
                    applied.push(format!("{}/{}", module, migration.id));
                }
                Ok(applied)
            })
            .await?;

        for migration in &applied {
            tracing::info!(target: "bookshelf-db", migration = %migration, "migration applied");
        }
        Ok(applied.len())
    }

    /// Drop every user table, migration bookkeeping included.
    pub async fn drop_all(&self) -> Result<(), DbError> {
        let dropped = self
            .call(|conn| {
                let tables = user_tables(conn)?;
                let tx = conn.transaction()?;
                for table in &tables {
                    tx.execute_batch(&format!("DROP TABLE IF EXISTS \"{}\"", table))?;
                }
                tx.commit()?;
                Ok(tables)
            })
            .await?;

        tracing::warn!(target: "bookshelf-db", tables = ?dropped, "all tables dropped");
        Ok(())
    }

    /// Names of user tables, sorted
    pub async fn tables(&self) -> Result<Vec<String>, DbError> {
        self.call(|conn| user_tables(conn)).await
    }
}

fn register_functions(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

fn user_tables(conn: &Connection) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrations() -> Vec<(String, Migration)> {
        vec![(
            "shelf".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE shelf (id INTEGER PRIMARY KEY, label TEXT NOT NULL);",
            },
        )]
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = Database::in_memory().unwrap();

        assert_eq!(db.migrate(&migrations()).await.unwrap(), 1);
        assert_eq!(db.migrate(&migrations()).await.unwrap(), 0);

        assert_eq!(db.tables().await.unwrap(), vec!["_migrations", "shelf"]);
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let db = Database::in_memory().unwrap();
        let broken = vec![(
            "shelf".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE;",
            },
        )];

        assert!(matches!(
            db.migrate(&broken).await,
            Err(DbError::Sqlite(_))
        ));

        let recorded: i64 = db
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(recorded, 0);
    }

    #[tokio::test]
    async fn drop_all_removes_data_and_allows_remigration() {
        let db = Database::in_memory().unwrap();
        db.migrate(&migrations()).await.unwrap();
        db.call(|conn| conn.execute("INSERT INTO shelf (label) VALUES ('top')", []))
            .await
            .unwrap();

        db.drop_all().await.unwrap();
        assert!(db.tables().await.unwrap().is_empty());

        assert_eq!(db.migrate(&migrations()).await.unwrap(), 1);
        let rows: i64 = db
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM shelf", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn connect_honours_memory_path() {
        let settings = DatabaseSettings {
            path: ":memory:".to_string(),
            ..DatabaseSettings::default()
        };
        let db = Database::connect(&settings).unwrap();
        assert!(db.tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unicode_lower_folds_beyond_ascii() {
        let db = Database::in_memory().unwrap();

        let folded: (String, Option<String>) = db
            .call(|conn| {
                conn.query_row(
                    "SELECT unicode_lower('ÉMILE Война'), unicode_lower(NULL)",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
            })
            .await
            .unwrap();

        assert_eq!(folded, ("émile война".to_string(), None));
    }
}
