//! Ephemeral test databases.
//!
//! A [`TestDatabase`] owns a fresh SQLite connection with a schema loaded from
//! migration files. Settings come from an explicit [`HarnessConfig`], never
//! from process-wide state.

use crate::config::{HarnessConfig, StorageMode};
use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A throwaway database, removed when dropped
pub struct TestDatabase {
    conn: Connection,
    path: Option<PathBuf>,
}

impl TestDatabase {
    /// Open an empty database and apply `migrations`.
    ///
    /// `migrations` is either a single `.sql` file or a directory whose `*.sql`
    /// files are applied in lexical order.
    pub fn open(config: &HarnessConfig, migrations: impl AsRef<Path>) -> Result<Self> {
        let db = Self::empty(config)?;
        db.migrate(migrations.as_ref())?;
        Ok(db)
    }

    /// Open an empty database without a schema
    pub fn empty(config: &HarnessConfig) -> Result<Self> {
        let (conn, path) = match config.storage {
            StorageMode::Memory => (
                Connection::open_in_memory().context("Failed to open in-memory database")?,
                None,
            ),
            StorageMode::File => {
                fs::create_dir_all(&config.data_dir).with_context(|| {
                    format!("Failed to create data directory {}", config.data_dir.display())
                })?;
                let path = config
                    .data_dir
                    .join(format!("sqlrt_test_{}.db", Uuid::new_v4().simple()));
                let conn = Connection::open(&path)
                    .with_context(|| format!("Failed to open database {}", path.display()))?;
                (conn, Some(path))
            }
        };

        if config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")
                .context("Failed to enable foreign keys")?;
        }
        debug!(storage = ?config.storage, path = ?path, "test_database_opened");
        Ok(TestDatabase { conn, path })
    }

    /// Apply one migration file or a directory of them
    pub fn migrate(&self, migrations: &Path) -> Result<()> {
        for file in migration_files(migrations)? {
            let sql = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read migration {}", file.display()))?;
            self.conn
                .execute_batch(&sql)
                .with_context(|| format!("Failed to apply migration {}", file.display()))?;
            debug!(file = %file.display(), "migration_applied");
        }
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// File backing the database, if not in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "test_database_cleanup_failed");
            }
        }
    }
}

/// Migration files under `path`, in the order they apply
pub fn migration_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("Migration path {} does not exist", path.display());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path)
        .with_context(|| format!("Failed to list migrations in {}", path.display()))?
    {
        let file = entry?.path();
        if file.is_file() && file.extension().is_some_and(|ext| ext == "sql") {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}
