use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    str::FromStr,
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use tokio::sync::RwLock;

pub mod session;

pub use session::{clear_session, is_logged_in, load_session, save_session, StoredSession};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/student.db";

/// Client-side persistent key/value store. Values are opaque strings.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        StoreLocation::parse(database_url)?.ensure_parent_dir()?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        // One connection keeps `sqlite::memory:` a single shared database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite store '{database_url}'"))?;

        let store = Self { pool };
        store.ensure_kv_table().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_kv_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                key        TEXT PRIMARY KEY NOT NULL,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure kv_entries table exists")?;
        Ok(())
    }

    pub async fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT updated_at FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read timestamp for '{key}'"))?;
        row.map(|r| r.try_get::<DateTime<Utc>, _>(0))
            .transpose()
            .context("malformed updated_at column")
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM kv_entries ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .context("failed to list stored keys")?;
        rows.into_iter()
            .map(|r| r.try_get::<String, _>(0).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read '{key}'"))?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write '{key}'"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove '{key}'"))?;
        Ok(())
    }
}

/// Process-local store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Where the session store lives, as written in settings or on the
/// command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

impl StoreLocation {
    /// Accepts `sqlite:` urls, a bare file path, or `memory`. Blank input
    /// means the default store file.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::parse(DEFAULT_DATABASE_URL);
        }
        if matches!(raw, "memory" | ":memory:") || raw.starts_with("sqlite::memory:") {
            return Ok(Self::Memory);
        }

        let path = match raw
            .strip_prefix("sqlite://")
            .or_else(|| raw.strip_prefix("sqlite:"))
        {
            Some(rest) => rest.split('?').next().unwrap_or_default(),
            None if raw.contains("://") => bail!("store '{raw}' is not a sqlite location"),
            None => raw,
        };
        if path.is_empty() {
            bail!("store '{raw}' names no file");
        }
        Ok(Self::File(PathBuf::from(path)))
    }

    pub fn database_url(&self) -> String {
        match self {
            Self::Memory => "sqlite::memory:".to_string(),
            Self::File(path) => format!("sqlite://{}", path.display()),
        }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        let Self::File(path) = self else {
            return Ok(());
        };
        let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
            return Ok(());
        };
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create directory '{}' for session store",
                parent.display()
            )
        })
    }
}

/// Resolves a configured store location into a sqlite url and creates the
/// directory the store file goes in.
pub fn prepare_database_url(raw: &str) -> Result<String> {
    let location = StoreLocation::parse(raw)?;
    location.ensure_parent_dir()?;
    Ok(location.database_url())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
