use std::path::Path;

use anyhow::Context;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

use crate::models::{Paste, PasteSummary};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS pastes (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    syntax TEXT NOT NULL DEFAULT 'auto',
    allow_edit BOOLEAN NOT NULL DEFAULT 0,
    pw_salt TEXT,
    pw_hash TEXT,
    created_at INTEGER NOT NULL,
    expires_at INTEGER
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_pastes_expires_at ON pastes (expires_at)";

const PASTE_COLUMNS: &str =
    "id, content, syntax, allow_edit, pw_salt, pw_hash, created_at, expires_at";

#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    /// Connect to a database by URL and make sure the schema exists.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let mut options = AnyPoolOptions::new();

        if url.contains(":memory:") {
            // every connection would otherwise get its own empty database
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else if let Some(parent) = sqlite_parent_dir(url) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let pool = options
            .connect(url)
            .await
            .with_context(|| format!("failed to connect to {url}"))?;

        let database = Self { pool };
        database.migrate().await?;
        Ok(database)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(CREATE_TABLE)
            .execute(&mut conn)
            .await
            .context("failed to create pastes table")?;
        sqlx::query(CREATE_INDEX)
            .execute(&mut conn)
            .await
            .context("failed to create expiry index")?;
        Ok(())
    }

    /// Get a paste by id.
    pub async fn get_paste(&self, id: &str) -> crate::ApiResult<Paste> {
        let mut conn = self.pool.acquire().await?;
        let paste = sqlx::query_as::<_, Paste>(&format!(
            "SELECT {PASTE_COLUMNS} FROM pastes WHERE id = ?"
        ))
        .bind(id)
        .fetch_one(&mut conn)
        .await?;
        Ok(paste)
    }

    /// Insert a paste. Fails with a database error if the id is taken.
    pub async fn insert_paste(&self, paste: &Paste) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(&format!(
            "INSERT INTO pastes ({PASTE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&paste.id)
        .bind(&paste.content)
        .bind(&paste.syntax)
        .bind(paste.allow_edit)
        .bind(&paste.pw_salt)
        .bind(&paste.pw_hash)
        .bind(paste.created_at)
        .bind(paste.expires_at)
        .execute(&mut conn)
        .await?;
        Ok(())
    }

    /// Replace a paste's content. Returns whether a row was updated.
    pub async fn update_content(&self, id: &str, content: &str) -> crate::ApiResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query("UPDATE pastes SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&mut conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a paste by id. Returns whether a row was deleted.
    pub async fn delete_paste(&self, id: &str) -> crate::ApiResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query("DELETE FROM pastes WHERE id = ?")
            .bind(id)
            .execute(&mut conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every paste that expired before `now`.
    pub async fn delete_expired(&self, now: i64) -> crate::ApiResult<u64> {
        let mut conn = self.pool.acquire().await?;
        let result =
            sqlx::query("DELETE FROM pastes WHERE expires_at IS NOT NULL AND expires_at < ?")
                .bind(now)
                .execute(&mut conn)
                .await?;
        Ok(result.rows_affected())
    }

    /// The most recently created pastes, newest first.
    pub async fn recent_pastes(&self, limit: i64) -> crate::ApiResult<Vec<PasteSummary>> {
        let mut conn = self.pool.acquire().await?;
        let pastes = sqlx::query_as::<_, PasteSummary>(
            "SELECT id, created_at AS created, COALESCE(expires_at, 0) AS expires, allow_edit \
             FROM pastes ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&mut conn)
        .await?;
        Ok(pastes)
    }
}

/// Whether an insert failed because the primary key already exists.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(error) => {
            // sqlite: SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_UNIQUE
            matches!(error.code().as_deref(), Some("1555" | "2067"))
                || error.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}

fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}
