use crate::config::DatabaseConfig;
use crate::db::models::Credential;
use crate::db::schema::SQLITE_INIT;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub type SqlitePool = Pool<Sqlite>;

const SELECT_COLUMNS: &str = "SELECT id, created_at, email_address, name, version FROM credentials";

/// Open the pool described by `cfg` and make sure the database answers.
pub async fn connect(cfg: &DatabaseConfig) -> Result<SqlitePool, StoreError> {
    let connect_opts = SqliteConnectOptions::from_str(&cfg.url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .idle_timeout(cfg.max_idle())
        .connect_with(connect_opts)
        .await?;

    let timeout = cfg.query_timeout();
    tokio::time::timeout(timeout, sqlx::query("SELECT 1").execute(&pool))
        .await
        .map_err(|_| StoreError::Timeout(timeout))??;
    Ok(pool)
}

#[derive(Clone)]
pub struct CredentialsStorage {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl CredentialsStorage {
    pub fn new(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            self.timed(sqlx::query(s).execute(&self.pool)).await?;
        }
        Ok(())
    }

    /// Persist a new row; writes the assigned id, created_at and version back.
    pub async fn insert(&self, credential: &mut Credential) -> Result<(), StoreError> {
        let row = self
            .timed(
                sqlx::query(
                    r#"INSERT INTO credentials (name, email_address)
                       VALUES (?, ?)
                       RETURNING id, created_at, version"#,
                )
                .bind(&credential.name)
                .bind(&credential.email_address)
                .fetch_one(&self.pool),
            )
            .await?;

        credential.id = row.try_get("id")?;
        credential.created_at = parse_timestamp(row.try_get("created_at")?)?;
        credential.version = row.try_get("version")?;
        debug!(id = credential.id, "credential inserted");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Credential, StoreError> {
        if id < 1 {
            return Err(StoreError::RecordNotFound);
        }
        let row = self
            .timed(
                sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?
            .ok_or(StoreError::RecordNotFound)?;
        Self::row_to_model(row)
    }

    /// Every whitespace-separated term of a non-empty filter must occur,
    /// case-insensitively, in the matching column. Rows come back by id.
    pub async fn get_all(
        &self,
        email_filter: &str,
        name_filter: &str,
    ) -> Result<Vec<Credential>, StoreError> {
        // SQLite's lower() only folds ASCII, so terms are matched here
        let email_terms = lowercase_terms(email_filter);
        let name_terms = lowercase_terms(name_filter);

        let rows = self
            .timed(sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id")).fetch_all(&self.pool))
            .await?;

        let mut matched = Vec::new();
        for row in rows {
            let credential = Self::row_to_model(row)?;
            if contains_all(&credential.email_address, &email_terms)
                && contains_all(&credential.name, &name_terms)
            {
                matched.push(credential);
            }
        }
        Ok(matched)
    }

    /// Write `email_address` and `name`, bump the version, and write the new
    /// version back. A row that disappeared since it was read is
    /// `RecordNotFound`.
    pub async fn update(&self, credential: &mut Credential) -> Result<(), StoreError> {
        let version: i32 = self
            .timed(
                sqlx::query_scalar::<_, i32>(
                    r#"UPDATE credentials
                       SET email_address = ?, name = ?, version = version + 1
                       WHERE id = ?
                       RETURNING version"#,
                )
                .bind(&credential.email_address)
                .bind(&credential.name)
                .bind(credential.id)
                .fetch_optional(&self.pool),
            )
            .await?
            .ok_or(StoreError::RecordNotFound)?;

        credential.version = version;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if id < 1 {
            return Err(StoreError::RecordNotFound);
        }
        let result = self
            .timed(
                sqlx::query("DELETE FROM credentials WHERE id = ?")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound);
        }
        Ok(())
    }

    /// Run `fut` under the store's deadline. On expiry the future is dropped,
    /// which cancels the in-flight statement.
    async fn timed<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(res) => res.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.query_timeout)),
        }
    }

    fn row_to_model(row: SqliteRow) -> Result<Credential, StoreError> {
        let id: i64 = row.try_get("id")?;
        let created_at: String = row.try_get("created_at")?;
        let email_address: String = row.try_get("email_address")?;
        let name: String = row.try_get("name")?;
        let version: i32 = row.try_get("version")?;

        Ok(Credential {
            id,
            created_at: parse_timestamp(created_at)?,
            email_address,
            name,
            version,
        })
    }
}

fn lowercase_terms(filter: &str) -> Vec<String> {
    filter.split_whitespace().map(str::to_lowercase).collect()
}

fn contains_all(value: &str, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let value = value.to_lowercase();
    terms.iter().all(|term| value.contains(term.as_str()))
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, StoreError> {
    let parsed = DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);
    Ok(parsed)
}
