use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::users::repo_types::UserRecord;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All rows, ordered by id ascending.
    async fn find_all(&self) -> anyhow::Result<Vec<UserRecord>>;
    /// One zero-based page of `size` rows, ordered by id ascending.
    async fn find_all_paged(&self, page: i64, size: i64) -> anyhow::Result<Vec<UserRecord>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<UserRecord>>;
    /// Inserts when `record.id` is `None`, otherwise overwrites the row with that id.
    async fn save(&self, record: UserRecord) -> anyhow::Result<UserRecord>;
    async fn delete(&self, record: &UserRecord) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_all(&self) -> anyhow::Result<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, name, password, username
              FROM users
             ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn find_all_paged(&self, page: i64, size: i64) -> anyhow::Result<Vec<UserRecord>> {
        let offset = page
            .checked_mul(size)
            .context("page offset overflows")?;
        let rows = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, name, password, username
              FROM users
             ORDER BY id ASC
             LIMIT $1 OFFSET $2
            "#,
        )
        .bind(size)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list users page")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, name, password, username
              FROM users
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("find user {}", id))?;
        Ok(row)
    }

    async fn save(&self, record: UserRecord) -> anyhow::Result<UserRecord> {
        let saved = match record.id {
            None => sqlx::query_as::<_, UserRecord>(
                r#"
                INSERT INTO users (email, name, password, username)
                VALUES ($1, $2, $3, $4)
                RETURNING id, email, name, password, username
                "#,
            )
            .bind(&record.email)
            .bind(&record.name)
            .bind(&record.password)
            .bind(&record.username)
            .fetch_one(&self.db)
            .await
            .context("insert user")?,
            Some(id) => sqlx::query_as::<_, UserRecord>(
                r#"
                UPDATE users
                   SET email = $1, name = $2, password = $3, username = $4
                 WHERE id = $5
                RETURNING id, email, name, password, username
                "#,
            )
            .bind(&record.email)
            .bind(&record.name)
            .bind(&record.password)
            .bind(&record.username)
            .bind(id)
            .fetch_one(&self.db)
            .await
            .with_context(|| format!("update user {}", id))?,
        };
        Ok(saved)
    }

    async fn delete(&self, record: &UserRecord) -> anyhow::Result<()> {
        let Some(id) = record.id else {
            return Ok(());
        };
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete user {}", id))?;
        Ok(())
    }
}

/// Process-local store with the same ordering and id semantics as the table.
#[derive(Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<MemoryTable>,
}

#[derive(Default)]
struct MemoryTable {
    rows: BTreeMap<i64, UserRecord>,
    last_id: i64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_all(&self) -> anyhow::Result<Vec<UserRecord>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn find_all_paged(&self, page: i64, size: i64) -> anyhow::Result<Vec<UserRecord>> {
        let offset = page
            .checked_mul(size)
            .context("page offset overflows")?;
        let offset = usize::try_from(offset).context("negative page offset")?;
        let size = usize::try_from(size).context("negative page size")?;
        let table = self.inner.read().await;
        Ok(table.rows.values().skip(offset).take(size).cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<UserRecord>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn save(&self, mut record: UserRecord) -> anyhow::Result<UserRecord> {
        let mut table = self.inner.write().await;
        let id = match record.id {
            Some(id) => {
                anyhow::ensure!(table.rows.contains_key(&id), "update user {}: row not found", id);
                id
            }
            None => {
                table.last_id += 1;
                table.last_id
            }
        };
        record.id = Some(id);
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn delete(&self, record: &UserRecord) -> anyhow::Result<()> {
        if let Some(id) = record.id {
            self.inner.write().await.rows.remove(&id);
        }
        Ok(())
    }
}
