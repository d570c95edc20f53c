use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Todo {
    pub id: i32,
    pub uuid: Uuid,
    pub content: String,
    pub user_uuid: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Todo persistence where every read and write is filtered by owner.
/// A row owned by someone else behaves exactly like a missing row.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn create(&self, owner: Uuid, content: &str) -> anyhow::Result<Todo>;
    /// Newest first.
    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Todo>>;
    async fn get_by_id(&self, id: i32, owner: Uuid) -> anyhow::Result<Option<Todo>>;
    /// `None` or empty `content` leaves the row untouched and returns it.
    async fn update(&self, id: i32, owner: Uuid, content: Option<&str>) -> anyhow::Result<Option<Todo>>;
    async fn delete(&self, id: i32, owner: Uuid) -> anyhow::Result<bool>;
    async fn count_by_owner(&self, owner: Uuid) -> anyhow::Result<i64>;
}

#[derive(Clone)]
pub struct PgTodoStore {
    db: PgPool,
}

impl PgTodoStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn create(&self, owner: Uuid, content: &str) -> anyhow::Result<Todo> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (uuid, content, user_uuid)
            VALUES ($1, $2, $3)
            RETURNING id, uuid, content, user_uuid, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(content)
        .bind(owner)
        .fetch_one(&self.db)
        .await?;
        Ok(todo)
    }

    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Todo>> {
        let rows = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, uuid, content, user_uuid, created_at, updated_at
            FROM todos
            WHERE user_uuid = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32, owner: Uuid) -> anyhow::Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, uuid, content, user_uuid, created_at, updated_at
            FROM todos
            WHERE id = $1 AND user_uuid = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        Ok(todo)
    }

    async fn update(&self, id: i32, owner: Uuid, content: Option<&str>) -> anyhow::Result<Option<Todo>> {
        let Some(content) = content.filter(|c| !c.is_empty()) else {
            return self.get_by_id(id, owner).await;
        };
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET content = $1, updated_at = NOW()
            WHERE id = $2 AND user_uuid = $3
            RETURNING id, uuid, content, user_uuid, created_at, updated_at
            "#,
        )
        .bind(content)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        Ok(todo)
    }

    async fn delete(&self, id: i32, owner: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_uuid = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_owner(&self, owner: Uuid) -> anyhow::Result<i64> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM todos WHERE user_uuid = $1")
            .bind(owner)
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }
}
