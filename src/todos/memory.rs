use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::{Todo, TodoStore};

#[derive(Default)]
struct Table {
    next_id: i32,
    rows: Vec<Todo>,
}

/// Process-local todo store with the same owner filtering as the SQL store.
#[derive(Default)]
pub struct InMemoryTodoStore {
    table: RwLock<Table>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn create(&self, owner: Uuid, content: &str) -> anyhow::Result<Todo> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let todo = Todo {
            id: table.next_id,
            uuid: Uuid::new_v4(),
            content: content.to_string(),
            user_uuid: owner,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(todo.clone());
        Ok(todo)
    }

    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Todo>> {
        let table = self.table.read().await;
        let mut rows: Vec<Todo> = table
            .rows
            .iter()
            .filter(|t| t.user_uuid == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32, owner: Uuid) -> anyhow::Result<Option<Todo>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .iter()
            .find(|t| t.id == id && t.user_uuid == owner)
            .cloned())
    }

    async fn update(&self, id: i32, owner: Uuid, content: Option<&str>) -> anyhow::Result<Option<Todo>> {
        let mut table = self.table.write().await;
        let Some(todo) = table
            .rows
            .iter_mut()
            .find(|t| t.id == id && t.user_uuid == owner)
        else {
            return Ok(None);
        };
        if let Some(content) = content.filter(|c| !c.is_empty()) {
            todo.content = content.to_string();
            todo.updated_at = OffsetDateTime::now_utc();
        }
        Ok(Some(todo.clone()))
    }

    async fn delete(&self, id: i32, owner: Uuid) -> anyhow::Result<bool> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|t| !(t.id == id && t.user_uuid == owner));
        Ok(table.rows.len() < before)
    }

    async fn count_by_owner(&self, owner: Uuid) -> anyhow::Result<i64> {
        let table = self.table.read().await;
        Ok(table.rows.iter().filter(|t| t.user_uuid == owner).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_operation_is_owner_scoped() {
        let store = InMemoryTodoStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let todo = store.create(alice, "milk").await.unwrap();

        assert!(store.get_by_id(todo.id, bob).await.unwrap().is_none());
        assert!(store.update(todo.id, bob, Some("hacked")).await.unwrap().is_none());
        assert!(!store.delete(todo.id, bob).await.unwrap());
        assert!(store.list_by_owner(bob).await.unwrap().is_empty());
        assert_eq!(store.count_by_owner(bob).await.unwrap(), 0);

        assert_eq!(store.get_by_id(todo.id, alice).await.unwrap().unwrap().content, "milk");
        assert!(store.delete(todo.id, alice).await.unwrap());
        assert!(store.get_by_id(todo.id, alice).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_without_content_is_a_no_op() {
        let store = InMemoryTodoStore::new();
        let owner = Uuid::new_v4();
        let todo = store.create(owner, "milk").await.unwrap();
        assert_eq!(store.update(todo.id, owner, None).await.unwrap(), Some(todo.clone()));
        assert_eq!(store.update(todo.id, owner, Some("")).await.unwrap(), Some(todo));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemoryTodoStore::new();
        let owner = Uuid::new_v4();
        for c in ["a", "b", "c"] {
            store.create(owner, c).await.unwrap();
        }
        let contents: Vec<_> = store
            .list_by_owner(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(contents, ["c", "b", "a"]);
    }
}
