use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::repo::{Todo, TodoStore};
use crate::error::{AppError, FieldError};

pub const MAX_CONTENT_CHARS: usize = 1000;
const CONTENT_MESSAGE: &str = "Content must be between 1 and 1000 characters";

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("Todo not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<TodoError> for AppError {
    fn from(e: TodoError) -> Self {
        match e {
            TodoError::Validation(errors) => AppError::Validation(errors),
            TodoError::NotFound => AppError::NotFound(e.to_string()),
            TodoError::Internal(e) => AppError::Internal(e),
        }
    }
}

pub(crate) fn invalid_content() -> TodoError {
    TodoError::Validation(vec![FieldError::new("content", CONTENT_MESSAGE)])
}

/// Trims and length-checks todo content, returning the value to store.
pub fn validate_content(raw: &str) -> Result<&str, TodoError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_CONTENT_CHARS {
        return Err(invalid_content());
    }
    Ok(trimmed)
}

/// Path ids must be positive integers.
pub fn parse_todo_id(raw: &str) -> Result<i32, TodoError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(TodoError::Validation(vec![FieldError::new("id", "Invalid todo ID")])),
    }
}

/// Todo operations for an already-authorized owner.
pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, owner: Uuid, content: &str) -> Result<Todo, TodoError> {
        let content = validate_content(content)?;
        let todo = self.store.create(owner, content).await?;
        info!(todo_id = todo.id, %owner, "todo created");
        Ok(todo)
    }

    pub async fn list(&self, owner: Uuid) -> Result<Vec<Todo>, TodoError> {
        Ok(self.store.list_by_owner(owner).await?)
    }

    pub async fn get(&self, id: i32, owner: Uuid) -> Result<Todo, TodoError> {
        self.store
            .get_by_id(id, owner)
            .await?
            .ok_or(TodoError::NotFound)
    }

    /// `content: None` returns the stored record unchanged.
    pub async fn update(&self, id: i32, owner: Uuid, content: Option<&str>) -> Result<Todo, TodoError> {
        let content = content.map(validate_content).transpose()?;
        if content.is_none() {
            debug!(todo_id = id, "update without content, returning record as is");
        }
        self.store
            .update(id, owner, content)
            .await?
            .ok_or(TodoError::NotFound)
    }

    pub async fn delete(&self, id: i32, owner: Uuid) -> Result<(), TodoError> {
        if self.store.delete(id, owner).await? {
            info!(todo_id = id, %owner, "todo deleted");
            Ok(())
        } else {
            Err(TodoError::NotFound)
        }
    }

    pub async fn total(&self, owner: Uuid) -> Result<i64, TodoError> {
        Ok(self.store.count_by_owner(owner).await?)
    }
}
