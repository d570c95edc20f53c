use serde::{Deserialize, Deserializer, Serialize};

use super::{
    repo::Todo,
    services::{invalid_content, TodoError},
};

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub content: String,
}

/// Outer `None`: key absent. `Some(None)`: explicit `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default, deserialize_with = "present")]
    pub content: Option<Option<String>>,
}

impl UpdateTodoRequest {
    /// Absent content means "leave unchanged"; `null` is not a string.
    pub fn content(&self) -> Result<Option<&str>, TodoError> {
        match &self.content {
            None => Ok(None),
            Some(Some(c)) => Ok(Some(c.as_str())),
            Some(None) => Err(invalid_content()),
        }
    }
}

fn present<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(de).map(Some)
}

#[derive(Debug, Serialize)]
pub struct TodoMessageResponse {
    pub message: &'static str,
    pub todo: Todo,
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub todo: Todo,
}

#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub count: usize,
    pub todos: Vec<Todo>,
}

#[derive(Debug, Serialize)]
pub struct TodoStats {
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: TodoStats,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
