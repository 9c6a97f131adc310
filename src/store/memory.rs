//! In-memory store, used by tests and as a scratch board.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::data::BoardData;
use super::{CatalogStore, StoreError, TaskStore};
use crate::model::activity::ActivityEntry;
use crate::model::catalog::{Client, ClientId, Project};
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<BoardData>,
}

impl InMemoryStore {
    pub fn new(data: BoardData) -> Self {
        InMemoryStore {
            data: RwLock::new(data),
        }
    }

    /// A copy of the current contents
    pub async fn snapshot(&self) -> BoardData {
        self.data.read().await.clone()
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.data.read().await.tasks.clone())
    }

    async fn search_tasks(&self, query: &str) -> Result<Vec<Task>, StoreError> {
        Ok(self.data.read().await.search(query))
    }

    async fn update_task_field(&self, id: TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        self.data.write().await.update_task(id, &patch, Utc::now())
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        self.data.write().await.create_task(new, Utc::now())
    }

    async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, StoreError> {
        Ok(self.data.read().await.latest_activity(limit))
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.data.read().await.projects.clone())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        Ok(self.data.read().await.clients.clone())
    }

    async fn create_client(&self, name: &str) -> Result<Client, StoreError> {
        self.data.write().await.create_client(name)
    }

    async fn create_project(&self, name: &str, client_id: ClientId) -> Result<Project, StoreError> {
        self.data.write().await.create_project(name, client_id)
    }
}
