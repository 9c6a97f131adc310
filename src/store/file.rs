//! Store backed by `board/data.json`.
//!
//! Reads parse the file fresh on every call so separate `tb` processes
//! always see each other's writes. Writes run a locked read-modify-write
//! cycle on the blocking pool and skip the write when nothing changed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use super::data::BoardData;
use super::{CatalogStore, StoreError, TaskStore};
use crate::io::board_io::{self, DATA_FILE};
use crate::io::lock::FileLock;
use crate::model::activity::ActivityEntry;
use crate::model::catalog::{Client, ClientId, Project};
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};

#[derive(Debug)]
pub struct FileStore {
    board_dir: PathBuf,
    /// Serializes writers within this process; the file lock covers the rest
    writer: Mutex<()>,
}

impl FileStore {
    pub fn new(board_dir: impl Into<PathBuf>) -> Self {
        FileStore {
            board_dir: board_dir.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn board_dir(&self) -> &Path {
        &self.board_dir
    }

    async fn load(&self) -> Result<BoardData, StoreError> {
        let path = self.board_dir.join(DATA_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => board_io::parse_data(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BoardData::default()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    async fn modify<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut BoardData) -> Result<T, StoreError> + Send + 'static,
    {
        let _writer = self.writer.lock().await;
        let board_dir = self.board_dir.clone();
        tokio::task::spawn_blocking(move || {
            let _lock = FileLock::acquire_default(&board_dir)?;
            let mut data = board_io::read_data(&board_dir)?;
            let before = data.clone();
            let result = op(&mut data)?;
            if data != before {
                board_io::write_data(&board_dir, &data)?;
                debug!(dir = %board_dir.display(), "board data written");
            }
            Ok(result)
        })
        .await
        .map_err(|e| StoreError::Transport(format!("store worker failed: {}", e)))?
    }
}

#[async_trait]
impl TaskStore for FileStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.load().await?.tasks)
    }

    async fn search_tasks(&self, query: &str) -> Result<Vec<Task>, StoreError> {
        Ok(self.load().await?.search(query))
    }

    async fn update_task_field(&self, id: TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        self.modify(move |data| data.update_task(id, &patch, Utc::now()))
            .await
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        self.modify(move |data| data.create_task(new, Utc::now()))
            .await
    }

    async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, StoreError> {
        Ok(self.load().await?.latest_activity(limit))
    }
}

#[async_trait]
impl CatalogStore for FileStore {
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.load().await?.projects)
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        Ok(self.load().await?.clients)
    }

    async fn create_client(&self, name: &str) -> Result<Client, StoreError> {
        let name = name.to_string();
        self.modify(move |data| data.create_client(&name)).await
    }

    async fn create_project(&self, name: &str, client_id: ClientId) -> Result<Project, StoreError> {
        let name = name.to_string();
        self.modify(move |data| data.create_project(&name, client_id))
            .await
    }
}
