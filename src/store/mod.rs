//! Task store contract.
//!
//! The board engine never owns task data. It reads collections from a store,
//! asks the store to change one task at a time, and refetches whatever the
//! returned [`Invalidation`] names.

pub mod data;
pub mod file;
pub mod memory;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::io::lock::LockError;
use crate::model::activity::ActivityEntry;
use crate::model::catalog::{Client, ClientId, Project};
use crate::model::status::VocabError;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};

pub use data::BoardData;
pub use file::FileStore;
pub use memory::InMemoryStore;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("invalid update: {0}")]
    Validation(String),
    #[error("store unavailable: {0}")]
    Transport(String),
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt board data: {0}")]
    Data(#[from] serde_json::Error),
    #[error(transparent)]
    Lock(#[from] LockError),
}

impl From<VocabError> for StoreError {
    fn from(err: VocabError) -> Self {
        StoreError::Validation(err.to_string())
    }
}

/// Tasks, search and single-task updates.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// Tasks whose text fields match `query`
    async fn search_tasks(&self, query: &str) -> Result<Vec<Task>, StoreError>;

    /// Apply `patch` to one task and return the stored result.
    ///
    /// Re-issuing a patch whose values are already stored changes nothing.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` is unknown, `Validation` if the patch is rejected.
    async fn update_task_field(&self, id: TaskId, patch: TaskPatch) -> Result<Task, StoreError>;

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError>;

    /// The newest `limit` activity entries, newest first
    async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, StoreError>;
}

/// Clients and projects.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError>;

    async fn create_client(&self, name: &str) -> Result<Client, StoreError>;

    async fn create_project(&self, name: &str, client_id: ClientId) -> Result<Project, StoreError>;
}

/// A store serving both tasks and the catalog
pub trait BoardStore: TaskStore + CatalogStore {}

impl<T: TaskStore + CatalogStore + ?Sized> BoardStore for T {}

/// Which cached collections must be refetched after an operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub tasks: bool,
    pub activity: bool,
    pub catalog: bool,
}

impl Invalidation {
    pub const NONE: Invalidation = Invalidation {
        tasks: false,
        activity: false,
        catalog: false,
    };

    /// What any task mutation invalidates, whether it succeeded or not
    pub const TASKS: Invalidation = Invalidation {
        tasks: true,
        activity: true,
        catalog: false,
    };

    pub const ALL: Invalidation = Invalidation {
        tasks: true,
        activity: true,
        catalog: true,
    };

    pub fn is_empty(self) -> bool {
        self == Invalidation::NONE
    }
}
