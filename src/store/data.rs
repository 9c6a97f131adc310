use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::model::activity::{self, ActivityEntry};
use crate::model::catalog::{Catalog, Client, ClientId, Project, ProjectId};
use crate::model::status::Recognized;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::ops::search::TextQuery;

/// Everything a board stores, as laid out in data.json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardData {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub activity: Vec<ActivityEntry>,
}

impl BoardData {
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.clients.clone(), self.projects.clone())
    }

    pub fn search(&self, query: &str) -> Vec<Task> {
        match TextQuery::new(query) {
            Some(q) => self.tasks.iter().filter(|t| q.matches(t)).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn latest_activity(&self, limit: usize) -> Vec<ActivityEntry> {
        activity::latest(&self.activity, limit)
    }

    /// Validate and apply `patch`, recording one activity entry per changed field.
    pub fn update_task(
        &mut self,
        id: TaskId,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        self.validate_patch(patch)?;
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let changes = task.apply_patch(patch);
        let updated = task.clone();
        self.activity.extend(
            changes
                .into_iter()
                .map(|change| ActivityEntry::from_change(id, change, now)),
        );
        Ok(updated)
    }

    pub fn create_task(&mut self, new: NewTask, now: DateTime<Utc>) -> Result<Task, StoreError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(StoreError::Validation("title cannot be empty".into()));
        }
        if let Some(project_id) = new.project_id {
            self.require_project(project_id)?;
        }

        let mut task = Task::new(self.next_task_id(), title);
        task.description = new.description;
        if let Some(status) = new.status {
            task.status = Recognized::Known(status);
        }
        if let Some(priority) = new.priority {
            task.priority = Recognized::Known(priority);
        }
        task.project_id = new.project_id;
        task.assignee = new.assignee;
        task.due_date = new.due_date;
        task.created_at = now;

        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn create_client(&mut self, name: &str) -> Result<Client, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("client name cannot be empty".into()));
        }
        let next = self.clients.iter().map(|c| c.id.0).max().unwrap_or(0) + 1;
        let client = Client {
            id: ClientId(next),
            name: name.to_string(),
        };
        self.clients.push(client.clone());
        Ok(client)
    }

    pub fn create_project(&mut self, name: &str, client_id: ClientId) -> Result<Project, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("project name cannot be empty".into()));
        }
        if !self.clients.iter().any(|c| c.id == client_id) {
            return Err(StoreError::Validation(format!("unknown client: {}", client_id)));
        }
        let next = self.projects.iter().map(|p| p.id.0).max().unwrap_or(0) + 1;
        let project = Project {
            id: ProjectId(next),
            name: name.to_string(),
            client_id,
        };
        self.projects.push(project.clone());
        Ok(project)
    }

    fn next_task_id(&self) -> TaskId {
        TaskId(self.tasks.iter().map(|t| t.id.0).max().unwrap_or(0) + 1)
    }

    fn require_project(&self, id: ProjectId) -> Result<(), StoreError> {
        if self.projects.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(StoreError::Validation(format!("unknown project: {}", id)))
        }
    }

    fn validate_patch(&self, patch: &TaskPatch) -> Result<(), StoreError> {
        if let Some(title) = &patch.title
            && title.trim().is_empty()
        {
            return Err(StoreError::Validation("title cannot be empty".into()));
        }
        if let Some(progress) = patch.progress
            && progress > 100
        {
            return Err(StoreError::Validation(format!(
                "progress must be between 0 and 100, got {}",
                progress
            )));
        }
        if let Some(Some(project_id)) = patch.project_id {
            self.require_project(project_id)?;
        }
        Ok(())
    }
}
