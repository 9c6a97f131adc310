use std::fmt;

use serde::{Deserialize, Serialize};

use super::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub client_id: ClientId,
}

/// Clients and projects as read from the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub clients: Vec<Client>,
    pub projects: Vec<Project>,
}

impl Catalog {
    pub fn new(clients: Vec<Client>, projects: Vec<Project>) -> Self {
        Catalog { clients, projects }
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// The task's project, or `None` when unset or dangling
    pub fn project_of(&self, task: &Task) -> Option<&Project> {
        task.project_id.and_then(|id| self.project(id))
    }

    /// The client owning the task's project
    pub fn client_of(&self, task: &Task) -> Option<ClientId> {
        self.project_of(task).map(|p| p.client_id)
    }

    /// Projects belonging to `client`, in catalog order
    pub fn projects_of(&self, client: ClientId) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(move |p| p.client_id == client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskId;

    fn sample_catalog() -> Catalog {
        Catalog::new(
            vec![
                Client { id: ClientId(5), name: "Acme".into() },
                Client { id: ClientId(6), name: "Globex".into() },
            ],
            vec![
                Project { id: ProjectId(10), name: "Website".into(), client_id: ClientId(5) },
                Project { id: ProjectId(11), name: "Billing".into(), client_id: ClientId(6) },
                Project { id: ProjectId(12), name: "Mobile".into(), client_id: ClientId(5) },
            ],
        )
    }

    #[test]
    fn test_projects_of_client() {
        let catalog = sample_catalog();
        let ids: Vec<_> = catalog.projects_of(ClientId(5)).map(|p| p.id).collect();
        assert_eq!(ids, vec![ProjectId(10), ProjectId(12)]);
    }

    #[test]
    fn test_client_of_task() {
        let catalog = sample_catalog();
        let mut task = Task::new(TaskId(1), "Landing page");
        assert_eq!(catalog.client_of(&task), None);
        task.project_id = Some(ProjectId(11));
        assert_eq!(catalog.client_of(&task), Some(ClientId(6)));
    }

    #[test]
    fn test_dangling_project_is_no_project() {
        let catalog = sample_catalog();
        let mut task = Task::new(TaskId(1), "Orphan");
        task.project_id = Some(ProjectId(99));
        assert!(catalog.project_of(&task).is_none());
        assert_eq!(catalog.client_of(&task), None);
    }
}
