//! A board session: the state one dashboard works from.
//!
//! The session owns the last fetched snapshot, the filter selections, the
//! search tracker and a queue of user-facing notices. Events are applied one
//! at a time through `&mut self`; views are recomputed from scratch on every
//! call to [`BoardSession::view`].

use serde::Serialize;
use tracing::{debug, warn};

use super::columns::{BoardColumns, ColumnMap, Location};
use super::filter::{self, BoardView, DimensionChange, FilterError, FilterState, ViewInputs};
use super::search::{SearchState, SearchTicket, SearchTracker};
use super::transition::{self, DragOutcome, DragResult};
use crate::model::activity::ActivityEntry;
use crate::model::catalog::Catalog;
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::store::{BoardStore, CatalogStore, Invalidation, StoreError, TaskStore};

/// How many activity entries a session keeps
pub const ACTIVITY_FEED_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message the user must see
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct BoardSession {
    columns: ColumnMap,
    tasks: Vec<Task>,
    catalog: Catalog,
    activity: Vec<ActivityEntry>,
    filters: FilterState,
    search: SearchTracker,
    notices: Vec<Notice>,
}

impl BoardSession {
    /// An empty session; call [`BoardSession::resync`] to fill it.
    pub fn new(columns: ColumnMap) -> Self {
        BoardSession {
            columns,
            tasks: Vec::new(),
            catalog: Catalog::default(),
            activity: Vec::new(),
            filters: FilterState::default(),
            search: SearchTracker::default(),
            notices: Vec::new(),
        }
    }

    pub async fn load<S>(store: &S, columns: ColumnMap) -> Result<Self, StoreError>
    where
        S: BoardStore + ?Sized,
    {
        let mut session = BoardSession::new(columns);
        session.resync(store, Invalidation::ALL).await?;
        Ok(session)
    }

    /// Refetch the collections named by `invalidation`.
    pub async fn resync<S>(&mut self, store: &S, invalidation: Invalidation) -> Result<(), StoreError>
    where
        S: BoardStore + ?Sized,
    {
        if invalidation.tasks {
            self.tasks = store.list_tasks().await?;
        }
        if invalidation.activity {
            self.activity = store.list_activity(ACTIVITY_FEED_LEN).await?;
        }
        if invalidation.catalog {
            let clients = store.list_clients().await?;
            let projects = store.list_projects().await?;
            self.catalog = Catalog::new(clients, projects);
        }
        debug!(?invalidation, tasks = self.tasks.len(), "session resynced");
        Ok(())
    }

    /// Resync, reporting a failed refetch as a notice.
    async fn refresh<S>(&mut self, store: &S, invalidation: Invalidation)
    where
        S: BoardStore + ?Sized,
    {
        if let Err(err) = self.resync(store, invalidation).await {
            warn!(error = %err, "resync failed");
            self.notices
                .push(Notice::error(format!("Could not refresh the board: {}", err)));
        }
    }

    // -----------------------------------------------------------------------
    // Filters and search
    // -----------------------------------------------------------------------

    /// Apply one filter selection. A rejected selection leaves the state as it was.
    pub fn select(&mut self, change: DimensionChange) -> Result<(), FilterError> {
        self.filters.apply(change).inspect_err(|err| {
            self.notices.push(Notice::error(err.to_string()));
        })
    }

    /// Issue a new query; blank clears search. Filters are left alone.
    pub fn begin_search(&mut self, query: &str) -> Option<SearchTicket> {
        self.search.begin(query)
    }

    /// Land a search response. Stale responses are dropped and return false.
    pub fn finish_search(&mut self, ticket: SearchTicket, result: Result<Vec<Task>, StoreError>) -> bool {
        let failure = result
            .as_ref()
            .err()
            .map(|err| format!("Search for \"{}\" failed: {}", ticket.query(), err));
        let applied = self.search.complete(ticket, result);
        if applied && let Some(message) = failure {
            warn!("{}", message);
            self.notices.push(Notice::error(message));
        }
        applied
    }

    pub async fn set_query<S>(&mut self, store: &S, query: &str)
    where
        S: BoardStore + ?Sized,
    {
        if let Some(ticket) = self.begin_search(query) {
            let result = store.search_tasks(ticket.query()).await;
            self.finish_search(ticket, result);
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Where a task sits on the unfiltered board
    pub fn locate(&self, id: TaskId) -> Option<Location> {
        self.columns.locate(&self.tasks, id)
    }

    /// Complete a drag end and bring the session up to date with the store.
    pub async fn drag_end<S>(&mut self, store: &S, drag: &DragResult) -> DragOutcome
    where
        S: BoardStore + ?Sized,
    {
        let outcome = transition::complete_drag(store, &self.columns, drag).await;
        self.apply_outcome(store, &outcome).await;
        outcome
    }

    /// Fold a drag outcome computed elsewhere (e.g. concurrently) into the session.
    pub async fn apply_outcome<S>(&mut self, store: &S, outcome: &DragOutcome)
    where
        S: BoardStore + ?Sized,
    {
        match outcome {
            DragOutcome::NoChange(_) => {}
            DragOutcome::Moved { invalidate, .. } => self.refresh(store, *invalidate).await,
            DragOutcome::Failed {
                task_id,
                error,
                invalidate,
            } => {
                self.notices
                    .push(Notice::error(format!("Could not move task {}: {}", task_id, error)));
                self.refresh(store, *invalidate).await;
            }
        }
    }

    /// Update one task through the store, resyncing either way.
    pub async fn update_task<S>(
        &mut self,
        store: &S,
        id: TaskId,
        patch: TaskPatch,
    ) -> Result<Task, StoreError>
    where
        S: BoardStore + ?Sized,
    {
        match store.update_task_field(id, patch).await {
            Ok(task) => {
                self.refresh(store, Invalidation::TASKS).await;
                Ok(task)
            }
            Err(err) => {
                warn!(task = %id, error = %err, "task update failed");
                self.notices
                    .push(Notice::error(format!("Could not update task {}: {}", id, err)));
                self.refresh(store, Invalidation::TASKS).await;
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn view(&self) -> BoardView {
        filter::derive_view(
            &self.filters,
            ViewInputs {
                tasks: &self.tasks,
                catalog: &self.catalog,
                search: self.search.state(),
            },
        )
    }

    /// Lay out a view's tasks in lanes
    pub fn lanes<'a>(&self, view: &'a BoardView) -> BoardColumns<'a> {
        self.columns.group(&view.filtered_tasks)
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn activity(&self) -> &[ActivityEntry] {
        &self.activity
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn search_state(&self) -> &SearchState {
        self.search.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::{ClientId, ProjectId};
    use crate::model::status::Status;
    use crate::model::task::NewTask;
    use crate::store::InMemoryStore;

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::default();
        let client = store.create_client("Acme").await.unwrap();
        let project = store.create_project("Website", client.id).await.unwrap();
        for (title, assignee) in [("Fix bug", "ana"), ("Write docs", "ben")] {
            store
                .create_task(NewTask {
                    title: title.into(),
                    project_id: Some(project.id),
                    assignee: Some(assignee.into()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_load_fills_snapshot() {
        let store = seeded_store().await;
        let session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
        assert_eq!(session.tasks().len(), 2);
        assert_eq!(session.catalog().projects.len(), 1);
        assert_eq!(session.view().filtered_tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_selection_becomes_notice() {
        let store = seeded_store().await;
        let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
        assert!(session.select(DimensionChange::Project(Some(ProjectId(1)))).is_err());
        assert_eq!(session.drain_notices().len(), 1);
        assert!(session.filters().is_unset());
    }

    #[tokio::test]
    async fn test_query_and_filters_are_independent() {
        let store = seeded_store().await;
        let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
        session.select(DimensionChange::Client(Some(ClientId(1)))).unwrap();
        session.set_query(&store, "bug").await;
        assert_eq!(session.filters().client(), Some(ClientId(1)));

        session.select(DimensionChange::Status(Some(Status::Todo))).unwrap();
        assert_eq!(session.search_state().query(), Some("bug"));
        let view = session.view();
        assert_eq!(view.filtered_tasks.len(), 1);
        assert_eq!(view.filtered_tasks[0].title, "Fix bug");
    }

    #[tokio::test]
    async fn test_move_is_visible_through_active_search() {
        let store = seeded_store().await;
        let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
        session.set_query(&store, "bug").await;

        let drag = DragResult {
            task_id: TaskId(1),
            source: Location::new("todo", 0),
            destination: Some(Location::new("done", 0)),
        };
        let outcome = session.drag_end(&store, &drag).await;
        assert!(matches!(outcome, DragOutcome::Moved { .. }));
        let view = session.view();
        assert!(view.filtered_tasks[0].status.is(Status::Done));
        assert_eq!(session.activity().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_update_notifies_and_keeps_store_state() {
        let store = seeded_store().await;
        let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
        let patch = TaskPatch {
            progress: Some(150),
            ..Default::default()
        };
        assert!(session.update_task(&store, TaskId(1), patch).await.is_err());
        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(session.tasks()[0].progress, 0);
    }
}
