//! Engine tests run through the public API against in-memory stores.
//!
//! `RecordingStore` wraps the in-memory store, records every update call and
//! can be told to reject updates or reads, so tests can count exactly what the engine
//! asked the store to do.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use taskboard::model::activity::ActivityEntry;
use taskboard::model::catalog::{Client, ClientId, Project, ProjectId};
use taskboard::model::status::{Priority, Recognized, Status};
use taskboard::model::task::{NewTask, Task, TaskId, TaskPatch};
use taskboard::ops::columns::{ColumnMap, Location};
use taskboard::ops::filter::{DimensionChange, FilterState};
use taskboard::ops::session::{BoardSession, NoticeLevel};
use taskboard::ops::transition::{self, DragOutcome, DragResult, TransitionError};
use taskboard::store::{BoardData, CatalogStore, InMemoryStore, StoreError, TaskStore};

// ---------------------------------------------------------------------------
// Recording store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingStore {
    inner: InMemoryStore,
    updates: Mutex<Vec<(TaskId, TaskPatch)>>,
    reject_updates: AtomicBool,
    reject_reads: AtomicBool,
}

impl RecordingStore {
    fn new(data: BoardData) -> Self {
        RecordingStore {
            inner: InMemoryStore::new(data),
            ..Default::default()
        }
    }

    fn updates(&self) -> Vec<(TaskId, TaskPatch)> {
        self.updates.lock().unwrap().clone()
    }

    fn reject_updates(&self) {
        self.reject_updates.store(true, Ordering::SeqCst);
    }

    fn reject_reads(&self) {
        self.reject_reads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskStore for RecordingStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        if self.reject_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("timed out".into()));
        }
        self.inner.list_tasks().await
    }

    async fn search_tasks(&self, query: &str) -> Result<Vec<Task>, StoreError> {
        self.inner.search_tasks(query).await
    }

    async fn update_task_field(&self, id: TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        self.updates.lock().unwrap().push((id, patch.clone()));
        if self.reject_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("connection reset".into()));
        }
        self.inner.update_task_field(id, patch).await
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        self.inner.create_task(new).await
    }

    async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, StoreError> {
        self.inner.list_activity(limit).await
    }
}

#[async_trait]
impl CatalogStore for RecordingStore {
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.inner.list_projects().await
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        self.inner.list_clients().await
    }

    async fn create_client(&self, name: &str) -> Result<Client, StoreError> {
        self.inner.create_client(name).await
    }

    async fn create_project(&self, name: &str, client_id: ClientId) -> Result<Project, StoreError> {
        self.inner.create_project(name, client_id).await
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn task(id: u64, title: &str, status: &str, project: u64) -> Task {
    let mut t = Task::new(TaskId(id), title);
    t.status = Recognized::from_raw(status);
    t.project_id = Some(ProjectId(project));
    t
}

/// Client 5 owns projects 10 and 11; client 6 owns project 20.
fn board_data() -> BoardData {
    let mut tasks = vec![
        task(1, "Fix login", "todo", 10),
        task(2, "Ship release", "done", 10),
        task(3, "Login bug on mobile", "inprogress", 11),
        task(4, "Billing bug", "todo", 20),
    ];
    tasks[0].assignee = Some("ana".into());
    tasks[1].assignee = Some("ben".into());
    tasks[2].assignee = Some("cy".into());
    tasks[3].assignee = Some("ana".into());
    tasks[3].priority = Priority::High.into();

    BoardData {
        clients: vec![
            Client { id: ClientId(5), name: "Acme".into() },
            Client { id: ClientId(6), name: "Globex".into() },
        ],
        projects: vec![
            Project { id: ProjectId(10), name: "Website".into(), client_id: ClientId(5) },
            Project { id: ProjectId(11), name: "Mobile".into(), client_id: ClientId(5) },
            Project { id: ProjectId(20), name: "Billing".into(), client_id: ClientId(6) },
        ],
        tasks,
        activity: Vec::new(),
    }
}

fn drag(id: u64, from: (&str, usize), to: Option<(&str, usize)>) -> DragResult {
    DragResult {
        task_id: TaskId(id),
        source: Location::new(from.0, from.1),
        destination: to.map(|(c, i)| Location::new(c, i)),
    }
}

fn ids(tasks: &[Task]) -> Vec<u64> {
    tasks.iter().map(|t| t.id.0).collect()
}

// ---------------------------------------------------------------------------
// Drag and drop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_drops_that_stay_put_issue_no_update() {
    let store = RecordingStore::new(board_data());
    let columns = ColumnMap::kanban();
    let cases = [
        drag(1, ("todo", 0), None),
        drag(1, ("todo", 0), Some(("todo", 0))),
        drag(1, ("todo", 0), Some(("todo", 3))),
        drag(2, ("done", 4), Some(("done", 1))),
        drag(4, ("unplaced", 0), None),
    ];
    for case in &cases {
        let outcome = transition::complete_drag(&store, &columns, case).await;
        assert!(matches!(outcome, DragOutcome::NoChange(_)), "{:?}", case);
        assert!(outcome.invalidation().is_empty());
    }
    assert!(store.updates().is_empty());
}

#[tokio::test]
async fn test_cross_lane_drop_issues_exactly_one_update() {
    let columns = ColumnMap::kanban();
    for column in columns.columns() {
        for source in ["todo", "inprogress", "done", "unplaced"] {
            if source == column.id.as_str() {
                continue;
            }
            let store = RecordingStore::new(board_data());
            let d = drag(1, (source, 0), Some((column.id.as_str(), 2)));
            let outcome = transition::complete_drag(&store, &columns, &d).await;
            assert!(matches!(outcome, DragOutcome::Moved { .. }));
            assert_eq!(store.updates(), vec![(TaskId(1), TaskPatch::status(column.status))]);
        }
    }
}

#[tokio::test]
async fn test_todo_to_done_scenario() {
    let store = RecordingStore::new(board_data());
    let outcome = transition::complete_drag(
        &store,
        &ColumnMap::kanban(),
        &drag(1, ("todo", 0), Some(("done", 0))),
    )
    .await;
    assert_eq!(store.updates(), vec![(TaskId(1), TaskPatch::status(Status::Done))]);
    match outcome {
        DragOutcome::Moved { task, invalidate } => {
            assert!(task.status.is(Status::Done));
            assert!(invalidate.tasks);
        }
        other => panic!("expected a move, got {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_moves_touch_only_their_own_task() {
    let store = InMemoryStore::new(board_data());
    let columns = ColumnMap::kanban();
    let first = drag(1, ("todo", 0), Some(("inprogress", 0)));
    let second = drag(2, ("done", 0), Some(("todo", 0)));

    let (a, b) = tokio::join!(
        transition::complete_drag(&store, &columns, &first),
        transition::complete_drag(&store, &columns, &second),
    );
    assert!(matches!(a, DragOutcome::Moved { .. }));
    assert!(matches!(b, DragOutcome::Moved { .. }));

    let data = store.snapshot().await;
    let status_of = |id: u64| data.tasks.iter().find(|t| t.id.0 == id).map(|t| t.status.clone());
    assert_eq!(status_of(1), Some(Recognized::Known(Status::InProgress)));
    assert_eq!(status_of(2), Some(Recognized::Known(Status::Todo)));
    assert_eq!(status_of(3), Some(Recognized::Known(Status::InProgress)));
    assert_eq!(status_of(4), Some(Recognized::Known(Status::Todo)));
    assert_eq!(data.activity.len(), 2);
}

#[tokio::test]
async fn test_failed_move_notifies_and_resyncs() {
    let store = RecordingStore::new(board_data());
    let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
    store.reject_updates();

    let outcome = session
        .drag_end(&store, &drag(1, ("todo", 0), Some(("done", 0))))
        .await;
    assert!(outcome.is_failure());
    assert_eq!(store.updates().len(), 1);

    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0].message.contains("connection reset"));

    let view = session.view();
    let moved = view.filtered_tasks.iter().find(|t| t.id == TaskId(1)).unwrap();
    assert!(moved.status.is(Status::Todo));
}

#[tokio::test]
async fn test_move_of_task_missing_from_store_fails_and_resyncs() {
    let loaded = InMemoryStore::new(board_data());
    let mut session = BoardSession::load(&loaded, ColumnMap::kanban()).await.unwrap();

    // task 1 was deleted elsewhere after the board was loaded
    let mut data = board_data();
    data.tasks.retain(|t| t.id != TaskId(1));
    let store = RecordingStore::new(data);

    let outcome = session
        .drag_end(&store, &drag(1, ("todo", 0), Some(("done", 0))))
        .await;
    match &outcome {
        DragOutcome::Failed { task_id, error, .. } => {
            assert_eq!(*task_id, TaskId(1));
            assert!(matches!(
                error,
                TransitionError::Store(StoreError::NotFound(TaskId(1)))
            ));
        }
        other => panic!("expected a failed move, got {:?}", other),
    }
    assert_eq!(store.updates().len(), 1);

    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);

    let mut remaining = ids(session.tasks());
    remaining.sort();
    assert_eq!(remaining, vec![2, 3, 4]);
}

#[tokio::test]
async fn test_failed_resync_after_failed_move_is_reported() {
    let store = RecordingStore::new(board_data());
    let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
    store.reject_updates();
    store.reject_reads();

    let outcome = session
        .drag_end(&store, &drag(1, ("todo", 0), Some(("done", 0))))
        .await;
    assert!(outcome.is_failure());

    let notices = session.drain_notices();
    assert_eq!(notices.len(), 2);
    assert!(notices[0].message.contains("connection reset"));
    assert!(notices[1].message.starts_with("Could not refresh the board"));
    assert!(notices[1].message.contains("timed out"));
}

// ---------------------------------------------------------------------------
// Cascading filters
// ---------------------------------------------------------------------------

/// Every reachable selection sequence over the fixture catalog
fn filter_states() -> Vec<FilterState> {
    let mut states = vec![FilterState::default()];
    for client in [5, 6] {
        let mut with_client = FilterState::default();
        with_client.select_client(Some(ClientId(client)));
        states.push(with_client.clone());
        for project in [10, 11, 20] {
            let mut with_project = with_client.clone();
            if with_project.select_project(Some(ProjectId(project))).is_err() {
                continue;
            }
            states.push(with_project.clone());
            for assignee in ["ana", "cy"] {
                let mut with_assignee = with_project.clone();
                with_assignee
                    .select_assignee(Some(assignee.to_string()))
                    .unwrap();
                states.push(with_assignee.clone());
                with_assignee.select_status(Some(Status::Todo));
                states.push(with_assignee);
            }
        }
    }
    states
}

#[tokio::test]
async fn test_available_options_follow_selection() {
    let store = InMemoryStore::new(board_data());
    let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
    for state in filter_states() {
        session.select(DimensionChange::ClearAll).unwrap();
        if let Some(client) = state.client() {
            session.select(DimensionChange::Client(Some(client))).unwrap();
        }
        if let Some(project) = state.project() {
            session.select(DimensionChange::Project(Some(project))).unwrap();
        }
        let view = session.view();

        assert_eq!(view.available_projects.is_empty(), state.client().is_none());
        for project in &view.available_projects {
            assert_eq!(Some(project.client_id), state.client());
        }
        assert_eq!(
            view.available_assignees.is_empty(),
            state.client().is_none() || state.project().is_none()
        );
    }
}

#[test]
fn test_new_client_resets_downstream() {
    for mut state in filter_states() {
        for client in [5, 6, 7] {
            state.select_client(Some(ClientId(client)));
            assert_eq!(state.project(), None);
            assert_eq!(state.assignee(), None);
        }
    }
}

#[tokio::test]
async fn test_filtered_set_is_subset_satisfying_predicates() {
    let store = InMemoryStore::new(board_data());
    for query in [None, Some("bug"), Some("login")] {
        let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
        if let Some(q) = query {
            session.set_query(&store, q).await;
        }
        let source: Vec<u64> = session
            .search_state()
            .source(session.tasks())
            .iter()
            .map(|t| t.id.0)
            .collect();

        for state in filter_states() {
            session.select(DimensionChange::ClearAll).unwrap();
            for change in [
                state.client().map(|c| DimensionChange::Client(Some(c))),
                state.project().map(|p| DimensionChange::Project(Some(p))),
                state
                    .assignee()
                    .map(|a| DimensionChange::Assignee(Some(a.to_string()))),
                state.status().map(|s| DimensionChange::Status(Some(s))),
            ]
            .into_iter()
            .flatten()
            {
                session.select(change).unwrap();
            }
            let view = session.view();
            for t in &view.filtered_tasks {
                assert!(source.contains(&t.id.0));
                assert!(state.matches(t, session.catalog()));
            }
        }
    }
}

#[tokio::test]
async fn test_client_then_status_scenario() {
    let store = InMemoryStore::new(board_data());
    let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
    session.select(DimensionChange::Client(Some(ClientId(5)))).unwrap();
    session.select(DimensionChange::Status(Some(Status::Todo))).unwrap();
    assert_eq!(ids(&session.view().filtered_tasks), vec![1]);
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_search_and_filters_intersect() {
    let store = InMemoryStore::new(board_data());
    let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
    session.set_query(&store, "mobile").await;
    assert_eq!(ids(&session.view().filtered_tasks), vec![3]);

    session.select(DimensionChange::Priority(Some(Priority::High))).unwrap();
    assert!(session.view().filtered_tasks.is_empty());

    session.set_query(&store, "").await;
    assert_eq!(ids(&session.view().filtered_tasks), vec![4]);
}

#[tokio::test]
async fn test_stale_search_response_is_discarded() {
    let store = InMemoryStore::new(board_data());
    let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();

    let slow = session.begin_search("login").unwrap();
    let fast = session.begin_search("billing").unwrap();
    let fast_result = store.search_tasks(fast.query()).await;
    let slow_result = store.search_tasks(slow.query()).await;

    assert!(session.finish_search(fast, fast_result));
    assert!(!session.finish_search(slow, slow_result));
    assert_eq!(session.search_state().query(), Some("billing"));
    assert_eq!(ids(&session.view().filtered_tasks), vec![4]);
}

#[tokio::test]
async fn test_failed_search_shows_nothing_and_notifies() {
    let store = InMemoryStore::new(board_data());
    let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();
    let ticket = session.begin_search("login").unwrap();
    session.finish_search(ticket, Err(StoreError::Transport("timeout".into())));

    assert!(session.view().filtered_tasks.is_empty());
    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("login"));
}

// ---------------------------------------------------------------------------
// Unknown stored values
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unknown_status_is_unplaced_and_unmatched() {
    let mut data = board_data();
    data.tasks.push(task(9, "Old card", "archived", 10));
    let store = InMemoryStore::new(data);
    let mut session = BoardSession::load(&store, ColumnMap::kanban()).await.unwrap();

    let view = session.view();
    let lanes = session.lanes(&view);
    assert_eq!(lanes.unplaced.iter().map(|t| t.id.0).collect::<Vec<_>>(), vec![9]);

    for status in Status::ALL {
        session.select(DimensionChange::Status(Some(status))).unwrap();
        assert!(!ids(&session.view().filtered_tasks).contains(&9));
    }
}

#[tokio::test]
async fn test_ambiguous_or_unknown_labels_are_rejected() {
    assert!("Open".parse::<Status>().is_ok());
    assert!("someday".parse::<Status>().is_err());
    assert!("".parse::<Priority>().is_err());

    let store = InMemoryStore::new(board_data());
    let err = store
        .update_task_field(TaskId(99), TaskPatch::status(Status::Done))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(TaskId(99))));
}
