mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::board_io;
use crate::model::board::Board;
use crate::model::catalog::{Catalog, ClientId, ProjectId};
use crate::model::status::{Priority, Status};
use crate::model::task::{NewTask, TaskId, TaskPatch};
use crate::ops::columns::{ColumnId, ColumnMap, Location};
use crate::ops::filter::{DimensionChange, parse_selection};
use crate::ops::session::{BoardSession, Notice};
use crate::ops::transition::{DragOutcome, DragResult};
use crate::store::{CatalogStore, FileStore, TaskStore};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start = start_dir(cli.board_dir.as_deref())?;

    match cli.command {
        Commands::Init(args) => cmd_init(args, &start),

        // Catalog
        Commands::Client(cmd) => match cmd.action {
            ClientAction::Add(args) => cmd_client_add(&start, args, json).await,
        },
        Commands::Clients => cmd_clients(&start, json).await,
        Commands::Project(cmd) => match cmd.action {
            ProjectAction::Add(args) => cmd_project_add(&start, args, json).await,
        },
        Commands::Projects(args) => cmd_projects(&start, args, json).await,

        // Read commands
        Commands::List(args) => cmd_list(&start, args, json).await,
        Commands::Board(args) => cmd_board(&start, args, json).await,
        Commands::Options(args) => cmd_options(&start, args, json).await,
        Commands::Activity(args) => cmd_activity(&start, args, json).await,

        // Write commands
        Commands::Add(args) => cmd_add(&start, args, json).await,
        Commands::Mv(args) => cmd_mv(&start, args, json).await,
        Commands::Set(args) => cmd_set(&start, args, json).await,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_dir(override_dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match override_dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e).into()),
        None => Ok(std::env::current_dir()?),
    }
}

/// The board above `start`, its lanes, and a store over its data file
struct Context {
    board: Board,
    columns: ColumnMap,
    store: FileStore,
}

fn load_context(start: &Path) -> Result<Context, Box<dyn std::error::Error>> {
    let root = board_io::discover_board(start)?;
    let (board, columns) = board_io::load_board(&root)?;
    let store = FileStore::new(&board.board_dir);
    Ok(Context {
        board,
        columns,
        store,
    })
}

async fn load_catalog(store: &FileStore) -> Result<Catalog, Box<dyn std::error::Error>> {
    Ok(Catalog::new(store.list_clients().await?, store.list_projects().await?))
}

fn parse_id(raw: &str, what: &str) -> Result<u64, Box<dyn std::error::Error>> {
    raw.trim()
        .parse()
        .map_err(|_| format!("invalid {} id '{}'", what, raw).into())
}

fn parse_date(raw: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", raw).into())
}

/// `""` clears an optional field
fn parse_clearable<T>(
    raw: &str,
    parse: impl Fn(&str) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        parse(raw).map(Some)
    }
}

/// Apply command-line selections in chain order. `--project` alone selects
/// the project's client first; with `--client` the two must agree.
fn apply_filters(
    session: &mut BoardSession,
    filters: &FilterArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = match filters.client.as_deref().and_then(parse_selection) {
        Some(raw) => Some(ClientId(parse_id(raw, "client")?)),
        None => None,
    };
    let project = match filters.project.as_deref().and_then(parse_selection) {
        Some(raw) => Some(ProjectId(parse_id(raw, "project")?)),
        None => None,
    };

    let client = match (client, project) {
        (client, Some(project)) => {
            let owner = session
                .catalog()
                .project(project)
                .map(|p| p.client_id)
                .ok_or_else(|| format!("no project with id {}", project))?;
            if let Some(client) = client
                && client != owner
            {
                return Err(
                    format!("project {} does not belong to client {}", project, client).into(),
                );
            }
            Some(owner)
        }
        (client, None) => client,
    };

    if client.is_some() {
        session.select(DimensionChange::Client(client))?;
    }
    if project.is_some() {
        session.select(DimensionChange::Project(project))?;
    }
    if let Some(raw) = filters.status.as_deref().and_then(parse_selection) {
        let status: Status = raw.parse()?;
        session.select(DimensionChange::Status(Some(status)))?;
    }
    if let Some(raw) = filters.priority.as_deref().and_then(parse_selection) {
        let priority: Priority = raw.parse()?;
        session.select(DimensionChange::Priority(Some(priority)))?;
    }
    if let Some(raw) = filters.assignee.as_deref().and_then(parse_selection) {
        session.select(DimensionChange::Assignee(Some(raw.to_string())))?;
    }
    Ok(())
}

/// Load a session with `filters` and the query applied
async fn filtered_session(
    ctx: &Context,
    filters: &FilterArgs,
) -> Result<BoardSession, Box<dyn std::error::Error>> {
    let mut session = BoardSession::load(&ctx.store, ctx.columns.clone()).await?;
    apply_filters(&mut session, filters)?;
    if let Some(query) = &filters.query {
        session.set_query(&ctx.store, query).await;
    }
    print_notices(&mut session);
    Ok(session)
}

fn print_notices(session: &mut BoardSession) {
    for notice in session.drain_notices() {
        eprintln!("{}", format_notice(&notice));
    }
}

/// Notices raised after the one describing a failed write. The returned
/// error already reports that one.
fn followup_notices(session: &mut BoardSession) -> Vec<Notice> {
    session.drain_notices().into_iter().skip(1).collect()
}

fn print_followup_notices(session: &mut BoardSession) {
    for notice in followup_notices(session) {
        eprintln!("{}", format_notice(&notice));
    }
}

// ---------------------------------------------------------------------------
// Catalog handlers
// ---------------------------------------------------------------------------

async fn cmd_client_add(start: &Path, args: ClientAddArgs, json: bool) -> CmdResult {
    let ctx = load_context(start)?;
    let client = ctx.store.create_client(&args.name).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&client)?);
    } else {
        println!("Added client {} {}", client.id, client.name);
    }
    Ok(())
}

async fn cmd_clients(start: &Path, json: bool) -> CmdResult {
    let ctx = load_context(start)?;
    let clients = ctx.store.list_clients().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&clients)?);
    } else if clients.is_empty() {
        println!("No clients.");
    } else {
        let rows: Vec<_> = clients
            .iter()
            .map(|c| (c.id.to_string(), c.name.clone()))
            .collect();
        for line in format_table(&rows) {
            println!("{}", line);
        }
    }
    Ok(())
}

async fn cmd_project_add(start: &Path, args: ProjectAddArgs, json: bool) -> CmdResult {
    let ctx = load_context(start)?;
    let project = ctx
        .store
        .create_project(&args.name, ClientId(args.client))
        .await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&project)?);
    } else {
        println!(
            "Added project {} {} (client {})",
            project.id, project.name, project.client_id
        );
    }
    Ok(())
}

async fn cmd_projects(start: &Path, args: ProjectsArgs, json: bool) -> CmdResult {
    let ctx = load_context(start)?;
    let catalog = load_catalog(&ctx.store).await?;
    let projects: Vec<_> = match args.client {
        Some(id) => catalog.projects_of(ClientId(id)).cloned().collect(),
        None => catalog.projects.clone(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
    } else if projects.is_empty() {
        println!("No projects.");
    } else {
        let rows: Vec<_> = projects
            .iter()
            .map(|p| {
                let client = catalog
                    .client(p.client_id)
                    .map(|c| c.name.as_str())
                    .unwrap_or("?");
                (p.id.to_string(), format!("{}  ({})", p.name, client))
            })
            .collect();
        for line in format_table(&rows) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

async fn cmd_list(start: &Path, args: ViewArgs, json: bool) -> CmdResult {
    let ctx = load_context(start)?;
    let session = filtered_session(&ctx, &args.filters).await?;
    let view = session.view();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&view_to_json(&view, session.catalog()))?
        );
        return Ok(());
    }
    if let Some(header) = format_view_header(&view, session.catalog()) {
        println!("{}", header);
    }
    if view.filtered_tasks.is_empty() {
        println!("No tasks.");
    }
    for task in &view.filtered_tasks {
        println!("{}", format_task_line(task, session.catalog()));
    }
    Ok(())
}

async fn cmd_board(start: &Path, args: ViewArgs, json: bool) -> CmdResult {
    let ctx = load_context(start)?;
    let session = filtered_session(&ctx, &args.filters).await?;
    let view = session.view();
    let lanes = session.lanes(&view);

    if json {
        let board = board_to_json(session.columns(), &lanes, &view.search, session.catalog());
        println!("{}", serde_json::to_string_pretty(&board)?);
        return Ok(());
    }
    println!("== {} ==", ctx.board.config.board.name);
    if let Some(header) = format_view_header(&view, session.catalog()) {
        println!("{}", header);
    }
    println!();
    let ui = &ctx.board.config.ui;
    for line in render_board(session.columns(), &lanes, ui.column_width, ui.show_unplaced) {
        println!("{}", line);
    }
    Ok(())
}

async fn cmd_options(start: &Path, args: OptionsArgs, json: bool) -> CmdResult {
    let ctx = load_context(start)?;
    let filters = FilterArgs {
        client: args.client,
        project: args.project,
        ..Default::default()
    };
    let session = filtered_session(&ctx, &filters).await?;
    let view = session.view();

    if json {
        let options = OptionsJson {
            projects: view.available_projects,
            assignees: view.available_assignees,
        };
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }
    println!("projects:");
    if view.available_projects.is_empty() {
        println!("  (select a client)");
    }
    for project in &view.available_projects {
        println!("  {}  {}", project.id, project.name);
    }
    println!("assignees:");
    if view.available_assignees.is_empty() {
        println!("  (none)");
    }
    for assignee in &view.available_assignees {
        println!("  {}", assignee);
    }
    Ok(())
}

async fn cmd_activity(start: &Path, args: ActivityArgs, json: bool) -> CmdResult {
    let ctx = load_context(start)?;
    let entries = ctx.store.list_activity(args.limit).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No activity.");
    } else {
        for entry in &entries {
            println!("{}", format_activity_line(entry));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

async fn cmd_add(start: &Path, args: AddArgs, json: bool) -> CmdResult {
    let ctx = load_context(start)?;
    let new = NewTask {
        title: args.title,
        description: args.description,
        status: args.status.as_deref().map(str::parse::<Status>).transpose()?,
        priority: args
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?,
        project_id: args.project.map(ProjectId),
        assignee: args.assignee,
        due_date: args.due.as_deref().map(parse_date).transpose()?,
    };
    let task = ctx.store.create_task(new).await?;
    if json {
        let catalog = load_catalog(&ctx.store).await?;
        println!("{}", serde_json::to_string_pretty(&task_to_json(&task, &catalog))?);
    } else {
        println!("Added #{} {}", task.id, task.title);
    }
    Ok(())
}

async fn cmd_mv(start: &Path, args: MvArgs, json: bool) -> CmdResult {
    let ctx = load_context(start)?;
    let mut session = BoardSession::load(&ctx.store, ctx.columns.clone()).await?;
    let id = TaskId(args.id);
    let source = session
        .locate(id)
        .ok_or_else(|| format!("task #{} not found", id))?;

    let column = ColumnId::new(args.column);
    let index = match args.index {
        Some(index) => index,
        None => {
            let board = session.columns().group(session.tasks());
            let len = board.lanes.get(&column).map(Vec::len).unwrap_or(0);
            // a task already in the lane leaves a gap at its own slot
            if column == source.column { len.saturating_sub(1) } else { len }
        }
    };
    let drag = DragResult {
        task_id: id,
        source,
        destination: Some(Location { column, index }),
    };

    let outcome = session.drag_end(&ctx.store, &drag).await;
    match outcome {
        DragOutcome::NoChange(decision) => {
            print_notices(&mut session);
            if !json {
                println!("#{} unchanged ({:?})", id, decision);
            }
        }
        DragOutcome::Moved { task, .. } => {
            print_notices(&mut session);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&task_to_json(&task, session.catalog()))?
                );
            } else {
                let lane = session
                    .columns()
                    .column_of(&task)
                    .map(|c| c.title.clone())
                    .unwrap_or_else(|| drag_destination(&drag));
                println!("Moved #{} to {}", task.id, lane);
            }
        }
        DragOutcome::Failed { task_id, error, .. } => {
            print_followup_notices(&mut session);
            return Err(format!("could not move task #{}: {}", task_id, error).into());
        }
    }
    Ok(())
}

fn drag_destination(drag: &DragResult) -> String {
    drag.destination
        .as_ref()
        .map(|d| d.column.to_string())
        .unwrap_or_default()
}

async fn cmd_set(start: &Path, args: SetArgs, json: bool) -> CmdResult {
    let ctx = load_context(start)?;
    let patch = TaskPatch {
        title: args.title,
        status: args.status.as_deref().map(str::parse::<Status>).transpose()?,
        priority: args
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?,
        assignee: args
            .assignee
            .as_deref()
            .map(|raw| parse_clearable(raw, |s| Ok(s.trim().to_string())))
            .transpose()?,
        progress: args.progress,
        project_id: args
            .project
            .as_deref()
            .map(|raw| parse_clearable(raw, |s| parse_id(s, "project").map(ProjectId)))
            .transpose()?,
        due_date: args
            .due
            .as_deref()
            .map(|raw| parse_clearable(raw, parse_date))
            .transpose()?,
        ..Default::default()
    };
    if patch.is_empty() {
        return Err("nothing to change (see tb set --help)".into());
    }

    let mut session = BoardSession::load(&ctx.store, ctx.columns.clone()).await?;
    let id = TaskId(args.id);
    match session.update_task(&ctx.store, id, patch).await {
        Ok(task) => {
            print_notices(&mut session);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&task_to_json(&task, session.catalog()))?
                );
            } else {
                println!("{}", format_task_line(&task, session.catalog()));
            }
            Ok(())
        }
        Err(err) => {
            print_followup_notices(&mut session);
            Err(err.into())
        }
    }
}
