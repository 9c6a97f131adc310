use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tb", about = concat!("taskboard v", env!("CARGO_PKG_VERSION"), " - kanban, filters and search for project tasks"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,

    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a board in the current directory
    Init(InitArgs),
    /// List clients, or add one
    Client(ClientCmd),
    /// List all clients
    Clients,
    /// List projects, or add one
    Project(ProjectCmd),
    /// List projects, optionally for one client
    Projects(ProjectsArgs),
    /// Add a task
    Add(AddArgs),
    /// List tasks through the filters
    List(ViewArgs),
    /// Show tasks in their kanban lanes
    Board(ViewArgs),
    /// Show the projects and assignees a filter selection allows
    Options(OptionsArgs),
    /// Move a task to another lane (or position)
    Mv(MvArgs),
    /// Change task fields
    Set(SetArgs),
    /// Show recent task changes
    Activity(ActivityArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Reinitialize even if board/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Catalog args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ClientCmd {
    #[command(subcommand)]
    pub action: ClientAction,
}

#[derive(Subcommand)]
pub enum ClientAction {
    /// Add a client
    Add(ClientAddArgs),
}

#[derive(Args)]
pub struct ClientAddArgs {
    /// Client name
    pub name: String,
}

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Add a project for a client
    Add(ProjectAddArgs),
}

#[derive(Args)]
pub struct ProjectAddArgs {
    /// Project name
    pub name: String,
    /// Owning client ID
    #[arg(long)]
    pub client: u64,
}

#[derive(Args)]
pub struct ProjectsArgs {
    /// Only projects of this client ID
    #[arg(long)]
    pub client: Option<u64>,
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Longer description
    #[arg(long)]
    pub description: Option<String>,
    /// Project ID
    #[arg(long)]
    pub project: Option<u64>,
    /// Assignee name
    #[arg(long)]
    pub assignee: Option<String>,
    /// Priority (low, medium, high)
    #[arg(long)]
    pub priority: Option<String>,
    /// Initial status in any vocabulary (todo, inprogress, Open, Closed, ...)
    #[arg(long)]
    pub status: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
}

/// Filter dimensions plus the free-text query. `all` leaves a dimension unset.
#[derive(Args, Default)]
pub struct FilterArgs {
    /// Client ID
    #[arg(long)]
    pub client: Option<String>,
    /// Project ID (selects its client when --client is omitted)
    #[arg(long)]
    pub project: Option<String>,
    /// Status in any vocabulary
    #[arg(long)]
    pub status: Option<String>,
    /// Priority
    #[arg(long)]
    pub priority: Option<String>,
    /// Assignee name (requires a project)
    #[arg(long)]
    pub assignee: Option<String>,
    /// Free-text search over title, description and assignee
    #[arg(short, long)]
    pub query: Option<String>,
}

#[derive(Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Args)]
pub struct OptionsArgs {
    /// Client ID
    #[arg(long)]
    pub client: Option<String>,
    /// Project ID
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task ID
    pub id: u64,
    /// Destination column ID
    pub column: String,
    /// Position in the destination column (default: end)
    #[arg(long)]
    pub index: Option<usize>,
}

#[derive(Args)]
pub struct SetArgs {
    /// Task ID
    pub id: u64,
    /// New status in any vocabulary
    #[arg(long)]
    pub status: Option<String>,
    /// New priority
    #[arg(long)]
    pub priority: Option<String>,
    /// New assignee ("" clears)
    #[arg(long)]
    pub assignee: Option<String>,
    /// Completion percentage (0-100)
    #[arg(long)]
    pub progress: Option<u8>,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// Project ID ("" clears)
    #[arg(long)]
    pub project: Option<String>,
    /// Due date YYYY-MM-DD ("" clears)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args)]
pub struct ActivityArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value = "20")]
    pub limit: usize,
}
