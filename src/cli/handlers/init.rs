use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::board_io::{self, BOARD_DIR, CONFIG_FILE, DATA_FILE};
use crate::store::BoardData;

const BOARD_TOML_TEMPLATE: &str = r##"[board]
name = {name}

# --- Columns ---
# One kanban lane per entry, left to right. `status` may use any status
# label (todo, inprogress, blocked, done, Open, Closed, ...). Each status
# may back at most one lane; tasks whose status has no lane are listed
# under "Unplaced".

[[columns]]
id = "todo"
title = "To Do"
status = "todo"

[[columns]]
id = "inprogress"
title = "In Progress"
status = "inprogress"

[[columns]]
id = "done"
title = "Done"
status = "done"

# [[columns]]
# id = "blocked"
# title = "Blocked"
# status = "blocked"

[ui]
# lane width in terminal cells for `tb board`
column_width = 28
# list tasks whose status has no lane below the board
show_unplaced = true
"##;

/// Infer a board name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_board_toml(name: &str) -> String {
    let quoted = toml::Value::String(name.to_string()).to_string();
    BOARD_TOML_TEMPLATE.replace("{name}", &quoted)
}

/// Create `board/` under `dir`. An existing data file is kept on `--force`.
pub fn cmd_init(args: InitArgs, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let board_dir = dir.join(BOARD_DIR);

    if board_dir.join(CONFIG_FILE).exists() && !args.force {
        return Err("board already exists in ./board/ (use --force to reinitialize)".into());
    }

    if let Some(parent) = dir.parent()
        && let Ok(parent_root) = board_io::discover_board(parent)
    {
        eprintln!("Note: parent board found at {}/", parent_root.join(BOARD_DIR).display());
        eprintln!("Creating new board in ./board/");
    }

    let name = args.name.unwrap_or_else(|| {
        dir.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    fs::create_dir_all(&board_dir)?;
    fs::write(board_dir.join(CONFIG_FILE), render_board_toml(&name))?;
    if !board_dir.join(DATA_FILE).exists() {
        board_io::write_data(&board_dir, &BoardData::default())?;
    }

    println!("Initialized board: {}", name);
    Ok(())
}
