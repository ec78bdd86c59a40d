use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};
use crate::storage::DEFAULT_STORAGE_KEY;

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Directory holding the saved quest log
    #[arg(long, global = true, env = "QUEST_LOG_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Key the quest log is stored under
    #[arg(long, global = true, env = "QUEST_LOG_STORAGE_KEY", default_value = DEFAULT_STORAGE_KEY)]
    pub storage_key: String,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,
}

impl Settings {
    /// Validate CLI/environment-derived settings.
    pub fn validate(&self) -> Result<(), String> {
        let key = self.storage_key.trim();
        if key.is_empty() {
            return Err("QUEST_LOG_STORAGE_KEY cannot be empty".to_string());
        }
        if key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(format!(
                "Invalid QUEST_LOG_STORAGE_KEY '{}': must be a plain file name",
                self.storage_key
            ));
        }
        if let Some(dir) = &self.data_dir {
            if dir.as_os_str().is_empty() {
                return Err("QUEST_LOG_DATA_DIR cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show quests grouped as in the quest log (default)
    List {
        /// Also expand collapsed groups
        #[arg(long)]
        all: bool,
    },
    /// Show one quest in detail (the selected one by default)
    Show { id: Option<String> },
    /// Add a new quest and select it
    Add(QuestArgs),
    /// Edit an existing quest
    Edit {
        id: String,
        #[command(flatten)]
        fields: QuestArgs,
        /// Remove every objective before adding the new ones
        #[arg(long)]
        clear_subtasks: bool,
        /// Remove one objective by id; repeat for several
        #[arg(long = "remove-subtask", value_name = "ID")]
        remove_subtasks: Vec<String>,
        /// Change an objective's text, keeping its id and state
        #[arg(long = "rename-subtask", value_name = "ID=TEXT", value_parser = parse_rename)]
        rename_subtasks: Vec<(String, String)>,
        /// Remove the suggested level
        #[arg(long, conflicts_with = "level")]
        clear_level: bool,
    },
    /// Delete a quest
    Delete { id: String },
    /// Select a quest
    Select { id: String },
    /// Clear the current selection
    Deselect,
    /// Select the next visible quest
    Next,
    /// Select the previous visible quest
    Prev,
    /// Track a quest (the selected one by default); tracking it again untracks it
    Track { id: Option<String> },
    /// Add an objective to a quest
    Subtask { quest: String, text: String },
    /// Toggle an objective of a quest
    Toggle { quest: String, subtask: String },
    /// Move a quest into another group
    Move { quest: String, group: String },
    /// Move a quest into the Completed group
    Complete { id: Option<String> },
    /// Move a quest into the Cancelled group
    Fail { id: Option<String> },
    /// Set or clear the search filter
    Search {
        query: Option<String>,
        #[arg(long, conflicts_with = "query")]
        clear: bool,
    },
    /// Manage quest groups
    #[command(subcommand)]
    Group(GroupCommand),
    /// Print the whole quest log as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace the quest log with a previously exported one
    Import {
        path: PathBuf,
        #[arg(long, short)]
        yes: bool,
    },
    /// Restore the default groups and sample quests
    Reset {
        #[arg(long, short)]
        yes: bool,
    },
    /// Show where the quest log is stored and what it holds
    Status,
    /// Print version information
    Version,
}

fn parse_rename(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((id, text)) if !id.trim().is_empty() => {
            Ok((id.trim().to_string(), text.to_string()))
        }
        _ => Err(format!("expected ID=TEXT, got '{value}'")),
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum GroupCommand {
    /// List groups in display order
    List,
    /// Create a group
    Add(GroupArgs),
    /// Rename or restyle a group
    Edit {
        id: String,
        #[command(flatten)]
        fields: GroupArgs,
    },
    /// Delete a group together with all of its quests
    Delete {
        id: String,
        #[arg(long, short)]
        yes: bool,
    },
    /// Collapse or expand a group
    Toggle { id: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct QuestArgs {
    /// Quest title
    #[arg(long, short)]
    pub title: Option<String>,
    /// Group id (defaults to "secondary" for new quests)
    #[arg(long, short)]
    pub group: Option<String>,
    #[arg(long, short)]
    pub location: Option<String>,
    /// Suggested level, used for ordering
    #[arg(long)]
    pub level: Option<i64>,
    #[arg(long)]
    pub icon: Option<String>,
    #[arg(long, short)]
    pub description: Option<String>,
    #[arg(long, short)]
    pub reminder: Option<String>,
    /// Objective text; repeat for several
    #[arg(long = "subtask", short = 's')]
    pub subtasks: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GroupArgs {
    /// Group name
    #[arg(long, short)]
    pub name: Option<String>,
    /// Group icon; an empty value removes it
    #[arg(long)]
    pub icon: Option<String>,
    /// Hex color such as #c4a258; an empty value removes it
    #[arg(long, short)]
    pub color: Option<String>,
}
