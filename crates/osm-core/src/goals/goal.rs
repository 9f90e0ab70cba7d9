use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Category assigned to goals imported from `.prompt.md` files.
pub const PROMPT_FILE_CATEGORY: &str = "prompt-file";

/// A reusable workflow definition.
///
/// Field names serialize in PascalCase to match the declarative file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Goal {
    pub name: String,
    pub description: String,
    pub category: String,
    pub usage: String,

    /// Interpreter payload handed to the script engine.
    #[serde(skip_serializing)]
    pub script: String,

    /// Base name of the file the goal was loaded from.
    #[serde(skip)]
    pub file_name: String,

    #[serde(rename = "TUITitle")]
    pub tui_title: String,
    #[serde(rename = "TUIPrompt")]
    pub tui_prompt: String,
    pub history_file: String,
    pub enable_history: bool,

    /// Initial state values.
    pub state_keys: BTreeMap<String, Value>,

    pub prompt_instructions: String,
    pub prompt_template: String,
    pub prompt_options: BTreeMap<String, Value>,
    pub context_header: String,

    pub banner_text: String,
    pub help_text: String,

    pub commands: Vec<GoalCommand>,

    #[serde(skip)]
    pub source: GoalSource,
}

/// A command available while a goal is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GoalCommand {
    pub name: String,
    #[serde(flatten)]
    pub kind: CommandKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arg_completers: Vec<String>,
}

impl GoalCommand {
    pub fn context_manager(name: &str) -> Self {
        Self::of_kind(name, CommandKind::ContextManager)
    }

    pub fn help() -> Self {
        Self::of_kind("help", CommandKind::Help)
    }

    fn of_kind(name: &str, kind: CommandKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: String::new(),
            usage: String::new(),
            arg_completers: Vec::new(),
        }
    }
}

/// What a command does. The handler body of a custom command is opaque
/// here and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all = "camelCase")]
pub enum CommandKind {
    /// Delegates to the shared context manager (add, list, show, ...).
    ContextManager,
    Custom {
        #[serde(rename = "Handler", default)]
        handler: String,
    },
    Help,
}

/// Where a goal was loaded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GoalSource {
    #[default]
    Builtin,
    File(PathBuf),
}

impl fmt::Display for GoalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalSource::Builtin => f.write_str("built-in"),
            GoalSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}
