//! Goal definitions and the registry that merges them.
//!
//! A goal comes from one of three places: the embedded built-ins, a
//! declarative `.json` file, or a `.prompt.md` file with an optional
//! front-matter header. All three produce the same [`Goal`] value.

mod builtin;
mod goal;
mod loader;
mod prompt_file;
mod registry;

pub use builtin::builtin_goals;
pub use goal::{CommandKind, Goal, GoalCommand, GoalSource, PROMPT_FILE_CATEGORY};
pub use loader::{
    find_goal_files, is_valid_goal_name, load_goal_from_file, parse_goal, GoalFileCandidate,
    DEFAULT_GOAL_SCRIPT, MAX_GOAL_FILE_SIZE,
};
pub use prompt_file::{
    expand_file_references, find_prompt_files, load_prompt_file, name_from_path,
    parse_prompt_file, prompt_file_to_goal, PromptFile,
};
pub use registry::{DynamicGoalRegistry, GoalRegistry};
