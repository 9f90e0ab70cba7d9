use std::path::Path;
use tracing::warn;

use super::goal::{Goal, GoalSource};
use super::loader::parse_goal;

/// Goal documents compiled into the binary, as `(file name, contents)`.
const EMBEDDED_GOALS: &[(&str, &str)] = &[
    ("comment-stripper.json", include_str!("builtin/comment-stripper.json")),
    ("doc-generator.json", include_str!("builtin/doc-generator.json")),
    ("test-generator.json", include_str!("builtin/test-generator.json")),
    ("commit-message.json", include_str!("builtin/commit-message.json")),
];

/// The built-in goals, validated like any goal file.
pub fn builtin_goals() -> Vec<Goal> {
    EMBEDDED_GOALS
        .iter()
        .filter_map(|(file_name, contents)| {
            match parse_goal(contents.as_bytes(), Path::new(file_name)) {
                Ok(mut goal) => {
                    goal.file_name = file_name.to_string();
                    goal.source = GoalSource::Builtin;
                    Some(goal)
                }
                Err(e) => {
                    warn!("skipping built-in goal: {}", e);
                    None
                }
            }
        })
        .collect()
}
