//! `.prompt.md` files: Markdown with an optional front-matter header.
//!
//! ```text
//! ---
//! name: review-pr
//! description: "Review a pull request"
//! model: gpt-4o
//! tools: [search, fetch]
//! ---
//! Review the attached changes. See [the checklist](checklist.md).
//! ```
//!
//! The header is a small YAML subset: scalar `key: value` lines and lists
//! written inline (`[a, b]`) or one `- item` per line. Unknown keys are
//! ignored.

use serde_json::Value;
use std::path::{Path, PathBuf};

use super::goal::{Goal, GoalCommand, GoalSource, PROMPT_FILE_CATEGORY};
use super::loader::{read_capped, scan_dir, GoalFileCandidate, DEFAULT_GOAL_SCRIPT};
use crate::error::GoalLoadError;

const PROMPT_FILE_SUFFIX: &str = ".prompt.md";
const FALLBACK_NAME: &str = "unnamed-prompt";
const DELIMITER: &str = "---";

const PROMPT_TEMPLATE: &str = "**{{.description | upper}}**

{{.promptInstructions}}

## {{.contextHeader}}

{{.contextTxtar}}";

const CONTEXT_COMMANDS: [&str; 7] = ["add", "note", "list", "edit", "remove", "show", "copy"];

/// A parsed prompt file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptFile {
    pub name: String,
    pub description: String,
    pub model: String,
    pub tools: Vec<String>,
    /// Everything after the header.
    pub body: String,
    pub source_path: Option<PathBuf>,
}

/// Split `content` into header and body and parse the header.
///
/// A file that does not open with a `---` line has no header; a header
/// that is opened but never closed is an error.
pub fn parse_prompt_file(content: &str, path: &Path) -> Result<PromptFile, GoalLoadError> {
    let mut prompt = PromptFile::default();

    let Some(after_open) = strip_delimiter_line(content) else {
        prompt.body = content.to_string();
        return Ok(prompt);
    };

    let mut offset = 0;
    let mut split = None;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches('\n').trim_end_matches('\r') == DELIMITER {
            split = Some((&after_open[..offset], &after_open[offset + line.len()..]));
            break;
        }
        offset += line.len();
    }

    let Some((header, body)) = split else {
        return Err(GoalLoadError::FrontMatter {
            path: path.to_path_buf(),
            reason: "unclosed header: missing closing ---".to_string(),
        });
    };

    parse_header(header, &mut prompt);
    prompt.body = body.to_string();
    Ok(prompt)
}

fn strip_delimiter_line(content: &str) -> Option<&str> {
    content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
}

fn parse_header(header: &str, prompt: &mut PromptFile) {
    let mut in_tools_list = false;

    for line in header.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            in_tools_list = false;
            continue;
        }

        if in_tools_list {
            if let Some(item) = trimmed.strip_prefix("- ") {
                prompt.tools.push(unquote(item.trim()).to_string());
                continue;
            }
        }
        in_tools_list = false;

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "name" => prompt.name = unquote(value).to_string(),
            "description" => prompt.description = unquote(value).to_string(),
            "model" => prompt.model = unquote(value).to_string(),
            "tools" if value.is_empty() => in_tools_list = true,
            "tools" => prompt.tools = parse_inline_list(value),
            _ => {}
        }
    }
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

fn parse_inline_list(value: &str) -> Vec<String> {
    let Some(inner) = value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        let single = unquote(value);
        return if single.is_empty() {
            Vec::new()
        } else {
            vec![single.to_string()]
        };
    };

    inner
        .split(',')
        .map(|item| unquote(item.trim()))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse a prompt file, refusing files over the size ceiling.
pub fn load_prompt_file(path: &Path) -> Result<PromptFile, GoalLoadError> {
    let data = read_capped(path)?;
    let content = String::from_utf8_lossy(&data);
    let mut prompt = parse_prompt_file(&content, path)?;
    prompt.source_path = Some(path.to_path_buf());
    Ok(prompt)
}

/// Derive a goal name from a prompt file name: drop `.prompt.md` (or
/// `.md`), turn anything but ASCII alphanumerics and hyphens into hyphens,
/// collapse runs, and trim.
pub fn name_from_path(path: &Path) -> String {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lower = base.to_ascii_lowercase();
    let stem = if lower.ends_with(PROMPT_FILE_SUFFIX) {
        &base[..base.len() - PROMPT_FILE_SUFFIX.len()]
    } else if lower.ends_with(".md") {
        &base[..base.len() - ".md".len()]
    } else {
        base.as_str()
    };

    let mut name = String::with_capacity(stem.len());
    for c in stem.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '-' };
        if c == '-' && name.ends_with('-') {
            continue;
        }
        name.push(c);
    }

    let name = name.trim_matches('-');
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Inline local files referenced as Markdown links.
///
/// `[text](relative/path)` becomes a labelled code block holding the file's
/// contents when the target is a readable regular file within
/// [`MAX_GOAL_FILE_SIZE`](super::MAX_GOAL_FILE_SIZE). URLs, absolute paths and
/// any other target are left as written.
pub fn expand_file_references(body: &str, base_dir: &Path) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match expand_link(tail, base_dir) {
            Some((consumed, block)) => {
                out.push_str(&block);
                rest = &tail[consumed..];
            }
            None => {
                out.push('[');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Expand the link at the start of `tail`, returning the bytes consumed.
fn expand_link(tail: &str, base_dir: &Path) -> Option<(usize, String)> {
    let close_text = tail.find("](")?;
    let after = &tail[close_text + 2..];
    let close_paren = after.find(')')?;

    let text = &tail[1..close_text];
    let target = &after[..close_paren];
    if target.is_empty() || target.contains("://") || Path::new(target).is_absolute() {
        return None;
    }

    let data = read_capped(&base_dir.join(target)).ok()?;
    let content = String::from_utf8_lossy(&data);

    let mut block = format!("**{}** (`{}`):\n```\n{}", text, target, content);
    if !content.is_empty() && !content.ends_with('\n') {
        block.push('\n');
    }
    block.push_str("```\n");

    Some((close_text + 2 + close_paren + 1, block))
}

/// Build a goal from a prompt file.
pub fn prompt_file_to_goal(prompt: &PromptFile) -> Goal {
    let source_path = prompt.source_path.as_deref();
    let file_name = source_path
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = if !prompt.name.is_empty() {
        prompt.name.clone()
    } else if let Some(path) = source_path {
        name_from_path(path)
    } else {
        FALLBACK_NAME.to_string()
    };

    let description = if prompt.description.is_empty() {
        format!("Imported from {}", file_name)
    } else {
        prompt.description.clone()
    };

    let instructions = match source_path.and_then(Path::parent) {
        Some(dir) => expand_file_references(&prompt.body, dir),
        None => prompt.body.clone(),
    };

    let mut prompt_options = std::collections::BTreeMap::new();
    if !prompt.model.is_empty() {
        prompt_options.insert("model".to_string(), Value::from(prompt.model.clone()));
    }
    if !prompt.tools.is_empty() {
        prompt_options.insert("tools".to_string(), Value::from(prompt.tools.clone()));
    }

    let mut commands: Vec<GoalCommand> = CONTEXT_COMMANDS
        .iter()
        .map(|name| GoalCommand::context_manager(name))
        .collect();
    commands.push(GoalCommand::help());

    Goal {
        tui_title: title_case(&name.replace('-', " ")),
        tui_prompt: format!("({}) > ", name),
        name,
        description,
        category: PROMPT_FILE_CATEGORY.to_string(),
        script: DEFAULT_GOAL_SCRIPT.to_string(),
        file_name,
        prompt_instructions: instructions,
        prompt_template: PROMPT_TEMPLATE.to_string(),
        prompt_options,
        context_header: "CONTEXT".to_string(),
        commands,
        source: source_path
            .map(|p| GoalSource::File(p.to_path_buf()))
            .unwrap_or_default(),
        ..Default::default()
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// `.prompt.md` files in `dir` (any case), sorted by file name.
///
/// Missing or unreadable directories yield no candidates.
pub fn find_prompt_files(dir: &Path) -> anyhow::Result<Vec<GoalFileCandidate>> {
    let mut candidates = scan_dir(dir, PROMPT_FILE_SUFFIX, true)?;
    for candidate in &mut candidates {
        candidate.name = name_from_path(&candidate.path);
    }
    Ok(candidates)
}
