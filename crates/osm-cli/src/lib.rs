//! Command-line surface over goal and script discovery.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use osm_config::Settings;
use osm_core::goals::Goal;
use osm_core::{
    builtin_goals, DiscoveryConfig, Discoverer, DynamicGoalRegistry, GoalRegistry, ResourceKind,
};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,osm::discovery=info";

#[derive(Parser, Debug)]
#[command(name = "osm")]
#[command(about = "Discover and inspect reusable prompt goals")]
#[command(version)]
pub struct Cli {
    /// Config file to read instead of ~/.one-shot-man/config
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List, inspect and locate goals
    Goal(GoalArgs),
    /// Locate script directories
    Script(ScriptArgs),
}

#[derive(Args, Debug, Default)]
pub struct GoalArgs {
    /// List available goals
    #[arg(short, long)]
    pub list: bool,

    /// Only list goals in this category
    #[arg(short, long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Print the goal directories in priority order
    #[arg(long)]
    pub paths: bool,

    /// Print the selected goal as JSON
    #[arg(long)]
    pub json: bool,

    /// Goal to show
    pub name: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ScriptArgs {
    /// Print the script directories in priority order
    #[arg(long)]
    pub paths: bool,
}

/// Parse arguments, set up logging and run the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &settings, &mut out)
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(DEFAULT_LOG_FILTER)
        }
    });

    // A subscriber may already be installed when embedded; that is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn execute(command: &Command, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Goal(args) => {
            let config = DiscoveryConfig::from_options(ResourceKind::Goal, settings);
            let discoverer = Discoverer::new(config);
            if args.paths {
                return print_paths(&discoverer, out);
            }
            let registry = DynamicGoalRegistry::new(builtin_goals(), discoverer);
            debug!("{} goals available", registry.list().len());
            goal_command(args, &registry, out)
        }
        Command::Script(args) => {
            let config = DiscoveryConfig::from_options(ResourceKind::Script, settings);
            let discoverer = Discoverer::new(config);
            if args.paths {
                print_paths(&discoverer, out)
            } else {
                writeln!(out, "Usage: osm script --paths")?;
                Ok(())
            }
        }
    }
}

fn print_paths(discoverer: &Discoverer, out: &mut dyn Write) -> Result<()> {
    for path in discoverer.discover_paths() {
        writeln!(out, "{}", path.display())?;
    }
    Ok(())
}

fn goal_command(args: &GoalArgs, registry: &impl GoalRegistry, out: &mut dyn Write) -> Result<()> {
    match &args.name {
        Some(name) if !args.list => {
            let goal = registry.get(name)?;
            if args.json {
                let json = serde_json::to_string_pretty(goal)
                    .with_context(|| format!("Failed to serialize goal {}", name))?;
                writeln!(out, "{}", json)?;
            } else {
                print_goal(goal, out)?;
            }
            Ok(())
        }
        _ => list_goals(&registry.all_goals(), args.category.as_deref(), out),
    }
}

fn list_goals(goals: &[Goal], category: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let filtered: Vec<&Goal> = goals
        .iter()
        .filter(|g| category.map_or(true, |c| g.category.eq_ignore_ascii_case(c)))
        .collect();

    if filtered.is_empty() {
        match category {
            Some(c) => writeln!(out, "No goals found for category: {}", c)?,
            None => writeln!(out, "No goals available")?,
        }
        return Ok(());
    }

    let mut by_category: BTreeMap<&str, Vec<&Goal>> = BTreeMap::new();
    for goal in filtered {
        by_category.entry(goal.category.as_str()).or_default().push(goal);
    }

    writeln!(out, "Available Goals:\n")?;
    for (category, goals) in by_category {
        writeln!(out, "{}:", heading(category))?;
        for goal in goals {
            writeln!(out, "  {:<20} {}", goal.name, goal.description)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "Usage:")?;
    writeln!(out, "  osm goal <goal-name>           Show a goal")?;
    writeln!(out, "  osm goal -l [-c category]      List goals")?;
    writeln!(out, "  osm goal --paths               Show goal directories")?;
    Ok(())
}

fn print_goal(goal: &Goal, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", goal.name)?;
    writeln!(out, "  Description: {}", goal.description)?;
    if !goal.category.is_empty() {
        writeln!(out, "  Category:    {}", goal.category)?;
    }
    if !goal.usage.is_empty() {
        writeln!(out, "  Usage:       {}", goal.usage)?;
    }
    writeln!(out, "  Source:      {}", goal.source)?;
    if !goal.commands.is_empty() {
        let names: Vec<&str> = goal.commands.iter().map(|c| c.name.as_str()).collect();
        writeln!(out, "  Commands:    {}", names.join(", "))?;
    }
    Ok(())
}

/// `code-refactoring` -> `Code Refactoring`; empty -> `Uncategorized`.
fn heading(category: &str) -> String {
    if category.is_empty() {
        return "Uncategorized".to_string();
    }
    category
        .split(|c: char| c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
