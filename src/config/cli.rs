use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "megaverse")]
#[command(version)]
#[command(about = "Populate a megaverse grid from a goal map through the challenge API")]
#[command(after_help = "Examples:
  megaverse create                          # Create from goal.json
  megaverse create --from-api               # Create from the API goal map
  megaverse create --goal-file custom.json  # Create from a custom file
  megaverse preview                         # Preview the creation plan
  megaverse delete                          # Delete all objects")]
pub struct Cli {
    /// Candidate ID (overrides CANDIDATE_ID and the config file)
    #[arg(long, global = true)]
    pub candidate_id: Option<String>,

    /// Logging level
    #[arg(long, global = true, value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create every object of the goal map
    Create(CreateArgs),

    /// Show what would be created without calling the API
    Preview(GoalFileArgs),

    /// Delete every object currently on the map
    Delete {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Download the goal map from the API and save it as JSON
    FetchGoal {
        /// Output path (defaults to the configured goal file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare the current map against the goal
    Status(SourceArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct GoalFileArgs {
    /// Path to goal map file (defaults to GOAL_FILE or goal.json)
    #[arg(long)]
    pub goal_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    #[command(flatten)]
    pub goal: GoalFileArgs,

    /// Load the goal map from the API instead of a file
    #[arg(long, conflicts_with = "goal_file")]
    pub from_api: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Skip objects already present on the current map
    #[arg(long)]
    pub only_missing: bool,
}

impl Cli {
    /// `create` with configured defaults when no subcommand is given.
    pub fn command_or_default(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Create(CreateArgs::default()))
    }
}
