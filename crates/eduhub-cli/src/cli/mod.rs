//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "eduhub",
    bin_name = "eduhub",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Course record validation and storage for EduHub",
    long_about = "EduHub validates course records before they reach the \
                  document store, and reports every problem per field.",
    after_help = "EXAMPLES:\n\
        \x20 eduhub validate --json '{\"title\":\"Rust\",\"price\":10,\"instructorEmail\":\"a@edu.com\",\"level\":\"beginner\"}'\n\
        \x20 eduhub course add --file course.json\n\
        \x20 eduhub course list --format json\n\
        \x20 eduhub demo --part validation",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a course record without storing it.
    #[command(
        visible_alias = "v",
        about = "Validate a course record",
        after_help = "EXAMPLES:\n\
            \x20 eduhub validate --file course.json\n\
            \x20 cat course.json | eduhub validate\n\
            \x20 eduhub --output-format json validate --json '{\"price\": -1}'"
    )]
    Validate(InputArgs),

    /// Store and list course records.
    #[command(
        about = "Manage stored courses",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 eduhub course add --file course.json\n\
            \x20 eduhub course list"
    )]
    Course(CourseCommands),

    /// Create collections and indexes in the configured store.
    #[command(
        about = "Prepare the document store",
        after_help = "EXAMPLES:\n\
            \x20 eduhub setup\n\
            \x20 eduhub setup --reset   # drop every collection first"
    )]
    Setup(SetupArgs),

    /// Walk through the validation scenarios and the catalogue operations.
    #[command(
        about = "Run the built-in walkthrough",
        after_help = "EXAMPLES:\n\
            \x20 eduhub demo\n\
            \x20 eduhub demo --part crud"
    )]
    Demo(DemoArgs),

    /// Initialise an EduHub configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 eduhub init\n\
            \x20 eduhub --config ./eduhub.toml init --force"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 eduhub completions bash > ~/.local/share/bash-completion/completions/eduhub\n\
            \x20 eduhub completions zsh  > ~/.zfunc/_eduhub\n\
            \x20 eduhub completions fish > ~/.config/fish/completions/eduhub.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the EduHub configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 eduhub config get store.database\n\
            \x20 eduhub config list\n\
            \x20 eduhub config path"
    )]
    Config(ConfigCommands),
}

// ── record input ──────────────────────────────────────────────────────────────

/// Where a course record is read from. Standard input is used when neither
/// flag is given.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Read the record from a JSON file.
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        conflicts_with = "json",
        help = "Read the course record from a JSON file"
    )]
    pub file: Option<PathBuf>,

    /// Take the record inline.
    #[arg(
        short = 'j',
        long = "json",
        value_name = "JSON",
        help = "Course record as an inline JSON object"
    )]
    pub json: Option<String>,
}

// ── course ────────────────────────────────────────────────────────────────────

/// Subcommands for `eduhub course`.
#[derive(Debug, Subcommand)]
pub enum CourseCommands {
    /// Validate a course record and insert it.
    Add(InputArgs),
    /// List stored courses.
    #[command(visible_alias = "ls")]
    List(ListArgs),
}

/// Arguments for `eduhub course list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for `course list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// JSON array.
    Json,
}

// ── setup ─────────────────────────────────────────────────────────────────────

/// Arguments for `eduhub setup`.
#[derive(Debug, Args)]
pub struct SetupArgs {
    /// Drop every collection before creating them again.
    #[arg(long = "reset", help = "Drop existing collections first (destructive)")]
    pub reset: bool,
}

// ── demo ──────────────────────────────────────────────────────────────────────

/// Arguments for `eduhub demo`.
#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Which part of the walkthrough to run.
    #[arg(
        short = 'p',
        long = "part",
        value_enum,
        default_value = "all",
        help = "Part of the walkthrough to run"
    )]
    pub part: DemoPart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoPart {
    /// The six course validation scenarios.
    Validation,
    /// Users, courses, enrollments and analytics.
    Crud,
    All,
}

impl DemoPart {
    pub fn includes_validation(self) -> bool {
        matches!(self, Self::Validation | Self::All)
    }

    pub fn includes_crud(self) -> bool {
        matches!(self, Self::Crud | Self::All)
    }
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `eduhub init`.
///
/// The file is written to `--config` when given, otherwise to the platform
/// config directory.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `eduhub completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `eduhub config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `store.database`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_validate_inline() {
        let cli = Cli::parse_from(["eduhub", "validate", "--json", "{}"]);
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.json.as_deref(), Some("{}"));
                assert!(args.file.is_none());
            }
            other => panic!("expected Validate, got {other:?}"),
        }
    }

    #[test]
    fn file_and_json_conflict() {
        let result = Cli::try_parse_from([
            "eduhub", "validate", "--file", "a.json", "--json", "{}",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn course_list_defaults_to_table() {
        let cli = Cli::parse_from(["eduhub", "course", "list"]);
        match cli.command {
            Commands::Course(CourseCommands::List(args)) => {
                assert_eq!(args.format, ListFormat::Table);
            }
            other => panic!("expected course list, got {other:?}"),
        }
    }

    #[test]
    fn demo_part_selection() {
        let cli = Cli::parse_from(["eduhub", "demo", "--part", "crud"]);
        let Commands::Demo(args) = cli.command else {
            panic!("expected Demo");
        };
        assert!(args.part.includes_crud());
        assert!(!args.part.includes_validation());
        assert!(DemoPart::All.includes_validation());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["eduhub", "--quiet", "--verbose", "config", "list"]);
        assert!(result.is_err());
    }
}
