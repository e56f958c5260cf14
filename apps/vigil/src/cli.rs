//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vigil",
    version,
    about = "Vigil: rule-based source compliance checks",
    long_about = "Vigil scans recently changed source files against coding-standard rules, scores compliance, and writes a markdown report.\n\nConfiguration precedence: CLI > vigil.toml > defaults.",
    after_help = "Examples:\n  vigil check\n  vigil check --selection all --output json\n  vigil check src/Models/User.cs 'Views/**/*.cshtml'\n  vigil gate --tasks todos.json\n  vigil rules",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current vigil version.")]
    Version,
    /// Validate candidate files and write the report
    #[command(
        about = "Run a validation pass",
        long_about = "Select candidate files (version-control history, then modification time, then every governed file), apply all rules, print a summary, and persist the markdown report. Exits 1 when any error-severity violation is found.",
        after_help = "Examples:\n  vigil check\n  vigil check --window-days 7\n  vigil check --selection all --no-report\n  vigil check src/App.cs"
    )]
    Check {
        /// Explicit files or glob patterns; bypasses candidate selection
        paths: Vec<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Recency window in days (default: 2)")]
        window_days: Option<u64>,
        #[arg(long, help = "Selection mode: auto|mtime|all (default: auto)")]
        selection: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Report path relative to the root (default: CODE_VALIDATION_REPORT.md)")]
        report: Option<String>,
        #[arg(long, help = "Worker threads for rule evaluation (default: all cores)")]
        jobs: Option<usize>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Do not write the report file")]
        no_report: bool,
    },
    /// Trigger validation from task progress
    #[command(
        about = "Run the completion gate",
        long_about = "Read work items (priority/status), decide whether a priority tier or the whole list is complete, run a validation pass when it is, and print a milestone summary. Exits with the validation's exit code when it ran.",
        after_help = "Examples:\n  vigil gate --tasks todos.json\n  cat todos.json | vigil gate --tasks -\n  vigil gate --tasks plan.yaml --force"
    )]
    Gate {
        #[arg(long, help = "Work items file (.json, .yaml, .yml) or - for JSON on stdin")]
        tasks: String,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Run validation even when no milestone is reached")]
        force: bool,
        #[arg(long, help = "Validation timeout in seconds (default: 600)")]
        timeout_secs: Option<u64>,
    },
    /// List registered rules
    #[command(
        about = "List rules",
        long_about = "Print the registered rules in evaluation order with severity and governed file classes."
    )]
    Rules {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
