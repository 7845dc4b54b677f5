use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mcp-inject",
    about = "Install MCP server entries into editor configuration files without losing comments or formatting",
    long_about = "mcp-inject adds command-line server entries to the JSON configuration files
editors and IDEs read to discover MCP integrations.

It edits files safely:
  • Strict JSON files are decoded, updated and re-encoded with key order preserved
  • JSON5-style files (comments, trailing commas) are patched in place,
    leaving every byte outside the inserted entries untouched
  • Entries that already exist are left alone, so re-running is harmless

Batch configuration is read from:
  • $MCP_INJECT_CONFIG, or
  • $XDG_CONFIG_HOME/mcp-inject/config.toml (or the platform config directory)",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug output (shows INFO and DEBUG messages)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Enable trace output (shows all log messages including TRACE)
    #[arg(short = 't', long, global = true)]
    pub trace: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add one server entry to a configuration file
    #[command(long_about = "Add one server entry to a configuration file.

The file and its parent directories are created when missing. Existing
entries with the same name are kept unless --overwrite is given.

Examples:
  # VS Code style file
  mcp-inject add .vscode/mcp.json --key servers --name boost \\
      --command php --arg artisan --arg boost:mcp

  # Cursor style file with an environment variable
  mcp-inject add ~/.cursor/mcp.json --name docs --command npx --env TOKEN=abc

  # Show the result without writing it
  mcp-inject add .mcp.json --name boost --command php --dry-run")]
    Add(AddArgs),

    /// Report whether a file is strict JSON or needs in-place patching
    Classify {
        /// File to inspect
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,
    },

    /// Install every configured server into every configured target
    #[command(long_about = "Install every configured server into every configured target.

Example config.toml:

  [default]
  config-key = \"mcpServers\"
  backup = true

  [[targets]]
  path = \"~/.cursor/mcp.json\"

  [[targets]]
  path = \".vscode/mcp.json\"
  config-key = \"servers\"

  [servers.boost]
  command = \"php\"
  args = [\"artisan\", \"boost:mcp\"]")]
    Apply {
        /// Path to the batch configuration file
        #[arg(short, long, env = "MCP_INJECT_CONFIG", value_hint = clap::ValueHint::FilePath)]
        config: Option<PathBuf>,

        /// Preview changes without writing them
        #[arg(short, long)]
        dry_run: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Configuration file to update
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub path: PathBuf,

    /// Name of the server entry
    #[arg(short, long)]
    pub name: String,

    /// Executable the editor should launch
    #[arg(short, long)]
    pub command: String,

    /// Argument passed to the command (repeatable)
    #[arg(short, long = "arg", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Environment variable as KEY=VALUE (repeatable)
    #[arg(short, long = "env", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Top-level key holding the server entries
    #[arg(short, long, default_value = crate::DEFAULT_CONFIG_KEY)]
    pub key: String,

    /// Replace an existing entry with the same name
    #[arg(short, long)]
    pub overwrite: bool,

    /// Create a timestamped backup before modifying the file
    #[arg(short, long)]
    pub backup: bool,

    /// Print the resulting document instead of writing it
    #[arg(short, long)]
    pub dry_run: bool,
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        },
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
