//! CLI command definitions.
//!
//! Running `codegen` without a subcommand is the same as `codegen generate`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod generate;
pub mod validate;

/// codegen - Generate text files from shared templates and JSON data
#[derive(Parser)]
#[command(name = "codegen")]
#[command(version, about = "Generate text files from shared templates and JSON data")]
#[command(long_about = r#"
codegen reads a project file listing shared include templates and output
tasks. Each task renders one template against one JSON input file and
writes the result to an output path.

PROJECT FILE (JSON, or YAML/TOML by extension):
  {
    "includes": ["templates/base.tera"],
    "outputs": [
      {"template": "page.tera", "input": "page.json", "output": "page.txt"}
    ]
  }

COMMANDS:
  generate  → Render every output (default)
  validate  → Parse templates and inputs without writing outputs

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - I/O error
  4 - Parse error
  5 - Render error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "CODEGEN_PROJECT",
        default_value = "codegen.json"
    )]
    pub project: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render every output task in the project
    Generate(generate::GenerateArgs),

    /// Check includes, templates and inputs without writing outputs
    Validate(validate::ValidateArgs),
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Generate(generate::GenerateArgs::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_generate() {
        let cli = Cli::try_parse_from(["codegen"]).unwrap();
        assert_eq!(cli.project, PathBuf::from("codegen.json"));
        assert!(matches!(cli.command.unwrap_or_default(), Commands::Generate(_)));
    }

    #[test]
    fn test_global_project_flag() {
        let cli = Cli::try_parse_from(["codegen", "validate", "--project", "site.yaml"]).unwrap();
        assert_eq!(cli.project, PathBuf::from("site.yaml"));
        assert!(matches!(cli.command, Some(Commands::Validate(_))));
    }
}
