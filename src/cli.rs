use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

use crate::dialect::Dialect;

#[derive(Parser, Debug)]
#[command(name = "trio")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run Anna, Alex and Rosa scripts", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    #[arg(value_enum, value_name = "DIALECT")]
    pub dialect: Option<Dialect>,

    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Start the interactive loop, after running FILE if one is given.
    #[arg(long = "repl")]
    pub repl: bool,

    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<u64>,

    #[arg(long = "timeout-ms", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    #[arg(long = "max-depth", value_name = "N")]
    pub max_depth: Option<usize>,

    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Print the final bindings after a batch run.
    #[arg(long = "dump-env", value_name = "FORMAT")]
    pub dump_env: Option<DumpFormat>,

    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Complete {
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "Invalid color choice: {}. Must be 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    Text,
    Json,
}

impl std::str::FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(DumpFormat::Text),
            "json" => Ok(DumpFormat::Json),
            _ => Err(format!("Invalid dump format: {}. Must be 'text' or 'json'", s)),
        }
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, &bin_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_invocation() {
        let args = Args::try_parse_from(["trio", "alex", "prog.alex", "--max-steps", "10", "--dump-env", "json"]).unwrap();
        assert_eq!(args.dialect, Some(Dialect::Alex));
        assert_eq!(args.file, Some(PathBuf::from("prog.alex")));
        assert_eq!(args.max_steps, Some(10));
        assert_eq!(args.dump_env, Some(DumpFormat::Json));
        assert_eq!(args.color, ColorChoice::Auto);
    }

    #[test]
    fn test_parse_completion_subcommand() {
        let args = Args::try_parse_from(["trio", "complete", "bash"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Complete { shell: Shell::Bash })));
        assert!(args.dialect.is_none());
    }

    #[test]
    fn test_rejects_unknown_dialect() {
        assert!(Args::try_parse_from(["trio", "bob"]).is_err());
        assert!("sometimes".parse::<ColorChoice>().is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }
}
