use std::time::Duration;

use crate::cli::{Args, ColorChoice, DumpFormat};
use crate::interpreter::ExecutionBudget;

pub struct AppConfig {
    pub color_enabled: bool,
    pub verbose: bool,
    pub budget: ExecutionBudget,
    pub dump_env: Option<DumpFormat>,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };

        let mut budget = ExecutionBudget::default();
        if let Some(steps) = args.max_steps {
            budget = budget.with_max_steps(steps);
        }
        if let Some(ms) = args.timeout_ms {
            budget = budget.with_timeout(Duration::from_millis(ms));
        }
        if let Some(depth) = args.max_depth {
            budget = budget.with_max_call_depth(depth);
        }

        AppConfig {
            color_enabled,
            verbose: args.verbose,
            budget,
            dump_env: args.dump_env,
        }
    }

    /// Default tracing directive when `RUST_LOG` is unset.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "trio=debug"
        } else {
            "trio=warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_budget_from_flags() {
        let args = Args::try_parse_from([
            "trio", "anna", "--max-steps", "5", "--timeout-ms", "250", "--max-depth", "7", "--color", "never",
        ])
        .unwrap();
        let config = AppConfig::from_args(&args);
        assert!(!config.color_enabled);
        assert_eq!(config.budget.max_steps, Some(5));
        assert_eq!(config.budget.timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.budget.max_call_depth, 7);
        assert_eq!(config.log_directive(), "trio=warn");
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["trio", "rosa", "-v"]).unwrap();
        let config = AppConfig::from_args(&args);
        assert_eq!(config.budget.max_steps, ExecutionBudget::default().max_steps);
        assert!(config.budget.timeout.is_none());
        assert_eq!(config.log_directive(), "trio=debug");
    }
}
