//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Crypto market monitor with Telegram reports")]
pub struct Cli {
    /// Environment file loaded before configuration is read
    #[arg(long, default_value = ".env", global = true)]
    pub env_file: PathBuf,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Start the scheduler and the HTTP server (default)
    #[default]
    Run,

    /// Send one full report and exit
    Report,

    /// Check every AI provider and log an advice sample
    Test,

    /// Log environment, AI, market data and channel availability
    Status,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.cmd.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_run() {
        let cli = Cli::parse_from(["pulse-bot"]);
        assert_eq!(cli.command(), Command::Run);
        assert_eq!(cli.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn test_subcommands() {
        assert_eq!(Cli::parse_from(["pulse-bot", "report"]).command(), Command::Report);
        assert_eq!(Cli::parse_from(["pulse-bot", "test"]).command(), Command::Test);

        let cli = Cli::parse_from(["pulse-bot", "status", "--env-file", "prod.env"]);
        assert_eq!(cli.command(), Command::Status);
        assert_eq!(cli.env_file, PathBuf::from("prod.env"));
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["pulse-bot", "deploy"]).is_err());
    }
}
