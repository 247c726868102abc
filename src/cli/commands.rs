//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Job-listing watcher
#[derive(Parser, Debug)]
#[command(name = "listing-watch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// State file (JSON), overrides the configured backend
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server mode
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Scrape every source once and notify subscribers
    Run,

    /// Show the stored checkpoint for each source
    Checkpoints,

    /// List subscribers
    Subscribers,

    /// Add a subscriber
    Subscribe {
        /// Email address
        address: String,
    },

    /// Remove a subscriber
    Unsubscribe {
        /// Email address
        address: String,

        /// Unsubscribe token (token mode)
        #[arg(long)]
        token: Option<String>,
    },

    /// List configured sources
    Sources,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::parse_from(["listing-watch", "run", "--state", "s.json", "-v"]);
        assert!(matches!(cli.command, Commands::Run));
        assert_eq!(cli.state, Some(PathBuf::from("s.json")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_parse_unsubscribe() {
        let cli = Cli::parse_from([
            "listing-watch",
            "unsubscribe",
            "a@example.com",
            "--token",
            "abc",
        ]);
        match cli.command {
            Commands::Unsubscribe { address, token } => {
                assert_eq!(address, "a@example.com");
                assert_eq!(token.as_deref(), Some("abc"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_serve_port_is_optional() {
        let cli = Cli::parse_from(["listing-watch", "serve"]);
        assert!(matches!(cli.command, Commands::Serve { port: None }));
    }
}
