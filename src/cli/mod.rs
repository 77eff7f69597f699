//! CLI commands for narrow.

pub mod hooks;
pub mod run;

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Narrow - web traffic observation proxy.
#[derive(Parser)]
#[command(name = "narrow")]
#[command(about = "An observation tool to better monitor and secure your web traffic")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the observation proxy
    Run(RunArgs),

    /// Manage the commit-message hook manifest
    Hooks {
        #[command(subcommand)]
        command: HooksCommand,
    },
}

#[derive(Subcommand)]
pub enum HooksCommand {
    /// Write .pre-commit-config.yaml into the current project
    Install {
        /// Overwrite an existing manifest
        #[arg(long, short)]
        force: bool,
    },

    /// Validate a hook manifest
    Check {
        /// Path to the manifest (defaults to ./.pre-commit-config.yaml)
        path: Option<PathBuf>,
    },
}

/// Flags for `narrow run`. Unset flags fall back to `narrow.toml` and
/// then to built-in defaults.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// The port number to run the proxy server on
    #[arg(short, long)]
    pub proxy: Option<u16>,

    /// The interval in seconds to print the histograms
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// The host of the target server
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// The port of the target server
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Blacklisted IP addresses (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub blacklist: Vec<IpAddr>,

    /// Send snapshots to the monitoring server
    #[arg(short, long)]
    pub monitoring: bool,

    /// The host of the monitoring server
    #[arg(short, long)]
    pub server: Option<String>,

    /// The key to authenticate with the monitoring server
    #[arg(short, long)]
    pub key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "narrow", "run", "--proxy", "8001", "--interval", "30", "--host", "example.com",
            "--port", "3001", "--blacklist", "1.1.1.1,2.2.2.2",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };

        assert_eq!(args.proxy, Some(8001));
        assert_eq!(args.interval, Some(30));
        assert_eq!(args.host.as_deref(), Some("example.com"));
        assert_eq!(args.port, Some(3001));
        assert_eq!(
            args.blacklist,
            vec!["1.1.1.1".parse::<IpAddr>().unwrap(), "2.2.2.2".parse().unwrap()]
        );
        assert!(!args.monitoring);
        assert_eq!(args.server, None);
        assert_eq!(args.key, None);
    }

    #[test]
    fn hooks_subcommands_parse() {
        let cli = Cli::try_parse_from(["narrow", "hooks", "install", "--force"]).unwrap();
        let Commands::Hooks {
            command: HooksCommand::Install { force },
        } = cli.command
        else {
            panic!("expected hooks install");
        };
        assert!(force);

        let cli = Cli::try_parse_from(["narrow", "hooks", "check", "other.yaml"]).unwrap();
        let Commands::Hooks {
            command: HooksCommand::Check { path },
        } = cli.command
        else {
            panic!("expected hooks check");
        };
        assert_eq!(path, Some(PathBuf::from("other.yaml")));
    }

    #[test]
    fn rejected_blacklist_entry_fails_parse() {
        assert!(Cli::try_parse_from(["narrow", "run", "--blacklist", "not-an-ip"]).is_err());
    }
}
