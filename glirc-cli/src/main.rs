use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "glirc-ext", about = "Manage glirc extensions")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Host configuration file (default: ~/.config/glirc/extensions.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered extensions and their registry state
    List(commands::extension::ListArgs),
    /// Enable an extension
    Enable {
        /// Extension name (its directory name)
        name: String,
    },
    /// Disable an extension
    Disable {
        /// Extension name (its directory name)
        name: String,
    },
    /// Show the descriptor of an extension library without starting it
    Info {
        /// Path to the extension library
        path: PathBuf,
    },
    /// Load every enabled extension against an empty client and exercise it
    Check(commands::check::CheckArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::List(args) => commands::extension::list(&config, args),
        Commands::Enable { name } => commands::extension::enable(&config, &name),
        Commands::Disable { name } => commands::extension::disable(&config, &name),
        Commands::Info { path } => commands::extension::info(&path),
        Commands::Check(args) => commands::check::run(&config, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["glirc-ext", "list"]);
        assert!(matches!(cli.command, Commands::List(_)));
        assert!(!cli.verbose);
        assert!(cli.config.is_none());

        let cli = Cli::parse_from(["glirc-ext", "enable", "auto-away", "-v"]);
        assert!(matches!(cli.command, Commands::Enable { ref name } if name == "auto-away"));
        assert!(cli.verbose);

        let cli = Cli::parse_from(["glirc-ext", "--config", "/tmp/ext.toml", "disable", "auto-away"]);
        assert!(matches!(cli.command, Commands::Disable { ref name } if name == "auto-away"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ext.toml")));

        let cli = Cli::parse_from(["glirc-ext", "info", "/opt/libhello.so"]);
        assert!(matches!(cli.command, Commands::Info { ref path } if path.ends_with("libhello.so")));

        let cli = Cli::parse_from(["glirc-ext", "check"]);
        assert!(matches!(cli.command, Commands::Check(_)));
    }

    #[test]
    fn test_info_requires_path() {
        assert!(Cli::try_parse_from(["glirc-ext", "info"]).is_err());
    }
}
