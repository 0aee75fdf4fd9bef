use clap::{Args, Parser, Subcommand};
use romshelf_library::PlacementPolicy;
use std::path::PathBuf;

/// Scan, import and serve a personal game library.
#[derive(Debug, Parser)]
#[command(name = "romshelf", version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "ROMSHELF_CONFIG")]
    pub config: Option<PathBuf>,

    /// More output; repeat for trace logging. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List importable files below a directory without importing them
    Scan { dir: PathBuf },
    /// Import every new file below a directory
    Import {
        dir: PathBuf,
        /// copy, move or reference; defaults to the configured placement
        #[arg(short, long)]
        policy: Option<PlacementPolicy>,
    },
    /// List indexed titles
    List {
        #[arg(short, long)]
        platform: Option<String>,
    },
    /// Show which file would be served for a title
    Resolve { id: i64 },
    /// Change a title's metadata
    Edit(EditArgs),
    /// Replace a title's file with another one
    Replace { id: i64, file: PathBuf },
    /// Remove a title, and its files if the library owns them
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: i64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub platform: Option<String>,
    /// Pass an empty value to clear
    #[arg(long)]
    pub genre: Option<String>,
    #[arg(long)]
    pub year: Option<u16>,
    #[arg(long)]
    pub developer: Option<String>,
    #[arg(long)]
    pub publisher: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// not_played, playing, completed or abandoned
    #[arg(long)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["romshelf", "import", "/roms"], None)]
    #[case(&["romshelf", "import", "/roms", "--policy", "move"], Some(PlacementPolicy::Move))]
    #[case(&["romshelf", "import", "/roms", "-p", "Reference"], Some(PlacementPolicy::ReferenceInPlace))]
    fn test_import_policy(#[case] args: &[&str], #[case] expected: Option<PlacementPolicy>) {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Import { policy, .. } => assert_eq!(policy, expected),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_invalid_policy() {
        assert!(Cli::try_parse_from(["romshelf", "import", "/roms", "--policy", "symlink"]).is_err());
    }

    #[rstest]
    #[case(&["romshelf", "list"], "info")]
    #[case(&["romshelf", "-v", "list"], "debug")]
    #[case(&["romshelf", "list", "-vvv"], "trace")]
    fn test_log_level(#[case] args: &[&str], #[case] expected: &str) {
        assert_eq!(Cli::try_parse_from(args).unwrap().log_level(), expected);
    }
}
