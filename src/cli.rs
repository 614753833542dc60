use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::cleaner::StageConfig;

/// Rusty Janitor - unattended temp, recycle bin and maintenance cleanup
#[derive(Parser, Debug)]
#[command(name = "rusty-janitor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the cleanup stages
    Clean(CleanArgs),

    /// Check the release feed and fetch a newer installer
    Update(UpdateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Args, Debug, Default)]
pub struct CleanArgs {
    /// Purge temp folders and empty the recycle bin
    #[arg(long)]
    pub temp: bool,

    /// Clean browser caches
    #[arg(long)]
    pub browser_cache: bool,

    /// Remove duplicate files
    #[arg(long)]
    pub duplicates: bool,

    /// Prune restore points
    #[arg(long)]
    pub restore_points: bool,

    /// Defragment the system drive
    #[arg(long)]
    pub defragment: bool,

    /// Import the bundled power plan
    #[arg(long)]
    pub power_plan: bool,

    /// Run the bundled service reduction script
    #[arg(long)]
    pub reduce_services: bool,

    /// Enable every stage
    #[arg(long)]
    pub all: bool,

    /// Show what would be cleaned without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Send a desktop notification when done
    #[arg(long)]
    pub notify: bool,
}

impl CleanArgs {
    /// Stages named on the command line, if any.
    pub fn stages(&self) -> Option<StageConfig> {
        if self.all {
            return Some(StageConfig::all());
        }

        let stages = StageConfig {
            purge_temp: self.temp,
            browser_cache: self.browser_cache,
            duplicate_files: self.duplicates,
            restore_points: self.restore_points,
            defragment: self.defragment,
            import_power_plan: self.power_plan,
            reduce_services: self.reduce_services,
        };
        (!stages.is_empty()).then_some(stages)
    }
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Version to compare against the feed
    #[arg(long, value_name = "VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    pub current: String,

    /// Release feed URL (overrides the config)
    #[arg(long, value_name = "URL", env = "RUSTY_JANITOR_FEED")]
    pub feed: Option<String>,

    /// Only report whether an update exists
    #[arg(long)]
    pub check_only: bool,

    /// Run the installer after downloading it
    #[arg(long)]
    pub run: bool,

    /// Directory to download the installer into
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_clean_with_stages() {
        let cli = Cli::parse_from([
            "rusty-janitor",
            "clean",
            "--temp",
            "--power-plan",
            "--dry-run",
        ]);
        match cli.command {
            Command::Clean(args) => {
                assert!(args.dry_run);
                let stages = args.stages().unwrap();
                assert!(stages.purge_temp);
                assert!(stages.import_power_plan);
                assert!(!stages.defragment);
            }
            _ => panic!("Expected Clean command"),
        }
    }

    #[test]
    fn clean_without_flags_defers_to_config() {
        assert!(CleanArgs::default().stages().is_none());
    }

    #[test]
    fn clean_all_enables_everything() {
        let args = CleanArgs {
            all: true,
            ..CleanArgs::default()
        };
        assert_eq!(args.stages(), Some(StageConfig::all()));
    }

    #[test]
    fn parse_update_defaults_to_crate_version() {
        let cli = Cli::parse_from(["rusty-janitor", "update", "--check-only"]);
        match cli.command {
            Command::Update(args) => {
                assert_eq!(args.current, env!("CARGO_PKG_VERSION"));
                assert!(args.check_only);
            }
            _ => panic!("Expected Update command"),
        }
    }

    #[test]
    fn global_verbose_flag() {
        let cli = Cli::parse_from(["rusty-janitor", "-vv", "clean"]);
        assert_eq!(cli.verbose, 2);
    }
}
