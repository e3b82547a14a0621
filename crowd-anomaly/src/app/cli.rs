//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Crowd Anomaly - Fuse kinematic surprise and outward flow into anomaly events
#[derive(Parser, Debug)]
#[command(name = "crowd-anomaly")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect anomalous timestamps and extract matching detail rows
    Detect {
        /// Per-entity trajectory samples (CSV)
        #[arg(short, long)]
        trajectories: PathBuf,

        /// Per-tick movement statistics for the trigger B rule (CSV)
        #[arg(short, long)]
        movement_stats: Option<PathBuf>,

        /// External classifier output; used instead of the rule when the file exists
        #[arg(long)]
        classifier: Option<PathBuf>,

        /// Detailed dataset to extract rows from (CSV)
        #[arg(short, long)]
        detail: PathBuf,

        /// Output file for the annotated rows (CSV)
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the fused trigger table (CSV)
        #[arg(long)]
        fused_output: Option<PathBuf>,

        /// Also write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "trigger_b.outward_speed")
        key: String,
    },

    /// Write the default configuration to the --config path or the default location
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_detect_minimal() {
        let args = vec![
            "crowd-anomaly",
            "detect",
            "--trajectories", "a.csv",
            "--movement-stats", "b.csv",
            "--detail", "expanded.csv",
            "--output", "out.csv",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Detect {
                trajectories,
                movement_stats,
                classifier,
                detail,
                output,
                fused_output,
                report,
            } => {
                assert_eq!(trajectories, PathBuf::from("a.csv"));
                assert_eq!(movement_stats, Some(PathBuf::from("b.csv")));
                assert!(classifier.is_none());
                assert_eq!(detail, PathBuf::from("expanded.csv"));
                assert_eq!(output, PathBuf::from("out.csv"));
                assert!(fused_output.is_none());
                assert!(report.is_none());
            }
            _ => panic!("Expected Detect command"),
        }
    }

    #[test]
    fn test_cli_parse_detect_with_classifier() {
        let args = vec![
            "crowd-anomaly",
            "detect",
            "-t", "a.csv",
            "--classifier", "pred.csv",
            "-d", "expanded.csv",
            "-o", "out.csv",
            "--fused-output", "fused.csv",
            "--report", "run.json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Detect {
                movement_stats,
                classifier,
                fused_output,
                report,
                ..
            } => {
                assert!(movement_stats.is_none());
                assert_eq!(classifier, Some(PathBuf::from("pred.csv")));
                assert_eq!(fused_output, Some(PathBuf::from("fused.csv")));
                assert_eq!(report, Some(PathBuf::from("run.json")));
            }
            _ => panic!("Expected Detect command"),
        }
    }

    #[test]
    fn test_cli_detect_requires_output() {
        let args = vec!["crowd-anomaly", "detect", "-t", "a.csv", "-d", "x.csv"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_config_get() {
        let cli = Cli::try_parse_from(vec!["crowd-anomaly", "config", "get", "fusion.time_precision"]).unwrap();
        match cli.command {
            Commands::Config { action: ConfigAction::Get { key } } => {
                assert_eq!(key, "fusion.time_precision");
            }
            _ => panic!("Expected Config Get command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from(vec![
            "crowd-anomaly", "config", "show", "--verbose", "--config", "my.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
    }

    #[test]
    fn test_cli_config_init_force() {
        let cli = Cli::try_parse_from(vec!["crowd-anomaly", "config", "init", "-f"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config { action: ConfigAction::Init { force: true } }
        ));
    }

    #[test]
    fn test_cli_command_factory_is_valid() {
        Cli::command().debug_assert();
    }
}
