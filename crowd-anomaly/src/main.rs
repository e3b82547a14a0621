//! Crowd Anomaly - fused disturbance detection over positional telemetry
//!
//! Loads the datasets, runs the detection pipeline, and writes the rows
//! recorded at anomalous moments.

use crowd_anomaly::app::cli::{Cli, Commands, ConfigAction};
use crowd_anomaly::app::config::Config;
use crowd_anomaly::data::io;
use crowd_anomaly::workflow::{AnomalyPipeline, PipelineInputs};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let initializing = matches!(
        cli.command,
        Commands::Config { action: ConfigAction::Init { .. } }
    );
    let config = match &cli.config {
        // init may target a file that does not exist yet
        Some(_) if initializing && !config_path.exists() => Config::default(),
        Some(_) => Config::load(&config_path)?,
        None => Config::load_default()?,
    };

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
            run_detect(
                DetectArgs {
                    trajectories,
                    movement_stats,
                    classifier,
                    detail,
                    output,
                    fused_output,
                    report,
                },
                config,
            )?;
        }
        Commands::Config { action } => {
            run_config(action, &config, &config_path)?;
        }
    }

    Ok(())
}

struct DetectArgs {
    trajectories: PathBuf,
    movement_stats: Option<PathBuf>,
    classifier: Option<PathBuf>,
    detail: PathBuf,
    output: PathBuf,
    fused_output: Option<PathBuf>,
    report: Option<PathBuf>,
}

fn require_file(path: &Path, what: &str) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("{} file not found: {:?}", what, path);
    }
    Ok(())
}

fn run_detect(args: DetectArgs, config: Config) -> anyhow::Result<()> {
    let pipeline = AnomalyPipeline::new(config)?;

    require_file(&args.trajectories, "Trajectory")?;
    require_file(&args.detail, "Detail")?;

    // Classifier output replaces the rule only when the artifact is actually there
    let classifier = match &args.classifier {
        Some(path) if path.exists() => {
            info!("Using classifier output {:?}", path);
            Some(io::load_table(path)?)
        }
        Some(path) => {
            warn!("Classifier output {:?} not found; falling back to the trigger B rule", path);
            None
        }
        None => None,
    };

    let movement_stats = match (&classifier, &args.movement_stats) {
        (None, Some(path)) => {
            require_file(path, "Movement statistics")?;
            Some(io::load_movement_stats(path)?)
        }
        _ => None,
    };

    let inputs = PipelineInputs {
        trajectories: io::load_trajectories(&args.trajectories)?,
        movement_stats,
        classifier,
        detail: io::load_table(&args.detail)?,
    };

    let output = pipeline.run(inputs)?;

    println!(
        "Found {} anomaly timestamps after fusion.",
        output.detection.fusion.anomalies.len()
    );

    io::save_table(&args.output, &output.extraction.table)?;
    println!("Saved {} rows to {}", output.extraction.table.len(), args.output.display());

    if let Some(path) = &args.fused_output {
        io::save_table(path, &output.detection.fusion.to_table())?;
        info!("Saved fused trigger table to {:?}", path);
    }

    if let Some(path) = &args.report {
        output.report.save(path)?;
        info!("Saved run report to {:?}", path);
    }

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config, config_path: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}\n", config_source(config_path));
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Get { key } => match config.get(&key)? {
            Some(value) => println!("{} = {}", key, value),
            None => anyhow::bail!("Configuration key '{}' not found", key),
        },
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "Config already exists at {:?}. Use --force to overwrite.",
                    config_path
                );
            }
            Config::default().save(&config_path.to_path_buf())?;
            println!("Created config at {:?}", config_path);
        }
    }

    Ok(())
}

fn config_source(config_path: &Path) -> String {
    if config_path.exists() {
        format!("Configuration ({:?}):", config_path)
    } else {
        format!("Configuration (built-in defaults; no file at {:?}):", config_path)
    }
}
