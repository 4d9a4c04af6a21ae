use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

use vo2trend::chart::{self, ChartFormat};
use vo2trend::config::AppConfig;
use vo2trend::export::{self, ExportFormat};
use vo2trend::logging::init_logging;
use vo2trend::{ActivitySet, ChartSpec, Gender, InputError, ProjectionRequest, Vo2MaxProjector, Vo2TrendApp};

/// vo2trend - VO2max Predictor
///
/// Projects how aerobic capacity declines with age and ranks each decade
/// against age/gender-normed VO2max percentiles.
#[derive(Parser)]
#[command(name = "vo2trend")]
#[command(version)]
#[command(about = "VO2max decline and percentile predictor", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by the projection commands
#[derive(Args)]
struct InputArgs {
    /// Gender for percentile norms (m, male, f, female)
    #[arg(short, long)]
    gender: Option<Gender>,

    /// Starting age in years
    #[arg(short, long, allow_hyphen_values = true)]
    age: Option<i32>,

    /// Starting VO2max in ml/kg/min
    #[arg(long, allow_hyphen_values = true)]
    vo2max: Option<f64>,

    /// Activities to check against (comma-separated: run, hike, walk)
    #[arg(long)]
    activities: Option<ActivitySet>,
}

impl InputArgs {
    fn into_request(self, config: &AppConfig) -> Result<ProjectionRequest> {
        let gender = self
            .gender
            .or(config.defaults.gender)
            .ok_or(InputError::MissingGender)?;
        let request = ProjectionRequest::new(
            gender,
            self.age.unwrap_or(config.defaults.age),
            self.vo2max.unwrap_or(config.defaults.vo2max),
        )
        .with_activities(self.activities.unwrap_or_default());
        request.validate()?;
        Ok(request)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Project VO2max and percentiles by decade
    Project {
        #[command(flatten)]
        input: InputArgs,

        /// Output format (table, csv, json)
        #[arg(short = 'f', long, default_value = "table")]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the trend chart as SVG, or as its JSON description
    ///
    /// Builds without the `charts` feature write the JSON description for `svg`.
    Chart {
        #[command(flatten)]
        input: InputArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Chart format (svg, json)
        #[arg(short = 'f', long, default_value = "svg")]
        format: ChartFormat,
    },

    /// Run the interactive web predictor
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (KEY=VALUE)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    match cli.command {
        Commands::Project {
            input,
            format,
            output,
        } => {
            let request = input.into_request(&config)?;
            let projection = Vo2MaxProjector::run(&request);

            match output {
                Some(path) => {
                    export::export_projection(&projection, format, &path)?;
                    println!("{} {}", "✓ Projection written to".green(), path.display());
                }
                None => {
                    let stdout = std::io::stdout();
                    export::write_projection(&projection, format, stdout.lock())?;
                }
            }
        }

        Commands::Chart {
            input,
            output,
            format,
        } => {
            let request = input.into_request(&config)?;
            let projection = Vo2MaxProjector::run(&request);
            let spec = ChartSpec::with_axis_max(&projection, config.chart.vo2max_axis_max);
            let contents = chart::render(&spec, format, config.chart.width, config.chart.height)?;
            std::fs::write(&output, contents)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{} {}", "✓ Chart written to".green(), output.display());
        }

        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            println!(
                "{} http://{}:{}/",
                "Serving VO2max Predictor on".cyan().bold(),
                config.server.host,
                config.server.port
            );
            Vo2TrendApp::new(config)?.serve().await?;
        }

        Commands::Config {
            list,
            set,
            get,
            init,
        } => {
            if init {
                if config_path.exists() {
                    return Err(anyhow!(
                        "Config file already exists: {}",
                        config_path.display()
                    ));
                }
                AppConfig::default().save_to_file(&config_path)?;
                println!("{} {}", "✓ Created".green(), config_path.display());
            } else if list {
                println!("{}", format!("Configuration ({})", config_path.display()).bold());
                for key in AppConfig::keys() {
                    println!("  {} = {}", key.cyan(), config.get(key)?);
                }
            } else if let Some(key_value) = set {
                let (key, value) = key_value
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Expected KEY=VALUE, got '{}'", key_value))?;
                config.set(key.trim(), value.trim())?;
                config.save_to_file(&config_path)?;
                println!("{} {} = {}", "✓ Set".green(), key.trim(), value.trim());
            } else if let Some(key) = get {
                println!("{}", config.get(&key)?);
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}
