//! Outbreak Trend CLI
//!
//! Command-line interface for forecasting outbreak trends from a local
//! case-count table.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::path::PathBuf;

use outbreak_trend::{
    CaseDataLoader, ForecastConfig, ParamMap, TrendForecast, TrendPredictor, WindowProvider,
};

#[derive(Parser)]
#[command(name = "outbreak-trend")]
#[command(about = "Transformer-based outbreak trend forecasting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast the outbreak trend for a disease and month
    Predict {
        /// CSV case table (day,count[,count_scaled])
        #[arg(long)]
        data: PathBuf,

        /// Pretrained weight file (JSON parameter map)
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Disease identifier
        #[arg(long, default_value = "cholera")]
        disease: String,

        /// Year of the forecast month
        #[arg(long)]
        year: i32,

        /// Month of the forecast (1-12)
        #[arg(long)]
        month: u32,

        /// Configuration file (JSON); defaults match the pretrained model
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for the daily-sequence sampling, for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print or write the default configuration
    Config {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show library information
    Info,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            data,
            weights,
            disease,
            year,
            month,
            config,
            seed,
        } => cmd_predict(data, weights, &disease, year, month, config, seed)?,
        Commands::Config { output } => cmd_config(output)?,
        Commands::Info => cmd_info(),
    }

    Ok(())
}

fn cmd_predict(
    data: PathBuf,
    weights: Option<PathBuf>,
    disease: &str,
    year: i32,
    month: u32,
    config: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<()> {
    let config = match config {
        Some(path) => ForecastConfig::from_file(path)?,
        None => ForecastConfig::default(),
    };

    let series = CaseDataLoader::load_csv(disease, &data)?;
    let mut provider = WindowProvider::new(config.model.input_len);
    provider.insert(series);

    let predictor = match weights {
        Some(path) => {
            let params = ParamMap::from_file(path)?;
            let (predictor, report) = TrendPredictor::with_weights(config, &params)?;
            if !report.is_complete() {
                println!(
                    "Warning: {} parameter(s) missing from weight file (see log)",
                    report.missing.len()
                );
            }
            predictor
        }
        None => {
            println!("Warning: no weight file given, forecasting with untrained weights");
            TrendPredictor::from_config(config)?
        }
    };

    let window = match provider.window(disease, year, month) {
        Ok(window) => window,
        Err(e) if e.is_data_error() => {
            println!(
                "Cannot forecast {} for {:02}/{}: {}",
                disease, month, year, e
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut rng: Box<dyn RngCore> = match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(rand::thread_rng()),
    };
    let forecast = predictor.predict(&window.scaled, &mut *rng)?;

    print_forecast(disease, year, month, &forecast);
    Ok(())
}

fn print_forecast(disease: &str, year: i32, month: u32, forecast: &TrendForecast) {
    println!("\n{:-<56}", "");
    println!(" Outbreak forecast: {} {:02}/{}", disease, month, year);
    println!("{:-<56}", "");
    println!("Overall level:  {}", forecast.label.as_str());
    println!("Confidence:     {:.1}%", forecast.confidence() * 100.0);
    println!("Trend:          {}", forecast.direction.as_str());
    println!();
    println!("Probabilities:");
    println!("  LOW:     {:.1}%", forecast.probabilities[0] * 100.0);
    println!("  MEDIUM:  {:.1}%", forecast.probabilities[1] * 100.0);
    println!("  HIGH:    {:.1}%", forecast.probabilities[2] * 100.0);
    println!();
    println!("Daily outlook (level per day):");
    for (i, chunk) in forecast.daily_indices().chunks(10).enumerate() {
        let days: Vec<String> = chunk.iter().map(|l| l.to_string()).collect();
        println!("  days {:>2}-{:>2}:  {}", i * 10 + 1, i * 10 + chunk.len(), days.join(" "));
    }
    println!("{:-<56}\n", "");
}

fn cmd_config(output: Option<PathBuf>) -> Result<()> {
    let config = ForecastConfig::default();

    if let Some(path) = output {
        config.to_file(&path)?;
        println!("Configuration saved to: {}", path.display());
    } else {
        let json = serde_json::to_string_pretty(&config)?;
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info() {
    println!("\n{:-<50}", "");
    println!(" Outbreak Trend - transformer trend forecasting");
    println!("{:-<50}", "");
    println!("Version:     {}", outbreak_trend::VERSION);
    println!("Features:");
    println!("  - Encoder-decoder transformer over 30-day windows");
    println!("  - Per-day or class-distribution forecast heads");
    println!("  - Three-level outbreak labeling with daily trend");
    println!("  - Non-strict pretrained weight loading");
    println!("{:-<50}\n", "");
}
