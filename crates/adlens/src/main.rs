//! CLI entry point for training and revenue estimation.

use adlens::{
    AppConfig, AppConfigBuilder, AppError, DEFAULT_RETENTION, ManualInput, PredictionAssembler,
    TrainOptions, TrainOutcome, VideoPrediction, fetcher_from_config, run_training,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Rows of the missing-value table shown after training.
const MISSING_ROWS_SHOWN: usize = 10;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "YouTube ad-revenue estimator",
    long_about = "Train regression models on channel analytics and estimate ad revenue.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  MODEL_PATH       Model bundle path (default models/best_model.json)\n  \
                  YT_CACHE_FILE    Metadata cache file (default data/yt_cache.json)\n  \
                  YT_API_KEY       YouTube Data API key (required for fetch)\n  \
                  YT_REGION        Region for category names (default US)\n\n\
                  EXAMPLES:\n  \
                  adlens train --data data/youtube.csv --report-dir reports\n\n  \
                  adlens predict --views 1000 --likes 50 --comments 20 --video-length 10 \\\n    \
                  --subscribers 5000 --category Music --device Mobile --country US\n\n  \
                  adlens fetch https://youtu.be/dQw4w9WgXcQ --retention 0.4"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Model bundle path (overrides MODEL_PATH)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the final result is written.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train every estimator on a CSV and save the best one
    Train {
        /// Path to the analytics CSV
        #[arg(long)]
        data: PathBuf,

        /// Where to write the bundle (defaults to --model / MODEL_PATH)
        #[arg(long)]
        model_out: Option<PathBuf>,

        /// Directory for eda_report.json and correlation_matrix.csv
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Held-out share of rows (0.0 - 1.0, exclusive)
        #[arg(long)]
        test_size: Option<f64>,

        /// Seed for the split and the bootstrap
        #[arg(long)]
        seed: Option<u64>,

        /// Comma-separated estimators, e.g. ridge,xgboost
        #[arg(long, value_delimiter = ',')]
        models: Vec<String>,
    },

    /// Estimate revenue for manually entered video statistics
    Predict {
        #[arg(long)]
        views: f64,
        #[arg(long)]
        likes: f64,
        #[arg(long)]
        comments: f64,
        /// Video length in minutes
        #[arg(long)]
        video_length: f64,
        #[arg(long)]
        subscribers: f64,
        #[arg(long)]
        category: String,
        #[arg(long)]
        device: String,
        #[arg(long)]
        country: String,
        /// Average share of the video watched (0.05 - 0.9)
        #[arg(long, default_value_t = DEFAULT_RETENTION)]
        retention: f64,
    },

    /// Fetch a public video and estimate its revenue
    Fetch {
        /// Video URL or 11-character id
        video: String,

        /// Average share of the video watched (0.05 - 0.9)
        #[arg(long, default_value_t = DEFAULT_RETENTION)]
        retention: f64,

        /// Region for category names (overrides YT_REGION)
        #[arg(long)]
        region: Option<String>,

        /// YouTube Data API key (overrides YT_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    run(&args).map_err(|err| {
        if args.json {
            print_json(&serde_json::json!({ "error": err }));
        }
        anyhow::Error::new(err)
    })
}

fn run(args: &Args) -> Result<(), AppError> {
    let mut builder = AppConfigBuilder::from_env();
    if let Some(model) = &args.model {
        builder = builder.model_path(model);
    }
    if let Command::Fetch {
        region, api_key, ..
    } = &args.command
    {
        if let Some(region) = region {
            builder = builder.region(region);
        }
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
    }
    let config = builder.build()?;

    match &args.command {
        Command::Train {
            data,
            model_out,
            report_dir,
            test_size,
            seed,
            models,
        } => {
            let options = TrainOptions {
                data: data.clone(),
                model_out: model_out.clone().unwrap_or_else(|| config.model_path.clone()),
                report_dir: report_dir.clone(),
                test_size: *test_size,
                seed: *seed,
                models: models.clone(),
            };
            let outcome = run_training(&options, |update| {
                info!("[{}/{}] {}", update.completed, update.total, update.message);
            })?;

            if args.json {
                print_json(&outcome);
            } else {
                print_training_summary(&outcome);
            }
        }

        Command::Predict {
            views,
            likes,
            comments,
            video_length,
            subscribers,
            category,
            device,
            country,
            retention,
        } => {
            let input = ManualInput {
                views: *views,
                likes: *likes,
                comments: *comments,
                video_length_minutes: *video_length,
                subscribers: *subscribers,
                category: category.clone(),
                device: device.clone(),
                country: country.clone(),
                retention_rate: *retention,
                date: None,
            };
            // Input errors are reported before the bundle is touched
            input.validate()?;

            let assembler = PredictionAssembler::load(&config.model_path)?;
            let prediction = assembler.predict_manual(&input)?;

            if args.json {
                print_json(&prediction);
            } else {
                print_header("REVENUE ESTIMATE");
                println!("  Model: {}", assembler.bundle().model.kind());
                println!("  Watch time: {:.2} minutes", input.watch_time_minutes());
                println!("  Estimated ad revenue: ${:.2}", prediction.revenue_usd);
                println!("{}", "=".repeat(80));
            }
        }

        Command::Fetch {
            video, retention, ..
        } => {
            adlens::validate_retention(*retention)?;
            let fetcher = fetcher_from_config(&config)?;
            let assembler = PredictionAssembler::load(&config.model_path)?;
            let result = assembler.predict_video(&fetcher, video, *retention, None)?;

            if args.json {
                print_json(&result);
            } else {
                print_video_summary(&result, &config);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn print_header(title: &str) {
    println!("\n{}", "=".repeat(80));
    println!("{}", title);
    println!("{}\n", "=".repeat(80));
}

fn print_training_summary(outcome: &TrainOutcome) {
    print_header("TRAINING SUMMARY");

    println!("DATASET");
    println!("{}", "-".repeat(40));
    println!(
        "  Loaded: {} rows x {} columns",
        outcome.initial_shape.0, outcome.initial_shape.1
    );
    for action in &outcome.cleaning_actions {
        println!("  - {}", action);
    }
    println!();

    println!("EXPLORATORY SUMMARY");
    println!("{}", "-".repeat(40));
    print!("{}", outcome.eda.render_table(MISSING_ROWS_SHOWN));
    for path in &outcome.report_files {
        println!("  Wrote {}", path.display());
    }
    println!();

    println!("MODELS");
    println!("{}", "-".repeat(40));
    println!(
        "  Split: {} train / {} test rows, {} features",
        outcome.train_rows,
        outcome.test_rows,
        outcome.feature_columns.len()
    );
    println!(
        "  {:<18} {:>12} {:>12} {:>12} {:>10}",
        "model", "R2", "RMSE", "MAE", "time (s)"
    );
    for result in &outcome.results {
        let marker = if result.kind == outcome.best_model { "*" } else { " " };
        println!(
            "{} {:<18} {:>12.4} {:>12.4} {:>12.4} {:>10.2}",
            marker,
            result.kind.to_string(),
            result.metrics.r2,
            result.metrics.rmse,
            result.metrics.mae,
            result.training_time_seconds
        );
    }
    println!();

    println!("{}", "=".repeat(80));
    println!(
        "Best model: {} saved to {}",
        outcome.best_model,
        outcome.model_path.display()
    );
    println!("{}", "=".repeat(80));
}

fn print_video_summary(result: &VideoPrediction, config: &AppConfig) {
    let meta = &result.metadata;
    print_header("VIDEO ESTIMATE");

    println!("PUBLIC METADATA");
    println!("{}", "-".repeat(40));
    println!("  Id: {}", meta.video_id);
    println!("  Title: {}", meta.title.as_deref().unwrap_or("-"));
    println!("  Published: {}", meta.published_at.as_deref().unwrap_or("-"));
    println!("  Views: {}", format_count(meta.view_count));
    println!("  Likes: {}", format_count(meta.like_count));
    println!("  Comments: {}", format_count(meta.comment_count));
    match meta.duration_minutes {
        Some(minutes) => println!("  Duration: {:.2} minutes", minutes),
        None => println!("  Duration: unknown"),
    }
    println!("  Channel subscribers: {}", result.subscribers);
    println!(
        "  Category: {} (region {})",
        result.category.as_deref().unwrap_or("-"),
        config.region
    );
    println!();

    println!("{}", "=".repeat(80));
    println!(
        "Estimated ad revenue: ${:.2} at {:.0}% retention",
        result.prediction.revenue_usd,
        result.retention_rate * 100.0
    );
    println!("{}", "=".repeat(80));
}

fn format_count(count: Option<u64>) -> String {
    count.map_or_else(|| "-".to_string(), |c| c.to_string())
}
