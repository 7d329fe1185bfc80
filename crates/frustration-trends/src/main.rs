// frustration-trends/crates/frustration-trends/src/main.rs

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use frustration_trends::{
    aggregate_weekly, metrics, negative_reviews_for_version, negative_reviews_in_week, sentiment_by_version,
    telemetry, ComplaintCategorizer, Config, ReviewPipeline, Stage,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "frustration-trends", about = "Weekly frustration trends from app-store reviews")]
struct Cli {
    /// Log level for this crate when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum ResumeStage {
    Cleaned,
    Mapped,
    Final,
}

#[cfg(feature = "cli")]
impl From<ResumeStage> for Stage {
    fn from(stage: ResumeStage) -> Self {
        match stage {
            ResumeStage::Cleaned => Stage::Cleaned,
            ResumeStage::Mapped => Stage::Mapped,
            ResumeStage::Final => Stage::Final,
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline for every configured app
    Run {
        /// Comma-separated app names overriding APPS
        #[arg(long, value_delimiter = ',')]
        apps: Vec<String>,
        /// Print the metrics exposition after the run
        #[arg(long)]
        metrics: bool,
    },
    /// Continue one app's run from a checkpoint
    Resume {
        #[arg(long)]
        app: String,
        #[arg(long, value_enum)]
        from: ResumeStage,
    },
    /// Weekly negative-percentage timeline from an app's final checkpoint
    Weekly {
        #[arg(long)]
        app: String,
        /// Week start date (YYYY-MM-DD) to list negative reviews for
        #[arg(long)]
        drill_down: Option<chrono::NaiveDate>,
        #[arg(long, default_value_t = 3)]
        limit: usize,
    },
    /// Sentiment per mapped version from an app's final checkpoint
    Versions {
        #[arg(long)]
        app: String,
        /// Version to list category counts and negative reviews for
        #[arg(long)]
        drill_down: Option<String>,
        #[arg(long, default_value_t = 3)]
        limit: usize,
    },
    /// Complaint category counts from an app's final checkpoint
    Categories {
        #[arg(long)]
        app: String,
        #[arg(long)]
        from: Option<chrono::NaiveDate>,
        #[arg(long)]
        to: Option<chrono::NaiveDate>,
        /// Use the inflected keyword set with an "Others" fallback
        #[arg(long)]
        expanded: bool,
        /// Report percentages instead of counts
        #[arg(long)]
        percent: bool,
        /// Leave the fallback category out
        #[arg(long)]
        exclude_fallback: bool,
    },
    /// Print the effective configuration
    Config,
}

#[cfg(feature = "cli")]
fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(&cli.log_level);
    metrics::init_metrics();

    let mut cfg = Config::from_env()?;

    match cli.command {
        Command::Run { apps, metrics: show_metrics } => {
            if !apps.is_empty() {
                cfg.apps = apps;
            }
            let pipeline = ReviewPipeline::from_config(cfg)?;
            let results = pipeline.run_all();

            let mut failed = Vec::new();
            let mut reports = Vec::new();
            for (app, result) in results {
                match result {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        eprintln!("{}: {:#}", app, e);
                        failed.push(app);
                    }
                }
            }
            print_json(&reports)?;
            if show_metrics {
                eprintln!("{}", metrics::render()?);
            }
            if !failed.is_empty() {
                anyhow::bail!("Pipeline failed for: {}", failed.join(", "));
            }
        }
        Command::Resume { app, from } => {
            let pipeline = ReviewPipeline::from_config(cfg)?;
            let report = pipeline.resume_app(&app, from.into())?;
            print_json(&report)?;
        }
        Command::Weekly { app, drill_down, limit } => {
            let week_start = cfg.week_start;
            let pipeline = ReviewPipeline::from_config(cfg)?;
            let reviews = pipeline
                .final_reviews(&app)
                .with_context(|| format!("Run the pipeline for {} first", app))?;
            match drill_down {
                Some(week) => {
                    let negative = negative_reviews_in_week(&reviews, week, week_start, Some(limit));
                    print_json(&negative)?;
                }
                None => print_json(&aggregate_weekly(&reviews, week_start))?,
            }
        }
        Command::Versions { app, drill_down, limit } => {
            let pipeline = ReviewPipeline::from_config(cfg)?;
            let reviews = pipeline
                .final_reviews(&app)
                .with_context(|| format!("Run the pipeline for {} first", app))?;
            match drill_down {
                Some(version) => {
                    let categories = pipeline.categorizer().category_counts_for_version(&reviews, &version);
                    let negative = negative_reviews_for_version(&reviews, &version, Some(limit));
                    print_json(&serde_json::json!({
                        "version": version,
                        "categories": categories.entries,
                        "negative_reviews": negative,
                    }))?;
                }
                None => print_json(&sentiment_by_version(&reviews))?,
            }
        }
        Command::Categories { app, from, to, expanded, percent, exclude_fallback } => {
            let categorizer = if expanded {
                ComplaintCategorizer::expanded()
            } else {
                ComplaintCategorizer::standard()
            };
            let pipeline = ReviewPipeline::from_config(cfg)?.with_categorizer(categorizer);
            let reviews = pipeline
                .final_reviews(&app)
                .with_context(|| format!("Run the pipeline for {} first", app))?;

            let range = match (from, to) {
                (Some(from), Some(to)) => Some((from, to)),
                (None, None) => None,
                _ => anyhow::bail!("--from and --to must be given together"),
            };
            let mut counts = pipeline.categorizer().category_counts(&reviews, range)?;
            if exclude_fallback {
                counts = counts.without_fallback();
            }
            if percent {
                print_json(&counts.percentages())?;
            } else {
                print_json(&counts.entries)?;
            }
        }
        Command::Config => cfg.print_config(),
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    println!("CLI feature not enabled. Enable with --features cli");
}
