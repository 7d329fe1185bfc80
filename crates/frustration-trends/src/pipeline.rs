//! Per-app pipeline orchestration
//!
//! Cleaning → version mapping → sentiment labeling → categorization →
//! aggregation, strictly in that order for one app. Apps share no mutable
//! state, so [`ReviewPipeline::run_all`] runs them in parallel and reports
//! each app's outcome separately.

use crate::aggregation::{
    aggregate_weekly, sentiment_by_version, weekly_category_counts, VersionBucket, WeeklyBucket, WeeklyCategoryCounts,
};
use crate::cache::ReviewCache;
use crate::categorizer::{CategoryCounts, ComplaintCategorizer};
use crate::cleaning::{CleaningSummary, ReviewCleaner};
use crate::config::Config;
use crate::language::{LanguageDetector, StopwordLanguageDetector};
use crate::review::{RawReview, Review};
use crate::sentiment::{label_sentiments, HttpClassifier, LexiconClassifier, SentimentClassifier};
use crate::storage::{self, Stage};
use crate::versioning::{assign_versions, load_version_config, VersionConfig};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Everything the presentation layer needs for one app
#[derive(Debug, Clone, Serialize)]
pub struct AppReport {
    pub app: String,
    pub reviews: usize,
    pub cleaning: Option<CleaningSummary>,
    pub weekly: Vec<WeeklyBucket>,
    pub weekly_categories: Vec<WeeklyCategoryCounts>,
    pub versions: Vec<VersionBucket>,
    pub categories: CategoryCounts,
}

pub struct ReviewPipeline {
    config: Config,
    cleaner: ReviewCleaner,
    classifier: Arc<dyn SentimentClassifier>,
    categorizer: ComplaintCategorizer,
    versions: VersionConfig,
    cache: ReviewCache,
}

impl ReviewPipeline {
    pub fn new(
        config: Config,
        detector: Arc<dyn LanguageDetector>,
        classifier: Arc<dyn SentimentClassifier>,
        versions: VersionConfig,
    ) -> Self {
        let cleaner = ReviewCleaner::new(detector, config.min_text_chars);
        Self {
            config,
            cleaner,
            classifier,
            categorizer: ComplaintCategorizer::standard(),
            versions,
            cache: ReviewCache::default(),
        }
    }

    /// Wire the default collaborators described by `config`.
    ///
    /// A missing version file only disables version mapping; a malformed one
    /// is an error.
    pub fn from_config(config: Config) -> Result<Self> {
        let versions = if config.version_config_path.exists() {
            load_version_config(&config.version_config_path)?
        } else {
            warn!(
                "Version config {} not found; reviews will not be mapped to versions",
                config.version_config_path.display()
            );
            VersionConfig::default()
        };

        let classifier: Arc<dyn SentimentClassifier> = match &config.classifier_url {
            Some(url) => Arc::new(HttpClassifier::new(url, config.classifier_timeout())?),
            None => Arc::new(LexiconClassifier),
        };

        Ok(Self::new(
            config,
            Arc::new(StopwordLanguageDetector::default()),
            classifier,
            versions,
        ))
    }

    pub fn with_categorizer(mut self, categorizer: ComplaintCategorizer) -> Self {
        self.categorizer = categorizer;
        self
    }

    pub fn with_cache(mut self, cache: ReviewCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn categorizer(&self) -> &ComplaintCategorizer {
        &self.categorizer
    }

    pub fn cache(&self) -> &ReviewCache {
        &self.cache
    }

    /// Run every stage in memory without touching the filesystem
    pub fn process(&self, app: &str, raw: Vec<RawReview>) -> (Vec<Review>, AppReport) {
        let (cleaned, summary) = self.cleaner.clean(raw, app);
        let mapped = assign_versions(cleaned, app, &self.versions);
        let labeled = self.label_and_categorize(mapped);
        let report = self.report(app, &labeled, Some(summary));
        (labeled, report)
    }

    /// Full run for one app: raw export in, checkpoints and report out
    pub fn run_app(&self, app: &str) -> Result<AppReport> {
        let started = Instant::now();
        let input = self.config.input_path(app);
        let columns = &self.config.columns;
        let export = storage::read_raw_reviews(&input, columns)
            .with_context(|| format!("Pipeline for {} could not read its input", app))?;
        let headers = export.source_headers;

        let (cleaned, summary) = self.cleaner.clean(export.rows, app);
        self.checkpoint(app, &headers, &cleaned, Stage::Cleaned)?;

        let mapped = assign_versions(cleaned, app, &self.versions);
        self.checkpoint(app, &headers, &mapped, Stage::Mapped)?;

        let labeled = self.label_and_categorize(mapped);
        self.checkpoint(app, &headers, &labeled, Stage::Final)?;

        let report = self.report(app, &labeled, Some(summary));
        self.cache.insert(app, labeled);
        info!("Finished {} in {:.2?}", app, started.elapsed());
        Ok(report)
    }

    /// Continue a run from the checkpoint written after `stage`
    pub fn resume_app(&self, app: &str, stage: Stage) -> Result<AppReport> {
        let path = self.config.checkpoint_path(app, stage.file_suffix());
        let table = storage::read_checkpoint(&path, &self.config.columns)?;
        let (headers, reviews) = (table.source_headers, table.rows);
        info!("Resuming {} from {} checkpoint ({} reviews)", app, stage.file_suffix(), reviews.len());

        let labeled = match stage {
            Stage::Cleaned => {
                let mapped = assign_versions(reviews, app, &self.versions);
                self.checkpoint(app, &headers, &mapped, Stage::Mapped)?;
                let labeled = self.label_and_categorize(mapped);
                self.checkpoint(app, &headers, &labeled, Stage::Final)?;
                labeled
            }
            Stage::Mapped => {
                let labeled = self.label_and_categorize(reviews);
                self.checkpoint(app, &headers, &labeled, Stage::Final)?;
                labeled
            }
            Stage::Final => self.categorizer.categorize_reviews(reviews),
        };

        let report = self.report(app, &labeled, None);
        self.cache.insert(app, labeled);
        Ok(report)
    }

    /// Run every configured app; one app failing leaves the others untouched
    pub fn run_all(&self) -> Vec<(String, Result<AppReport>)> {
        self.config
            .apps
            .par_iter()
            .map(|app| {
                let result = self.run_app(app);
                if let Err(e) = &result {
                    error!("Pipeline for {} failed: {:#}", app, e);
                }
                (app.clone(), result)
            })
            .collect()
    }

    /// Final-stage reviews for `app`, read from its checkpoint once and cached
    pub fn final_reviews(&self, app: &str) -> Result<Arc<Vec<Review>>> {
        self.cache.get_or_load(app, || {
            let path = self.config.checkpoint_path(app, Stage::Final.file_suffix());
            let table = storage::read_checkpoint(&path, &self.config.columns)?;
            Ok(self.categorizer.categorize_reviews(table.rows))
        })
    }

    fn label_and_categorize(&self, reviews: Vec<Review>) -> Vec<Review> {
        let labeled = label_sentiments(reviews, self.classifier.as_ref(), self.config.max_classifier_chars);
        self.categorizer.categorize_reviews(labeled)
    }

    fn checkpoint(&self, app: &str, headers: &[String], reviews: &[Review], stage: Stage) -> Result<()> {
        let path = self.config.checkpoint_path(app, stage.file_suffix());
        storage::write_checkpoint(&path, headers, reviews, &self.config.columns, stage)
    }

    fn report(&self, app: &str, reviews: &[Review], cleaning: Option<CleaningSummary>) -> AppReport {
        let week_start = self.config.week_start;
        let mut categories = CategoryCounts::empty(&self.categorizer);
        for review in reviews {
            categories.add(review.category.as_deref().unwrap_or(self.categorizer.fallback()));
        }

        AppReport {
            app: app.to_string(),
            reviews: reviews.len(),
            cleaning,
            weekly: aggregate_weekly(reviews, week_start),
            weekly_categories: weekly_category_counts(reviews, &self.categorizer, week_start),
            versions: sentiment_by_version(reviews),
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::SentimentLabel;
    use crate::versioning::VersionTimeline;

    struct AcceptAll;

    impl LanguageDetector for AcceptAll {
        fn detect(&self, _text: &str) -> Result<bool> {
            Ok(true)
        }
    }

    /// NEGATIVE whenever the text mentions a crash, POSITIVE otherwise
    struct CrashIsNegative;

    impl SentimentClassifier for CrashIsNegative {
        fn classify(&self, text: &str) -> Result<SentimentLabel> {
            Ok(if text.contains("crash") {
                SentimentLabel::Negative
            } else {
                SentimentLabel::Positive
            })
        }
    }

    fn raw(row: usize, text: &str, date: &str) -> RawReview {
        RawReview {
            row,
            text: Some(text.to_string()),
            date: Some(date.to_string()),
            columns: Vec::new(),
        }
    }

    fn pipeline() -> ReviewPipeline {
        let mut versions = VersionConfig::default();
        versions.insert(
            "Zoom",
            VersionTimeline::from_dates("Zoom", [("1.0", "2023-01-01"), ("2.0", "2023-03-01")]),
        );
        ReviewPipeline::new(Config::default(), Arc::new(AcceptAll), Arc::new(CrashIsNegative), versions)
    }

    #[test]
    fn test_process_runs_every_stage() {
        let raw_reviews = vec![
            raw(0, "App keeps crashing on join", "2023-02-01 10:00:00"),
            raw(1, "Works really well for calls", "2023-02-02 10:00:00"),
            raw(2, "short", "2023-02-02 10:00:00"),
            raw(3, "Crash after the new update", "2023-03-02 10:00:00"),
        ];

        let (reviews, report) = pipeline().process("Zoom", raw_reviews);

        assert_eq!(reviews.len(), 3);
        assert_eq!(reviews[0].version.as_deref(), Some("1.0"));
        assert_eq!(reviews[2].version.as_deref(), Some("2.0"));
        assert_eq!(reviews[0].sentiment, Some(SentimentLabel::Negative));
        assert_eq!(reviews[1].sentiment, Some(SentimentLabel::Positive));
        assert_eq!(reviews[0].category.as_deref(), Some("Crashes"));

        let cleaning = report.cleaning.unwrap();
        assert_eq!(cleaning.too_short, 1);
        assert_eq!(report.reviews, 3);
        assert_eq!(report.weekly.len(), 2);
        assert_eq!(report.weekly[0].negative_percent, 50.0);
        assert_eq!(report.weekly[1].negative_percent, 100.0);
        assert_eq!(report.categories.total(), 3);
        assert_eq!(report.categories.get("Crashes"), 2);
        let versions: Vec<(Option<&str>, usize)> = report
            .versions
            .iter()
            .map(|b| (b.version.as_deref(), b.total))
            .collect();
        assert_eq!(versions, vec![(Some("1.0"), 2), (Some("2.0"), 1)]);
    }

    #[test]
    fn test_process_without_timeline_leaves_versions_unset() {
        let (reviews, _) = pipeline().process("Webex", vec![raw(0, "Audio keeps dropping out", "2023-02-01")]);
        assert_eq!(reviews.len(), 1);
        assert!(reviews[0].version.is_none());
        assert!(reviews[0].sentiment.is_some());
    }
}
