// frustration-trends/crates/frustration-trends/src/lib.rs

pub mod aggregation;
pub mod cache;
pub mod categorizer;
pub mod cleaning;
pub mod config;
pub mod language;
pub mod metrics;
pub mod pipeline;
pub mod review;
pub mod sentiment;
pub mod storage;
pub mod telemetry;
pub mod utils;
pub mod versioning;

// Public API exports
pub use config::{ColumnMapping, Config};
pub use pipeline::{AppReport, ReviewPipeline};
pub use review::{RawReview, Review, SentimentLabel};

// Stage exports
pub use aggregation::{
    aggregate_weekly, negative_reviews_for_version, negative_reviews_in_week, sentiment_by_version,
    weekly_category_counts, VersionBucket, WeeklyBucket, WeeklyCategoryCounts,
};
pub use cache::ReviewCache;
pub use categorizer::{CategoryCounts, ComplaintCategorizer, ComplaintCategory};
pub use cleaning::{CleaningSummary, ReviewCleaner};
pub use language::{is_target_language, LanguageDetector, StopwordLanguageDetector};
pub use sentiment::{label_sentiments, predict_sentiment, HttpClassifier, LexiconClassifier, SentimentClassifier};
pub use storage::{ReviewTable, Stage};
pub use utils::TextUtils;
pub use versioning::{assign_versions, load_version_config, resolve_version, Release, VersionConfig, VersionTimeline};
