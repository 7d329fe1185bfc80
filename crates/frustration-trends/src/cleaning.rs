//! Review cleaning stage
//!
//! Applies the row filters in a fixed order: missing text, too-short text,
//! unparseable date, non-target language, empty normalized text, duplicate
//! (normalized text, timestamp) pairs. Row-level defects never fail the run;
//! they are counted in [`CleaningSummary`] and the drop counters.

use crate::language::{is_target_language, LanguageDetector};
use crate::metrics;
use crate::review::{RawReview, Review};
use crate::utils::{parse_timestamp, TextUtils};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Before/after counts for one cleaning run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningSummary {
    pub app: String,
    pub input: usize,
    pub missing_text: usize,
    pub too_short: usize,
    pub invalid_date: usize,
    pub non_target_language: usize,
    pub empty_after_normalize: usize,
    pub duplicates: usize,
    pub output: usize,
}

impl CleaningSummary {
    pub fn dropped(&self) -> usize {
        self.input - self.output
    }

    fn record_metrics(&self) {
        metrics::inc_ingested(&self.app, self.input);
        metrics::inc_retained(&self.app, self.output);
        metrics::inc_dropped(&self.app, "missing_text", self.missing_text);
        metrics::inc_dropped(&self.app, "too_short", self.too_short);
        metrics::inc_dropped(&self.app, "invalid_date", self.invalid_date);
        metrics::inc_dropped(&self.app, "non_target_language", self.non_target_language);
        metrics::inc_dropped(&self.app, "empty_after_normalize", self.empty_after_normalize);
        metrics::inc_dropped(&self.app, "duplicate", self.duplicates);
    }
}

pub struct ReviewCleaner {
    detector: Arc<dyn LanguageDetector>,
    min_text_chars: usize,
}

impl ReviewCleaner {
    pub fn new(detector: Arc<dyn LanguageDetector>, min_text_chars: usize) -> Self {
        Self {
            detector,
            min_text_chars,
        }
    }

    pub fn clean(&self, raw: Vec<RawReview>, app: &str) -> (Vec<Review>, CleaningSummary) {
        info!("Cleaning: {} ({} reviews)", app, raw.len());

        let mut summary = CleaningSummary {
            app: app.to_string(),
            input: raw.len(),
            ..Default::default()
        };
        let mut seen: HashSet<(String, NaiveDateTime)> = HashSet::new();
        let mut cleaned = Vec::with_capacity(raw.len());

        for row in raw {
            let Some(text) = row.text else {
                summary.missing_text += 1;
                continue;
            };
            if text.trim().chars().count() <= self.min_text_chars {
                summary.too_short += 1;
                continue;
            }
            let Some(timestamp) = row.date.as_deref().and_then(parse_timestamp) else {
                summary.invalid_date += 1;
                continue;
            };
            if !is_target_language(self.detector.as_ref(), &text) {
                summary.non_target_language += 1;
                continue;
            }
            let clean_text = TextUtils::normalize(&text);
            if clean_text.is_empty() {
                summary.empty_after_normalize += 1;
                continue;
            }
            if !seen.insert((clean_text.clone(), timestamp)) {
                summary.duplicates += 1;
                continue;
            }

            cleaned.push(Review {
                row: row.row,
                app: app.to_string(),
                timestamp,
                text,
                clean_text,
                version: None,
                sentiment: None,
                category: None,
                columns: row.columns,
            });
        }

        summary.output = cleaned.len();
        summary.record_metrics();
        info!(
            "Cleaned: {} reviews remain after processing ({} dropped: {} missing text, {} too short, {} bad date, {} non-target language, {} empty, {} duplicates)",
            summary.output,
            summary.dropped(),
            summary.missing_text,
            summary.too_short,
            summary.invalid_date,
            summary.non_target_language,
            summary.empty_after_normalize,
            summary.duplicates,
        );
        (cleaned, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use proptest::prelude::*;

    /// Accepts anything not marked as foreign
    struct FakeDetector;

    impl LanguageDetector for FakeDetector {
        fn detect(&self, text: &str) -> Result<bool> {
            if text.contains("[fail]") {
                anyhow::bail!("cannot classify");
            }
            Ok(!text.contains("[foreign]"))
        }
    }

    fn raw(row: usize, text: Option<&str>, date: Option<&str>) -> RawReview {
        RawReview {
            row,
            text: text.map(String::from),
            date: date.map(String::from),
            columns: vec![("content".to_string(), text.unwrap_or_default().to_string())],
        }
    }

    fn cleaner() -> ReviewCleaner {
        ReviewCleaner::new(Arc::new(FakeDetector), 10)
    }

    #[test]
    fn test_each_filter_drops_its_rows() {
        let rows = vec![
            raw(0, Some("App keeps crashing on start"), Some("2023-01-02")),
            raw(1, None, Some("2023-01-02")),
            raw(2, Some("  too short   "), Some("2023-01-02")),
            raw(3, Some("Long enough review text"), Some("yesterday")),
            raw(4, Some("Long enough but [foreign]"), Some("2023-01-02")),
            raw(5, Some("Long enough but [fail]"), Some("2023-01-02")),
            raw(6, Some("!!!??? ... !!! ???"), Some("2023-01-02")),
            raw(7, Some("APP keeps crashing on start!!"), Some("2023-01-02")),
        ];

        let (cleaned, summary) = cleaner().clean(rows, "Zoom");

        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].row, 0);
        assert_eq!(cleaned[0].clean_text, "app keeps crashing on start");
        assert_eq!(cleaned[0].app, "Zoom");
        assert_eq!(summary.missing_text, 1);
        assert_eq!(summary.too_short, 1);
        assert_eq!(summary.invalid_date, 1);
        assert_eq!(summary.non_target_language, 2);
        assert_eq!(summary.empty_after_normalize, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.input, 8);
        assert_eq!(summary.output, 1);
        assert_eq!(summary.dropped(), 7);
    }

    #[test]
    fn test_length_boundary_is_exclusive() {
        let rows = vec![
            raw(0, Some("exactly10!"), Some("2023-01-02")),
            raw(1, Some("eleven chrs"), Some("2023-01-02")),
        ];
        let (cleaned, summary) = cleaner().clean(rows, "Zoom");
        assert_eq!(summary.too_short, 1);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].row, 1);
    }

    #[test]
    fn test_same_text_on_different_dates_is_kept() {
        let rows = vec![
            raw(0, Some("Screen sharing is broken"), Some("2023-01-02")),
            raw(1, Some("Screen sharing is broken"), Some("2023-01-03")),
            raw(2, Some("Screen sharing is broken"), Some("2023-01-02 00:00:00")),
        ];
        let (cleaned, summary) = cleaner().clean(rows, "Webex");
        assert_eq!(cleaned.len(), 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(cleaned.iter().map(|r| r.row).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_source_columns_are_preserved() {
        let rows = vec![raw(0, Some("Tabs freeze all the time"), Some("2023-03-01"))];
        let (cleaned, _) = cleaner().clean(rows, "Firefox");
        assert_eq!(cleaned[0].columns[0].0, "content");
        assert_eq!(cleaned[0].text, "Tabs freeze all the time");
    }

    #[test]
    fn test_empty_input() {
        let (cleaned, summary) = cleaner().clean(Vec::new(), "Zoom");
        assert!(cleaned.is_empty());
        assert_eq!(summary.input, 0);
        assert_eq!(summary.dropped(), 0);
    }

    fn date_strategy() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("2023-01-02".to_string())),
            Just(Some("2023-01-02 09:30:00".to_string())),
            Just(Some("2023-02-14T08:00:00Z".to_string())),
            Just(Some("not a date".to_string())),
        ]
    }

    proptest! {
        #[test]
        fn prop_cleaning_only_shrinks_and_keeps_clean_text(
            rows in proptest::collection::vec(
                (proptest::option::of("[a-zA-Z .!?,']{0,30}( \\[foreign\\])?"), date_strategy()),
                0..40,
            )
        ) {
            let raw_reviews: Vec<RawReview> = rows
                .iter()
                .enumerate()
                .map(|(row, (text, date))| RawReview {
                    row,
                    text: text.clone(),
                    date: date.clone(),
                    columns: Vec::new(),
                })
                .collect();

            let (cleaned, summary) = cleaner().clean(raw_reviews, "Prop");

            prop_assert!(cleaned.len() <= rows.len());
            prop_assert_eq!(summary.output, cleaned.len());
            prop_assert_eq!(
                summary.missing_text
                    + summary.too_short
                    + summary.invalid_date
                    + summary.non_target_language
                    + summary.empty_after_normalize
                    + summary.duplicates,
                summary.dropped()
            );

            let mut keys = HashSet::new();
            for review in &cleaned {
                prop_assert!(!review.clean_text.is_empty());
                prop_assert_eq!(&review.app, "Prop");
                prop_assert!(keys.insert((review.clean_text.clone(), review.timestamp)));
            }
            prop_assert!(cleaned.windows(2).all(|w| w[0].row < w[1].row));
        }
    }
}
