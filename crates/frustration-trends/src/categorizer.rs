//! Rule-based complaint categorization
//!
//! Categories are evaluated in the order they were supplied and the first
//! category with any matching keyword wins. Matching is a case-insensitive
//! substring test, so "load" also matches "download".

use crate::review::Review;
use anyhow::{ensure, Result};
use chrono::NaiveDate;
use serde::Serialize;

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const OTHERS: &str = "Others";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintCategory {
    pub name: String,
    keywords: Vec<String>,
}

impl ComplaintCategory {
    pub fn new<S: AsRef<str>>(name: &str, keywords: &[S]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// `lowered` must already be lowercase
    fn matches_lowered(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matches_lowered(&text.to_lowercase())
    }
}

#[derive(Debug, Clone)]
pub struct ComplaintCategorizer {
    categories: Vec<ComplaintCategory>,
    fallback: String,
}

impl ComplaintCategorizer {
    pub fn new(categories: Vec<ComplaintCategory>, fallback: &str) -> Self {
        Self {
            categories,
            fallback: fallback.to_string(),
        }
    }

    /// The five complaint types shown on the category timeline
    pub fn standard() -> Self {
        Self::new(
            vec![
                ComplaintCategory::new("UI", &["layout", "screen", "design", "text", "navigation"]),
                ComplaintCategory::new("Performance", &["slow", "lag", "freeze", "delay", "load"]),
                ComplaintCategory::new("Crashes", &["crash", "error", "fail", "broken"]),
                ComplaintCategory::new("Features", &["feature", "function", "option", "customize", "tool"]),
                ComplaintCategory::new("Privacy/Security", &["privacy", "security", "data", "permission", "track"]),
            ],
            UNCATEGORIZED,
        )
    }

    /// Inflected keyword set used for radar comparisons
    pub fn expanded() -> Self {
        Self::new(
            vec![
                ComplaintCategory::new(
                    "UI",
                    &["layout", "layouts", "screen", "screens", "design", "text", "navigation", "navigate"],
                ),
                ComplaintCategory::new(
                    "Performance",
                    &["slow", "slowness", "lag", "laggy", "freeze", "freezing", "delay", "delays", "load", "loading"],
                ),
                ComplaintCategory::new(
                    "Crashes",
                    &["crash", "crashes", "crashing", "error", "errors", "fail", "failed", "failing", "broken"],
                ),
                ComplaintCategory::new(
                    "Features",
                    &["feature", "features", "function", "functions", "option", "options", "customize", "tool", "tools"],
                ),
                ComplaintCategory::new(
                    "Privacy/Security",
                    &["privacy", "secure", "security", "data", "permission", "permissions", "track", "tracking"],
                ),
            ],
            OTHERS,
        )
    }

    pub fn categories(&self) -> &[ComplaintCategory] {
        &self.categories
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Category names in evaluation order, followed by the fallback
    pub fn labels(&self) -> Vec<&str> {
        self.categories
            .iter()
            .map(|c| c.name.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
            .collect()
    }

    pub fn categorize(&self, text: &str) -> &str {
        let lowered = text.to_lowercase();
        self.categories
            .iter()
            .find(|c| c.matches_lowered(&lowered))
            .map(|c| c.name.as_str())
            .unwrap_or(self.fallback.as_str())
    }

    /// Set the category of every review from its normalized text
    pub fn categorize_reviews(&self, mut reviews: Vec<Review>) -> Vec<Review> {
        for review in &mut reviews {
            review.category = Some(self.categorize(&review.clean_text).to_string());
        }
        reviews
    }

    /// Count categories over reviews, optionally restricted to an inclusive date range
    pub fn category_counts(
        &self,
        reviews: &[Review],
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<CategoryCounts> {
        if let Some((from, to)) = range {
            ensure!(from <= to, "'from' date {} must not be after 'to' date {}", from, to);
        }

        Ok(self.count_where(reviews, |review| match range {
            Some((from, to)) => {
                let day = review.timestamp.date();
                from <= day && day <= to
            }
            None => true,
        }))
    }

    /// Count categories over the reviews mapped to `version`
    pub fn category_counts_for_version(&self, reviews: &[Review], version: &str) -> CategoryCounts {
        self.count_where(reviews, |review| review.version.as_deref() == Some(version))
    }

    fn count_where<F>(&self, reviews: &[Review], keep: F) -> CategoryCounts
    where
        F: Fn(&Review) -> bool,
    {
        let mut counts = CategoryCounts::empty(self);
        for review in reviews.iter().filter(|r| keep(*r)) {
            counts.add(self.categorize(&review.clean_text));
        }
        counts
    }
}

/// Per-category counts in categorizer order, fallback last
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCounts {
    pub entries: Vec<(String, usize)>,
    pub fallback: String,
}

impl CategoryCounts {
    pub fn empty(categorizer: &ComplaintCategorizer) -> Self {
        Self {
            entries: categorizer.labels().into_iter().map(|l| (l.to_string(), 0)).collect(),
            fallback: categorizer.fallback().to_string(),
        }
    }

    pub fn add(&mut self, label: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| name == label) {
            entry.1 += 1;
        }
    }

    pub fn get(&self, label: &str) -> usize {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Same counts with the fallback entry removed
    pub fn without_fallback(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(name, _)| *name != self.fallback)
                .cloned()
                .collect(),
            fallback: self.fallback.clone(),
        }
    }

    /// Share of each category in percent, rounded to two decimals
    pub fn percentages(&self) -> Vec<(String, f64)> {
        let total = self.total();
        self.entries
            .iter()
            .map(|(name, count)| {
                let pct = if total > 0 {
                    ((*count as f64 / total as f64) * 100.0 * 100.0).round() / 100.0
                } else {
                    0.0
                };
                (name.clone(), pct)
            })
            .collect()
    }
}
