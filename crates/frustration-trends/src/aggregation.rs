//! Weekly and per-version sentiment statistics
//!
//! Reviews are keyed by the first day of the week containing their timestamp,
//! or by their mapped version. The output is sparse: weeks or versions
//! without reviews are not synthesized.

use crate::categorizer::{CategoryCounts, ComplaintCategorizer};
use crate::review::{Review, SentimentLabel};
use crate::utils::week_start_date;
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Label counts for one group of reviews
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    positive: usize,
    negative: usize,
    neutral: usize,
}

impl Tally {
    fn add(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }

    fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    fn negative_percent(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.negative as f64 / total as f64 * 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyBucket {
    pub week_start: NaiveDate,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub total: usize,
    pub negative_percent: f64,
}

impl WeeklyBucket {
    fn from_tally(week_start: NaiveDate, tally: Tally) -> Self {
        Self {
            week_start,
            positive: tally.positive,
            negative: tally.negative,
            neutral: tally.neutral,
            total: tally.total(),
            negative_percent: tally.negative_percent(),
        }
    }
}

/// One bucket per observed week, ascending by week
pub fn aggregate_weekly(reviews: &[Review], week_start: Weekday) -> Vec<WeeklyBucket> {
    let mut buckets: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
    for review in reviews {
        let week = week_start_date(review.timestamp.date(), week_start);
        buckets.entry(week).or_default().add(review.sentiment_or_neutral());
    }
    buckets
        .into_iter()
        .map(|(week, tally)| WeeklyBucket::from_tally(week, tally))
        .collect()
}

/// Sentiment counts for one mapped version; `version` is `None` for reviews
/// that were never mapped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionBucket {
    pub version: Option<String>,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub total: usize,
    pub negative_percent: f64,
}

/// One bucket per observed version in release order, unmapped reviews last.
///
/// Version resolution is monotonic in time, so ordering versions by their
/// earliest review reproduces the release order.
pub fn sentiment_by_version(reviews: &[Review]) -> Vec<VersionBucket> {
    let mut versions: HashMap<&str, (NaiveDateTime, Tally)> = HashMap::new();
    let mut unmapped = Tally::default();
    for review in reviews {
        let label = review.sentiment_or_neutral();
        match review.version.as_deref() {
            Some(version) => {
                let entry = versions.entry(version).or_insert((review.timestamp, Tally::default()));
                entry.0 = entry.0.min(review.timestamp);
                entry.1.add(label);
            }
            None => unmapped.add(label),
        }
    }

    let mut ordered: Vec<(&str, (NaiveDateTime, Tally))> = versions.into_iter().collect();
    ordered.sort_by(|a, b| (a.1 .0, a.0).cmp(&(b.1 .0, b.0)));

    let mut buckets: Vec<VersionBucket> = ordered
        .into_iter()
        .map(|(version, (_, tally))| VersionBucket::from_tally(Some(version.to_string()), tally))
        .collect();
    if unmapped.total() > 0 {
        buckets.push(VersionBucket::from_tally(None, unmapped));
    }
    buckets
}

impl VersionBucket {
    fn from_tally(version: Option<String>, tally: Tally) -> Self {
        Self {
            version,
            positive: tally.positive,
            negative: tally.negative,
            neutral: tally.neutral,
            total: tally.total(),
            negative_percent: tally.negative_percent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyCategoryCounts {
    pub week_start: NaiveDate,
    pub counts: CategoryCounts,
}

/// Complaint category counts per observed week
pub fn weekly_category_counts(
    reviews: &[Review],
    categorizer: &ComplaintCategorizer,
    week_start: Weekday,
) -> Vec<WeeklyCategoryCounts> {
    let mut weeks: BTreeMap<NaiveDate, CategoryCounts> = BTreeMap::new();
    for review in reviews {
        let week = week_start_date(review.timestamp.date(), week_start);
        let label = match review.category.as_deref() {
            Some(label) => label,
            None => categorizer.categorize(&review.clean_text),
        };
        weeks
            .entry(week)
            .or_insert_with(|| CategoryCounts::empty(categorizer))
            .add(label);
    }
    weeks
        .into_iter()
        .map(|(week_start, counts)| WeeklyCategoryCounts { week_start, counts })
        .collect()
}

/// Negative reviews of the week starting at `week`, in input order
pub fn negative_reviews_in_week(
    reviews: &[Review],
    week: NaiveDate,
    week_start: Weekday,
    limit: Option<usize>,
) -> Vec<&Review> {
    reviews
        .iter()
        .filter(|r| r.is_negative() && week_start_date(r.timestamp.date(), week_start) == week)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Negative reviews mapped to `version`, in input order
pub fn negative_reviews_for_version<'a>(reviews: &'a [Review], version: &str, limit: Option<usize>) -> Vec<&'a Review> {
    reviews
        .iter()
        .filter(|r| r.is_negative() && r.version.as_deref() == Some(version))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}
