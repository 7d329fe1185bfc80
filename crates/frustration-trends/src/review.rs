//! Review records as they move through the pipeline stages

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentiment label returned by the classifier collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "POSITIVE" | "POS" => Ok(SentimentLabel::Positive),
            "NEGATIVE" | "NEG" => Ok(SentimentLabel::Negative),
            "NEUTRAL" | "NEU" => Ok(SentimentLabel::Neutral),
            other => Err(anyhow::anyhow!("Unknown sentiment label: {}", other)),
        }
    }
}

/// One row of a raw export, before any filtering.
///
/// `columns` keeps every source column in source order so that checkpoints
/// written later remain a superset of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReview {
    pub row: usize,
    pub text: Option<String>,
    pub date: Option<String>,
    pub columns: Vec<(String, String)>,
}

/// A cleaned review, enriched progressively by later stages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub row: usize,
    pub app: String,
    pub timestamp: NaiveDateTime,
    pub text: String,
    pub clean_text: String,
    pub version: Option<String>,
    pub sentiment: Option<SentimentLabel>,
    pub category: Option<String>,
    #[serde(skip)]
    pub columns: Vec<(String, String)>,
}

impl Review {
    /// Build a review directly, mostly useful for tests and resumed checkpoints
    pub fn new(app: &str, timestamp: NaiveDateTime, text: &str, clean_text: &str) -> Self {
        Self {
            row: 0,
            app: app.to_string(),
            timestamp,
            text: text.to_string(),
            clean_text: clean_text.to_string(),
            version: None,
            sentiment: None,
            category: None,
            columns: Vec::new(),
        }
    }

    pub fn with_sentiment(mut self, label: SentimentLabel) -> Self {
        self.sentiment = Some(label);
        self
    }

    /// Label used for aggregation; unlabeled reviews count as neutral
    pub fn sentiment_or_neutral(&self) -> SentimentLabel {
        self.sentiment.unwrap_or(SentimentLabel::Neutral)
    }

    pub fn is_negative(&self) -> bool {
        self.sentiment == Some(SentimentLabel::Negative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip_strings() {
        assert_eq!("negative".parse::<SentimentLabel>().unwrap(), SentimentLabel::Negative);
        assert_eq!(" POSITIVE ".parse::<SentimentLabel>().unwrap(), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::Neutral.to_string(), "NEUTRAL");
        assert!("LABEL_0".parse::<SentimentLabel>().is_err());
    }

    #[test]
    fn test_label_serializes_uppercase() {
        let json = serde_json::to_string(&SentimentLabel::Negative).unwrap();
        assert_eq!(json, "\"NEGATIVE\"");
    }

    #[test]
    fn test_unlabeled_counts_as_neutral() {
        let ts = chrono::NaiveDate::from_ymd_opt(2023, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let review = Review::new("Zoom", ts, "raw", "raw");
        assert_eq!(review.sentiment_or_neutral(), SentimentLabel::Neutral);
        assert!(!review.is_negative());
        assert!(review.with_sentiment(SentimentLabel::Negative).is_negative());
    }
}
