//! Sentiment labeling against an external classifier
//!
//! The classifier is a capability: the pipeline only needs one label per
//! text. Every per-item failure degrades to NEUTRAL so a flaky model never
//! aborts a run.

use crate::metrics;
use crate::review::{Review, SentimentLabel};
use crate::utils::TextUtils;
use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

/// Texts shorter than this (after trimming) skip the classifier
pub const MIN_CLASSIFIABLE_CHARS: usize = 5;
pub const DEFAULT_MAX_CHARS: usize = 512;

pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<SentimentLabel>;
}

/// Label one text, applying the short-text guard, truncation and the
/// failure-to-NEUTRAL policy
pub fn predict_sentiment(classifier: &dyn SentimentClassifier, text: &str, max_chars: usize) -> SentimentLabel {
    if text.trim().chars().count() < MIN_CLASSIFIABLE_CHARS {
        return SentimentLabel::Neutral;
    }
    let input = TextUtils::truncate_chars(text, max_chars);
    match classifier.classify(input) {
        Ok(label) => label,
        Err(e) => {
            warn!("Sentiment classification failed, using NEUTRAL: {:#}", e);
            metrics::inc_classifier_fallback();
            SentimentLabel::Neutral
        }
    }
}

/// Label every review from its normalized text
pub fn label_sentiments(
    mut reviews: Vec<Review>,
    classifier: &dyn SentimentClassifier,
    max_chars: usize,
) -> Vec<Review> {
    for review in &mut reviews {
        review.sentiment = Some(predict_sentiment(classifier, &review.clean_text, max_chars));
    }
    let negative = reviews.iter().filter(|r| r.is_negative()).count();
    info!("Classified {} reviews ({} negative)", reviews.len(), negative);
    reviews
}

lazy_static! {
    static ref NEGATIVE_WORDS: HashSet<&'static str> = [
        "bad", "worst", "terrible", "awful", "horrible", "useless", "hate",
        "crash", "crashes", "crashing", "crashed", "bug", "buggy", "broken",
        "slow", "laggy", "lag", "freeze", "freezes", "frozen", "error",
        "errors", "fail", "fails", "failed", "annoying", "disappointed",
        "disappointing", "waste", "poor", "unusable", "garbage", "stuck",
        "problem", "problems", "issue", "issues", "cant", "doesnt", "wont",
        "uninstall", "uninstalled", "glitch", "glitchy", "drains", "ads",
    ]
    .into_iter()
    .collect();

    static ref POSITIVE_WORDS: HashSet<&'static str> = [
        "good", "great", "excellent", "amazing", "awesome", "love", "loved",
        "best", "nice", "perfect", "easy", "smooth", "fast", "helpful",
        "reliable", "fantastic", "wonderful", "recommend", "useful", "works",
        "thanks", "thank", "happy", "clear", "stable", "intuitive",
    ]
    .into_iter()
    .collect();
}

/// Offline word-list classifier; ties are NEUTRAL
#[derive(Debug, Clone, Default)]
pub struct LexiconClassifier;

impl SentimentClassifier for LexiconClassifier {
    fn classify(&self, text: &str) -> Result<SentimentLabel> {
        let lowered = text.to_lowercase();
        let (mut positive, mut negative) = (0usize, 0usize);
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            if NEGATIVE_WORDS.contains(token) {
                negative += 1;
            } else if POSITIVE_WORDS.contains(token) {
                positive += 1;
            }
        }

        Ok(match negative.cmp(&positive) {
            std::cmp::Ordering::Greater => SentimentLabel::Negative,
            std::cmp::Ordering::Less => SentimentLabel::Positive,
            std::cmp::Ordering::Equal => SentimentLabel::Neutral,
        })
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// Classifier served over HTTP by a text-classification inference endpoint.
///
/// Sends `{"inputs": text}` and expects `[{"label", "score"}]`, optionally
/// nested one level deeper; the highest-scoring label wins.
pub struct HttpClassifier {
    endpoint: String,
    http_client: reqwest::blocking::Client,
}

impl HttpClassifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build classifier HTTP client")?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Pick the best label out of an inference response body
    pub fn parse_response(body: &Value) -> Result<SentimentLabel> {
        let candidates = match body {
            Value::Array(items) => match items.first() {
                Some(Value::Array(inner)) => inner.as_slice(),
                _ => items.as_slice(),
            },
            Value::Object(_) => std::slice::from_ref(body),
            other => return Err(anyhow!("Unexpected classifier response: {}", other)),
        };

        let best = candidates
            .iter()
            .filter_map(|c| {
                let label = c.get("label")?.as_str()?;
                let score = c.get("score").and_then(Value::as_f64).unwrap_or(0.0);
                Some((label, score))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| anyhow!("Classifier response contained no labels"))?;

        best.0.parse()
    }
}

impl SentimentClassifier for HttpClassifier {
    fn classify(&self, text: &str) -> Result<SentimentLabel> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&InferenceRequest { inputs: text })
            .send()
            .with_context(|| format!("Classifier request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Classifier returned HTTP {}", status));
        }

        let body: Value = response.json().context("Classifier returned invalid JSON")?;
        Self::parse_response(&body)
    }
}
