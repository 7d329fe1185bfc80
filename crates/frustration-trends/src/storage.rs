//! CSV ingest of raw review exports and per-stage checkpoints
//!
//! Each checkpoint keeps the source columns in source order and appends the
//! fields added so far, so any stage can be resumed from the previous file.

use crate::config::ColumnMapping;
use crate::review::{RawReview, Review, SentimentLabel};
use crate::utils::{format_timestamp, parse_timestamp};
use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord, Writer};
use std::fs::File;
use std::path::Path;
use tracing::info;

pub const CLEAN_TEXT_COLUMN: &str = "clean_review";
pub const APP_COLUMN: &str = "app";
pub const VERSION_COLUMN: &str = "app_version_mapped";
pub const SENTIMENT_COLUMN: &str = "sentiment";

/// Pipeline checkpoint written after each stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Cleaned,
    Mapped,
    Final,
}

impl Stage {
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Stage::Cleaned => "cleaned",
            Stage::Mapped => "mapped",
            Stage::Final => "final",
        }
    }

    fn derived_columns(&self) -> &'static [&'static str] {
        match self {
            Stage::Cleaned => &[CLEAN_TEXT_COLUMN, APP_COLUMN],
            Stage::Mapped => &[CLEAN_TEXT_COLUMN, APP_COLUMN, VERSION_COLUMN],
            Stage::Final => &[CLEAN_TEXT_COLUMN, APP_COLUMN, VERSION_COLUMN, SENTIMENT_COLUMN],
        }
    }
}

/// Rows read from one CSV file, with the source columns they came from.
///
/// `source_headers` excludes the columns added by pipeline stages, so it can
/// be handed to [`write_checkpoint`] even when `rows` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewTable<R> {
    pub source_headers: Vec<String>,
    pub rows: Vec<R>,
}

fn source_headers(headers: &StringRecord) -> Vec<String> {
    let derived = Stage::Final.derived_columns();
    headers
        .iter()
        .filter(|name| !derived.contains(name))
        .map(String::from)
        .collect()
}

fn column_index(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| anyhow!("Column '{}' not found in {}", name, path.display()))
}

fn non_empty(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

fn row_columns(headers: &StringRecord, record: &StringRecord) -> Vec<(String, String)> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.to_string(), record.get(idx).unwrap_or_default().to_string()))
        .collect()
}

/// Load a raw review export.
///
/// Empty text or date cells become `None` and are left for the cleaning stage
/// to filter. A missing file or missing text/date column is an error.
pub fn read_raw_reviews<P: AsRef<Path>>(path: P, columns: &ColumnMapping) -> Result<ReviewTable<RawReview>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open review export: {}", path.display()))?;

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();
    let text_idx = column_index(&headers, &columns.text, path)?;
    let date_idx = column_index(&headers, &columns.date, path)?;

    let mut reviews = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse row {} of {}", row, path.display()))?;
        reviews.push(RawReview {
            row,
            text: non_empty(&record, text_idx),
            date: non_empty(&record, date_idx),
            columns: row_columns(&headers, &record),
        });
    }

    info!("Loaded {} raw reviews from {}", reviews.len(), path.display());
    Ok(ReviewTable {
        source_headers: source_headers(&headers),
        rows: reviews,
    })
}

/// Write a stage checkpoint.
///
/// `source_headers` is the column row of the file the reviews came from; when
/// empty (reviews built in memory) only the text and date columns are written.
pub fn write_checkpoint<P: AsRef<Path>>(
    path: P,
    source_headers: &[String],
    reviews: &[Review],
    columns: &ColumnMapping,
    stage: Stage,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let derived = stage.derived_columns();
    let all_derived = Stage::Final.derived_columns();
    let source_headers: Vec<&str> = if source_headers.is_empty() {
        vec![columns.text.as_str(), columns.date.as_str()]
    } else {
        source_headers
            .iter()
            .map(String::as_str)
            .filter(|name| !all_derived.contains(name))
            .collect()
    };

    let mut writer = Writer::from_path(path)
        .with_context(|| format!("Failed to create checkpoint: {}", path.display()))?;

    let mut header = source_headers.clone();
    header.extend_from_slice(derived);
    writer.write_record(&header)?;

    for review in reviews {
        let mut record: Vec<String> = source_headers
            .iter()
            .map(|name| source_value(review, name, columns))
            .collect();
        record.push(review.clean_text.clone());
        record.push(review.app.clone());
        if matches!(stage, Stage::Mapped | Stage::Final) {
            record.push(review.version.clone().unwrap_or_default());
        }
        if stage == Stage::Final {
            record.push(review.sentiment.map(|s| s.to_string()).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!("Wrote {} reviews to {}", reviews.len(), path.display());
    Ok(())
}

fn source_value(review: &Review, name: &str, columns: &ColumnMapping) -> String {
    if name == columns.date {
        return format_timestamp(&review.timestamp);
    }
    if name == columns.text {
        return review.text.clone();
    }
    review
        .columns
        .iter()
        .find(|(column, _)| column == name)
        .map(|(_, value)| value.clone())
        .unwrap_or_default()
}

/// Reload reviews from a checkpoint written by [`write_checkpoint`].
///
/// Columns that a stage has not produced yet load as unset.
pub fn read_checkpoint<P: AsRef<Path>>(path: P, columns: &ColumnMapping) -> Result<ReviewTable<Review>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open checkpoint: {}", path.display()))?;

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();
    let text_idx = column_index(&headers, &columns.text, path)?;
    let date_idx = column_index(&headers, &columns.date, path)?;
    let clean_idx = column_index(&headers, CLEAN_TEXT_COLUMN, path)?;
    let app_idx = column_index(&headers, APP_COLUMN, path)?;
    let version_idx = headers.iter().position(|h| h == VERSION_COLUMN);
    let sentiment_idx = headers.iter().position(|h| h == SENTIMENT_COLUMN);

    let mut reviews = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse row {} of {}", row, path.display()))?;
        let raw_date = record.get(date_idx).unwrap_or_default();
        let timestamp = parse_timestamp(raw_date)
            .ok_or_else(|| anyhow!("Invalid timestamp '{}' in row {} of {}", raw_date, row, path.display()))?;
        let sentiment = match sentiment_idx.and_then(|idx| non_empty(&record, idx)) {
            Some(label) => Some(label.parse::<SentimentLabel>().with_context(|| format!("Row {} of {}", row, path.display()))?),
            None => None,
        };

        reviews.push(Review {
            row,
            app: record.get(app_idx).unwrap_or_default().to_string(),
            timestamp,
            text: record.get(text_idx).unwrap_or_default().to_string(),
            clean_text: record.get(clean_idx).unwrap_or_default().to_string(),
            version: version_idx.and_then(|idx| non_empty(&record, idx)),
            sentiment,
            category: None,
            columns: row_columns(&headers, &record),
        });
    }

    info!("Loaded {} reviews from checkpoint {}", reviews.len(), path.display());
    Ok(ReviewTable {
        source_headers: source_headers(&headers),
        rows: reviews,
    })
}
