//! Release timelines and review-to-version mapping

use crate::review::Review;
use crate::utils::parse_timestamp;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// One release of an app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: String,
    pub released_at: NaiveDateTime,
}

/// Releases of one app, always sorted ascending by release time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionTimeline {
    releases: Vec<Release>,
}

impl VersionTimeline {
    /// Sorts the releases; equal release times keep their input order
    pub fn new(mut releases: Vec<Release>) -> Self {
        releases.sort_by_key(|r| r.released_at);
        Self { releases }
    }

    /// Build from `version -> ISO-8601 date` pairs, skipping unparseable dates
    pub fn from_dates<'a, I>(app: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let releases = entries
            .into_iter()
            .filter_map(|(version, date)| match parse_timestamp(date) {
                Some(released_at) => Some(Release {
                    version: version.to_string(),
                    released_at,
                }),
                None => {
                    warn!("Skipping {} {}: invalid release date '{}'", app, version, date);
                    None
                }
            })
            .collect();
        Self::new(releases)
    }

    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Latest release at or before `timestamp`.
    ///
    /// Reviews older than every release fall back to the earliest version.
    /// Among releases sharing a timestamp the last one in timeline order wins.
    /// `None` only when the timeline is empty.
    pub fn resolve(&self, timestamp: NaiveDateTime) -> Option<&str> {
        let first = self.releases.first()?;
        let qualifying = self.releases.partition_point(|r| r.released_at <= timestamp);
        let release = match qualifying {
            0 => first,
            n => &self.releases[n - 1],
        };
        Some(release.version.as_str())
    }
}

/// Free-function form of [`VersionTimeline::resolve`]
pub fn resolve_version(timestamp: NaiveDateTime, timeline: &VersionTimeline) -> Option<&str> {
    timeline.resolve(timestamp)
}

/// Raw `{app: {version: date}}` document; `Map` keeps version keys in file order
type VersionDocument = BTreeMap<String, Map<String, Value>>;

/// Release timelines keyed by app name
#[derive(Debug, Clone, Default)]
pub struct VersionConfig {
    timelines: HashMap<String, VersionTimeline>,
}

impl VersionConfig {
    /// Parse `{app: {version: "date"}}`; versions keep their document order
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let document: VersionDocument =
            serde_json::from_str(raw).context("Version config must map app -> {version: date}")?;
        Self::from_document(document)
    }

    fn from_document(document: VersionDocument) -> Result<Self> {
        let mut timelines = HashMap::with_capacity(document.len());
        for (app, versions) in &document {
            let mut entries = Vec::with_capacity(versions.len());
            for (version, date) in versions {
                let date = date
                    .as_str()
                    .ok_or_else(|| anyhow!("Release date of {} {} must be a string, got {}", app, version, date))?;
                entries.push((version.as_str(), date));
            }
            timelines.insert(app.clone(), VersionTimeline::from_dates(app, entries));
        }
        Ok(Self { timelines })
    }

    pub fn insert(&mut self, app: &str, timeline: VersionTimeline) {
        self.timelines.insert(app.to_string(), timeline);
    }

    pub fn timeline(&self, app: &str) -> Option<&VersionTimeline> {
        self.timelines.get(app)
    }

    pub fn apps(&self) -> impl Iterator<Item = &str> {
        self.timelines.keys().map(String::as_str)
    }
}

/// Load the version release document from disk
pub fn load_version_config<P: AsRef<Path>>(path: P) -> Result<VersionConfig> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open version config: {}", path.display()))?;
    let document: VersionDocument = serde_json::from_reader(file)
        .with_context(|| format!("Malformed version config: {}", path.display()))?;
    let config = VersionConfig::from_document(document)
        .with_context(|| format!("Malformed version config: {}", path.display()))?;
    info!("Loaded version timelines for {} apps", config.timelines.len());
    Ok(config)
}

/// Attach the mapped version label to every review of `app`.
///
/// A missing or empty timeline leaves the reviews unlabeled.
pub fn assign_versions(mut reviews: Vec<Review>, app: &str, config: &VersionConfig) -> Vec<Review> {
    let timeline = match config.timeline(app) {
        Some(timeline) if !timeline.is_empty() => timeline,
        _ => {
            warn!("No version data found for {}", app);
            return reviews;
        }
    };

    for review in &mut reviews {
        review.version = timeline.resolve(review.timestamp).map(String::from);
    }
    info!("Mapped {} {} reviews onto {} releases", reviews.len(), app, timeline.len());
    reviews
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ts(value: &str) -> NaiveDateTime {
        parse_timestamp(value).unwrap()
    }

    fn timeline(entries: &[(&str, &str)]) -> VersionTimeline {
        VersionTimeline::from_dates("Test", entries.iter().copied())
    }

    #[test]
    fn test_resolves_to_preceding_release() {
        let t = timeline(&[("1.0", "2023-01-01"), ("2.0", "2023-03-01")]);
        assert_eq!(t.resolve(ts("2023-02-01")), Some("1.0"));
        assert_eq!(t.resolve(ts("2023-03-01")), Some("2.0"));
        assert_eq!(t.resolve(ts("2024-01-01")), Some("2.0"));
    }

    #[test]
    fn test_unsorted_config_is_sorted() {
        let t = timeline(&[("3.0", "2023-05-01"), ("1.0", "2023-01-01"), ("2.0", "2023-03-01")]);
        let versions: Vec<&str> = t.releases().iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["1.0", "2.0", "3.0"]);
        assert_eq!(t.resolve(ts("2023-04-15")), Some("2.0"));
    }

    #[test]
    fn test_before_first_release_falls_back_to_earliest() {
        let t = timeline(&[("2.0", "2023-03-01"), ("1.0", "2023-01-01")]);
        assert_eq!(t.resolve(ts("2022-06-01")), Some("1.0"));
    }

    #[test]
    fn test_empty_timeline_has_no_mapping() {
        let t = VersionTimeline::default();
        assert_eq!(resolve_version(ts("2023-01-01"), &t), None);
    }

    #[test]
    fn test_tie_goes_to_later_entry() {
        let t = VersionTimeline::new(vec![
            Release { version: "1.0".into(), released_at: ts("2023-01-01") },
            Release { version: "1.0.1".into(), released_at: ts("2023-01-01") },
        ]);
        assert_eq!(t.resolve(ts("2023-01-05")), Some("1.0.1"));
    }

    #[test]
    fn test_same_day_releases_resolve_to_last_listed() {
        let config = VersionConfig::from_json_str(
            r#"{"Zoom": {"5.9.1": "2023-01-01", "5.10.0": "2023-01-01"}}"#,
        )
        .unwrap();
        let timeline = config.timeline("Zoom").unwrap();
        assert_eq!(timeline.resolve(ts("2023-01-05")), Some("5.10.0"));

        let reversed = VersionConfig::from_json_str(
            r#"{"Zoom": {"5.10.0": "2023-01-01", "5.9.1": "2023-01-01"}}"#,
        )
        .unwrap();
        assert_eq!(reversed.timeline("Zoom").unwrap().resolve(ts("2023-01-05")), Some("5.9.1"));
    }

    #[test]
    fn test_invalid_release_dates_are_skipped() {
        let t = timeline(&[("1.0", "someday"), ("2.0", "2023-03-01")]);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_config_parsing_and_missing_app() {
        let config = VersionConfig::from_json_str(
            r#"{"Zoom": {"5.13": "2023-01-10", "5.12": "2022-11-01"}, "Webex": {}}"#,
        )
        .unwrap();
        assert_eq!(config.timeline("Zoom").unwrap().len(), 2);
        assert!(config.timeline("Firefox").is_none());

        let ts0 = ts("2023-02-01");
        let reviews = vec![Review::new("Webex", ts0, "text", "text")];
        let mapped = assign_versions(reviews, "Webex", &config);
        assert!(mapped[0].version.is_none());

        let reviews = vec![Review::new("Zoom", ts0, "text", "text")];
        let mapped = assign_versions(reviews, "Zoom", &config);
        assert_eq!(mapped[0].version.as_deref(), Some("5.13"));
    }

    #[test]
    fn test_malformed_config_is_error() {
        assert!(VersionConfig::from_json_str(r#"["not", "a", "map"]"#).is_err());
        assert!(VersionConfig::from_json_str(r#"{"Zoom": {"5.12": 20230101}}"#).is_err());
        assert!(load_version_config("/definitely/not/here.json").is_err());
    }

    proptest! {
        #[test]
        fn prop_resolve_matches_linear_scan(
            release_days in proptest::collection::vec(0i64..400, 1..12),
            review_day in -30i64..430,
        ) {
            let base = ts("2023-01-01");
            let releases: Vec<Release> = release_days
                .iter()
                .enumerate()
                .map(|(i, d)| Release {
                    version: format!("v{}", i),
                    released_at: base + chrono::Duration::days(*d),
                })
                .collect();
            let t = VersionTimeline::new(releases);
            let review = base + chrono::Duration::days(review_day);

            let expected = t
                .releases()
                .iter()
                .rev()
                .find(|r| r.released_at <= review)
                .unwrap_or(&t.releases()[0]);
            prop_assert_eq!(t.resolve(review), Some(expected.version.as_str()));
        }
    }
}
