
use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, Registry, TextEncoder};
use lazy_static::lazy_static;
use std::sync::OnceLock;
lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
}
static INGESTED: OnceLock<IntCounterVec> = OnceLock::new();
static RETAINED: OnceLock<IntCounterVec> = OnceLock::new();
static DROPPED: OnceLock<IntCounterVec> = OnceLock::new();
static CLASSIFIER_FALLBACKS: OnceLock<IntCounter> = OnceLock::new();
pub fn init_metrics() {

    let ingested = INGESTED.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("reviews_ingested_total", "Raw reviews handed to the cleaning stage"),
            &["app"]
        ).expect("valid metric definition")
    });

    let retained = RETAINED.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("reviews_retained_total", "Reviews surviving the cleaning stage"),
            &["app"]
        ).expect("valid metric definition")
    });

    let dropped = DROPPED.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("reviews_dropped_total", "Reviews dropped by the cleaning stage per reason"),
            &["app", "reason"]
        ).expect("valid metric definition")
    });

    let fallbacks = CLASSIFIER_FALLBACKS.get_or_init(|| {
        IntCounter::new(
            "classifier_fallbacks_total",
            "Classifier failures degraded to NEUTRAL"
        ).expect("valid metric definition")
    });
    REGISTRY.register(Box::new(ingested.clone())).ok();
    REGISTRY.register(Box::new(retained.clone())).ok();
    REGISTRY.register(Box::new(dropped.clone())).ok();
    REGISTRY.register(Box::new(fallbacks.clone())).ok();
}
pub fn inc_ingested(app: &str, count: usize) {
    if let Some(counter) = INGESTED.get() {
        counter.with_label_values(&[app]).inc_by(count as u64);
    }
}
pub fn inc_retained(app: &str, count: usize) {
    if let Some(counter) = RETAINED.get() {
        counter.with_label_values(&[app]).inc_by(count as u64);
    }
}
pub fn inc_dropped(app: &str, reason: &str, count: usize) {
    if count == 0 {
        return;
    }
    if let Some(counter) = DROPPED.get() {
        counter.with_label_values(&[app, reason]).inc_by(count as u64);
    }
}
pub fn inc_classifier_fallback() {
    if let Some(counter) = CLASSIFIER_FALLBACKS.get() {
        counter.inc();
    }
}
/// Text exposition of every registered counter
pub fn render() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
