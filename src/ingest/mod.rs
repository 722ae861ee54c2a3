// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::PipelineError;
use crate::ingest::types::{RawSignal, SignalSource, SourceKind};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on scrape).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "signals_collected_total",
            "Raw signals collected, by source kind."
        );
        describe_counter!(
            "source_errors_total",
            "Source collection failures and timeouts."
        );
    });
}

/// Grouping key for a keyword: trimmed and lowercased.
pub fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

/// Output of one collection pass.
#[derive(Debug, Default)]
pub struct Collection {
    pub by_source: BTreeMap<SourceKind, Vec<RawSignal>>,
    /// One `SourceUnavailable` per failed source.
    pub failures: Vec<PipelineError>,
}

impl Collection {
    pub fn total_signals(&self) -> usize {
        self.by_source.values().map(Vec::len).sum()
    }

    pub fn counts(&self) -> BTreeMap<SourceKind, usize> {
        self.by_source
            .iter()
            .map(|(k, v)| (*k, v.len()))
            .collect()
    }
}

/// Collect from every source concurrently, each bounded by `timeout`.
///
/// A failing or slow source contributes nothing and is reported in
/// `failures`; it never blocks the others. Results are merged in source order,
/// so two sources of the same kind keep their relative order.
pub async fn collect_all(sources: &[Box<dyn SignalSource>], timeout: Duration) -> Collection {
    ensure_metrics_described();

    let fetches = sources.iter().map(|s| async move {
        let res = tokio::time::timeout(timeout, s.collect()).await;
        (s, res)
    });
    let results = futures::future::join_all(fetches).await;

    let mut out = Collection::default();
    for (source, res) in results {
        let reason = match res {
            Ok(Ok(signals)) => {
                let kind = source.kind();
                counter!("signals_collected_total", "source" => kind.as_str())
                    .increment(signals.len() as u64);
                tracing::info!(
                    target: "ingest",
                    source = source.name(),
                    signals = signals.len(),
                    "source collected"
                );
                out.by_source.entry(kind).or_default().extend(signals);
                continue;
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(_) => format!("timed out after {}s", timeout.as_secs()),
        };
        tracing::warn!(target: "ingest", source = source.name(), %reason, "source unavailable");
        counter!("source_errors_total", "source" => source.kind().as_str()).increment(1);
        out.failures.push(PipelineError::SourceUnavailable {
            source_name: source.name().to_string(),
            reason,
        });
    }
    out
}
