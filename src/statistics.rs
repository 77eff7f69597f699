//! Response-time histograms and their table rendering.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::state::HistogramMap;

/// Histogram key covering every request regardless of path.
pub const OVERALL: &str = "Overall";

/// Upper bucket bounds in milliseconds. Anything slower lands in the
/// open-ended last bucket.
const BUCKET_BOUNDS_MS: [u128; 5] = [10, 100, 250, 500, 1000];

/// Column labels matching `BUCKET_BOUNDS_MS` plus the open-ended bucket.
const BUCKET_LABELS: [&str; 6] = [
    "0-10ms",
    "11-100ms",
    "101-250ms",
    "251-500ms",
    "501-1000ms",
    "1000ms+",
];

/// Latency histogram with fixed millisecond buckets.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct Histogram {
    pub buckets: [u64; 6],
    pub total_requests: u64,
    pub last_request_time: Option<DateTime<Utc>>,
}

impl Histogram {
    /// Record one request's duration.
    pub fn record(&mut self, duration: Duration, timestamp: DateTime<Utc>) {
        let ms = duration.as_millis();
        let idx = BUCKET_BOUNDS_MS
            .iter()
            .position(|bound| ms <= *bound)
            .unwrap_or(BUCKET_BOUNDS_MS.len());

        self.buckets[idx] += 1;
        self.total_requests += 1;
        self.last_request_time = Some(timestamp);
    }
}

/// Record a request under both the `Overall` key and its own path.
pub fn record(histograms: &HistogramMap, path: &str, duration: Duration, timestamp: DateTime<Utc>) {
    let mut map = histograms.lock().unwrap();
    map.entry(OVERALL.to_string())
        .or_default()
        .record(duration, timestamp);
    map.entry(path.to_string())
        .or_default()
        .record(duration, timestamp);
}

/// Render all histograms as a table, `Overall` row first and the
/// remaining endpoints in lexicographic order.
pub fn render_table(histograms: &HashMap<String, Histogram>) -> String {
    let mut builder = Builder::default();

    let mut header = vec!["Endpoint"];
    header.extend(BUCKET_LABELS);
    header.extend(["Total", "Last Request"]);
    builder.push_record(header);

    // An idle window still gets a zeroed Overall row.
    let default_hist = Histogram::default();
    let overall = histograms.get(OVERALL).unwrap_or(&default_hist);
    push_row(&mut builder, OVERALL, overall);

    let mut endpoints: Vec<&String> = histograms.keys().filter(|k| *k != OVERALL).collect();
    endpoints.sort();
    for endpoint in endpoints {
        push_row(&mut builder, endpoint, &histograms[endpoint]);
    }

    let mut table = builder.build();
    table.with(Style::sharp());
    table.to_string()
}

fn push_row(builder: &mut Builder, endpoint: &str, hist: &Histogram) {
    let last_request = hist
        .last_request_time
        .map(|t| {
            DateTime::<Local>::from(t)
                .format("%Y-%m-%d %H:%M:%S %Z")
                .to_string()
        })
        .unwrap_or_else(|| "N/A".to_string());

    let mut row = vec![endpoint.to_string()];
    row.extend(hist.buckets.iter().map(|count| count.to_string()));
    row.push(hist.total_requests.to_string());
    row.push(last_request);
    builder.push_record(row);
}
