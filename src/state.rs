//! Shared runtime state for the proxy.
//!
//! Both maps are drained at every flush interval, so entries only ever
//! cover the current reporting window.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use hyper::Client;
use serde::Serialize;

use crate::statistics::Histogram;

/// Plain HTTP client used for upstream requests.
pub type HttpClient = Client<hyper::client::HttpConnector>;

/// Latency histograms keyed by request path, plus the `Overall` key.
pub type HistogramMap = Arc<Mutex<HashMap<String, Histogram>>>;

/// Access log entries for the current reporting window.
pub type AccessLog = Arc<Mutex<Vec<AccessEntry>>>;

/// One proxied request, as recorded in the access log.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AccessEntry {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub uri: String,
    pub client_ip: String,
    pub micros: u64,
}
