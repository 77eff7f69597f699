//! Upload of traffic snapshots to the monitoring service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::MonitoringConfig;
use crate::error::Error;
use crate::state::AccessEntry;
use crate::statistics::Histogram;

/// Everything observed during one reporting window.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub captured_at: DateTime<Utc>,
    pub histograms: HashMap<String, Histogram>,
    pub access_log: Vec<AccessEntry>,
}

/// Client for the monitoring server's ingest endpoint.
pub struct MonitoringClient {
    http: reqwest::Client,
    server: String,
    key: String,
}

impl MonitoringClient {
    pub fn new(config: &MonitoringConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            server: config.server.clone(),
            key: config.key.clone(),
        }
    }

    /// POST a snapshot as JSON. Non-2xx responses are errors.
    pub async fn upload(&self, snapshot: &Snapshot) -> Result<(), Error> {
        let url = ingest_url(&self.server);

        let mut request = self.http.post(&url).json(snapshot);
        if !self.key.is_empty() {
            request = request.bearer_auth(&self.key);
        }

        let response = request.send().await?;
        response.error_for_status()?;

        debug!(url = %url, "uploaded traffic snapshot");
        Ok(())
    }
}

fn ingest_url(server: &str) -> String {
    format!("{}/ingest", server.trim_end_matches('/'))
}
