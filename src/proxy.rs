//! HTTP forwarding with per-request accounting.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use hyper::{Body, Request, Response, StatusCode, Uri};
use tracing::{info, warn};

use crate::error::Error;
use crate::state::{AccessEntry, AccessLog, HistogramMap, HttpClient};
use crate::statistics;

/// Upstream target requests are forwarded to.
#[derive(Debug, Clone)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

/// Rebuild the request URI against the upstream target, keeping the
/// original path and query.
pub fn target_uri(target: &Target, original: &Uri) -> Result<Uri, Error> {
    let path_and_query = original
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("");

    let uri = format!("http://{}:{}{}", target.host, target.port, path_and_query).parse::<Uri>()?;
    Ok(uri)
}

/// Forward one request to the upstream target, recording it in the
/// access log and latency histograms on the way back.
///
/// Blacklisted clients are refused before any forwarding happens and do
/// not show up in traffic state.
pub async fn forward(
    client: HttpClient,
    req: Request<Body>,
    client_addr: SocketAddr,
    target: Target,
    blacklist: Arc<HashSet<IpAddr>>,
    histograms: HistogramMap,
    access_log: AccessLog,
) -> Result<Response<Body>, hyper::Error> {
    let timestamp = Utc::now();

    if blacklist.contains(&client_addr.ip()) {
        warn!(client = %client_addr.ip(), "rejected blacklisted client");
        return Ok(status_response(StatusCode::FORBIDDEN, "Access denied"));
    }

    let method = req.method().clone();
    let uri = req.uri().clone();
    let headers = req.headers().clone();

    let upstream = match target_uri(&target, &uri) {
        Ok(upstream) => upstream,
        Err(e) => {
            warn!(uri = %uri, error = %e, "failed to build upstream URI");
            return Ok(status_response(StatusCode::BAD_GATEWAY, "Bad gateway"));
        }
    };

    let mut proxied = match Request::builder()
        .method(method.clone())
        .uri(upstream)
        .body(req.into_body())
    {
        Ok(proxied) => proxied,
        Err(e) => {
            warn!(uri = %uri, error = %e, "failed to build upstream request");
            return Ok(status_response(StatusCode::BAD_GATEWAY, "Bad gateway"));
        }
    };
    *proxied.headers_mut() = headers;

    let start = Instant::now();
    let response = client.request(proxied).await?;
    let elapsed = start.elapsed();

    info!(
        method = %method,
        uri = %uri,
        client = %client_addr,
        elapsed = ?elapsed,
        "proxied request"
    );

    access_log.lock().unwrap().push(AccessEntry {
        timestamp,
        method: method.to_string(),
        uri: uri.to_string(),
        client_ip: client_addr.ip().to_string(),
        micros: elapsed.as_micros() as u64,
    });

    statistics::record(&histograms, uri.path(), elapsed, timestamp);

    Ok(response)
}

fn status_response(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
}
