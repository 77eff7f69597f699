//! Run the observation proxy.

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Client, Server};
use tokio::time;
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Error;
use crate::monitoring::{MonitoringClient, Snapshot};
use crate::proxy::{self, Target};
use crate::state::{AccessLog, HistogramMap};
use crate::statistics;

/// Start the proxy server and the periodic flush task.
pub async fn run(args: RunArgs) -> Result<(), Error> {
    let config = resolve_config(&args)?;

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    let client = Client::new();

    let histograms: HistogramMap = Arc::new(Mutex::new(HashMap::new()));
    let access_log: AccessLog = Arc::new(Mutex::new(Vec::new()));
    let blacklist: Arc<HashSet<IpAddr>> = Arc::new(config.blacklist.iter().copied().collect());

    spawn_flush_task(&config, Arc::clone(&histograms), Arc::clone(&access_log));

    let target = Target {
        host: config.target_host.clone(),
        port: config.target_port,
    };

    let make_svc = make_service_fn(move |conn: &AddrStream| {
        let client = client.clone();
        let client_addr = conn.remote_addr();
        let histograms = Arc::clone(&histograms);
        let access_log = Arc::clone(&access_log);
        let target = target.clone();
        let blacklist = Arc::clone(&blacklist);

        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                proxy::forward(
                    client.clone(),
                    req,
                    client_addr,
                    target.clone(),
                    Arc::clone(&blacklist),
                    Arc::clone(&histograms),
                    Arc::clone(&access_log),
                )
            }))
        }
    });

    info!(
        listen = %addr,
        target_host = %config.target_host,
        target_port = config.target_port,
        "proxy started"
    );
    println!("Proxy server running on http://{}", addr);
    println!(
        "Forwarding traffic to http://{}:{}",
        config.target_host, config.target_port
    );

    Server::bind(&addr).serve(make_svc).await?;
    Ok(())
}

/// Merge CLI flags over the file (or default) configuration.
pub fn resolve_config(args: &RunArgs) -> Result<Config, Error> {
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(port) = args.proxy {
        config.listen_port = port;
    }
    if let Some(interval) = args.interval {
        config.interval_secs = interval;
    }
    if let Some(host) = &args.host {
        config.target_host = host.clone();
    }
    if let Some(port) = args.port {
        config.target_port = port;
    }
    if !args.blacklist.is_empty() {
        config.blacklist = args.blacklist.clone();
    }
    if args.monitoring {
        config.monitoring.enabled = true;
    }
    if let Some(server) = &args.server {
        config.monitoring.server = server.clone();
    }
    if let Some(key) = &args.key {
        config.monitoring.key = key.clone();
    }

    Ok(config)
}

/// Spawn the task that prints histograms and uploads snapshots at every
/// interval. The first window is left to fill before anything is
/// reported.
fn spawn_flush_task(config: &Config, histograms: HistogramMap, access_log: AccessLog) {
    let interval_secs = config.interval_secs;
    let uploader = config
        .monitoring
        .enabled
        .then(|| MonitoringClient::new(&config.monitoring));

    tokio::spawn(async move {
        time::sleep(Duration::from_secs(interval_secs)).await;

        let mut interval = time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;

            let snapshot = take_snapshot(&histograms, &access_log);
            println!("\nResponse time histogram:");
            println!("{}", statistics::render_table(&snapshot.histograms));

            if let Some(client) = &uploader {
                if let Err(e) = client.upload(&snapshot).await {
                    error!(error = %e, "failed to upload snapshot");
                }
            }
        }
    });
}

/// Drain the shared state into an owned snapshot, resetting the window.
fn take_snapshot(histograms: &HistogramMap, access_log: &AccessLog) -> Snapshot {
    let histograms = std::mem::take(&mut *histograms.lock().unwrap());
    let access_log = std::mem::take(&mut *access_log.lock().unwrap());

    Snapshot {
        captured_at: Utc::now(),
        histograms,
        access_log,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AccessEntry;
    use crate::statistics::OVERALL;
    use tempfile::TempDir;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            proxy: None,
            interval: None,
            host: None,
            port: None,
            blacklist: vec![],
            monitoring: false,
            server: None,
            key: None,
        }
    }

    #[test]
    fn flags_override_file_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("narrow.toml");
        std::fs::write(&path, "listen_port = 8080\ninterval_secs = 10\n").unwrap();

        let mut args = args();
        args.config = Some(path);
        args.proxy = Some(9090);
        args.monitoring = true;
        args.key = Some("secret".to_string());

        let config = resolve_config(&args).unwrap();

        // flag wins over file
        assert_eq!(config.listen_port, 9090);
        // file wins over default
        assert_eq!(config.interval_secs, 10);
        assert!(config.monitoring.enabled);
        assert_eq!(config.monitoring.key, "secret");
    }

    #[test]
    fn take_snapshot_drains_shared_state() {
        let histograms: HistogramMap = Default::default();
        let access_log: AccessLog = Default::default();

        statistics::record(
            &histograms,
            "/users",
            Duration::from_millis(5),
            Utc::now(),
        );
        access_log.lock().unwrap().push(AccessEntry {
            timestamp: Utc::now(),
            method: "GET".to_string(),
            uri: "/users".to_string(),
            client_ip: "1.1.1.1".to_string(),
            micros: 5000,
        });

        let snapshot = take_snapshot(&histograms, &access_log);

        assert_eq!(snapshot.histograms[OVERALL].total_requests, 1);
        assert_eq!(snapshot.access_log.len(), 1);
        assert!(histograms.lock().unwrap().is_empty());
        assert!(access_log.lock().unwrap().is_empty());
    }
}
