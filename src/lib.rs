//! Narrow - web traffic observation proxy.
//!
//! Forwards HTTP traffic to a single upstream target while recording
//! per-endpoint latency histograms and an access log, and manages the
//! project's commit-message hook manifest.

pub mod cli;
pub mod config;
pub mod error;
pub mod monitoring;
pub mod precommit;
pub mod proxy;
pub mod state;
pub mod statistics;

pub use error::Error;
