//! Folio - A content-managed personal portfolio site
//!
//! Every home page section goes through the same pipeline: fetch from the
//! content store, filter hidden rows, order, render. This library provides
//! that pipeline plus the admin and upload surfaces around it.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod render;
pub mod services;
pub mod storage;
pub mod store;

use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Config file used when `FOLIO_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Install the tracing subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub fn config_path() -> PathBuf {
    std::env::var_os("FOLIO_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
