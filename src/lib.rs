pub mod activity;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod schema;
pub mod services;
pub mod validation;

use crate::activity::ActivitySink;
use crate::config::{Config, EngineConfig};
use crate::db::DbPool;
use crate::services::lead_sources::LeadSourceRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub engine: EngineConfig,
    pub lead_sources: Arc<LeadSourceRegistry>,
    pub activity: Arc<dyn ActivitySink>,
}

impl AppState {
    pub fn new(
        db: DbPool,
        config: Config,
        lead_sources: LeadSourceRegistry,
        activity: Arc<dyn ActivitySink>,
    ) -> Self {
        let engine = config.engine();
        Self {
            db,
            config: Arc::new(config),
            engine,
            lead_sources: Arc::new(lead_sources),
            activity,
        }
    }
}

pub fn init_tracing(config: &Config) {
    let logging = config.logging();
    let level = match logging.level.as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_max_level(level)
                .with_current_span(false)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_max_level(level).init();
        }
    }
}
