//! Procurement API Library
//!
//! Core workflow engine for typed purchase orders: quotation gating,
//! creation validation, status transitions and approval tracking.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod models;
pub mod repositories;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: services::ServiceContainer,
}

impl AppState {
    /// Connects to the database, optionally migrates, and wires the service
    /// graph. The returned receiver feeds `events::process_events`.
    pub async fn from_config(
        cfg: config::AppConfig,
    ) -> Result<(Self, mpsc::Receiver<events::Event>), errors::ServiceError> {
        let pool = db::establish_connection_from_app_config(&cfg).await?;
        if cfg.auto_migrate {
            db::run_migrations(&pool).await?;
        }
        let db = Arc::new(pool);

        let (event_sender, event_rx) = events::event_channel(cfg.event_channel_capacity);
        let factory = services::ServiceFactory::new(db.clone(), event_sender.clone());
        let services = services::ServiceContainer::new(&factory);

        Ok((
            Self {
                db,
                config: cfg,
                event_sender,
                services,
            },
            event_rx,
        ))
    }
}
