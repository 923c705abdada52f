use std::sync::Arc;

pub mod auth;
pub mod clock;
pub mod commands;
pub mod config;
pub mod controllers;
pub mod db;
pub mod keys;
pub mod models;
pub mod types;

mod error;
pub use error::{ApiError, ApiResult};

use auth::Signer;
use clock::{Clock, SystemClock};
use config::Config;
use db::Database;

/// Everything a request handler needs, shared by all of them.
#[derive(Clone)]
pub struct App {
    pub config: Config,
    pub database: Database,
    pub signer: Signer,
    pub clock: Arc<dyn Clock>,
}

impl App {
    /// Connect to the configured database and build the app around it.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let database = Database::connect(&config.database.url).await?;
        Ok(Self::with_clock(config, database, Arc::new(SystemClock)))
    }

    pub fn with_clock(config: Config, database: Database, clock: Arc<dyn Clock>) -> Self {
        let signer = Signer::new(config.secret());
        App {
            config,
            database,
            signer,
            clock,
        }
    }
}
