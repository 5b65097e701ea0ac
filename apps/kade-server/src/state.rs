//! Shared application state, cloned into every handler.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use kade_core::sale::business_day;
use kade_db::Database;

use crate::auth::JwtManager;
use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager, config: ServerConfig) -> Self {
        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }

    /// The store's calendar day at `at`.
    pub fn business_day(&self, at: DateTime<Utc>) -> NaiveDate {
        business_day(at, self.config.store.utc_offset_minutes)
    }

    pub fn today(&self) -> NaiveDate {
        self.business_day(Utc::now())
    }
}
