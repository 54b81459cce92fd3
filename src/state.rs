use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    config: Arc<Config>,
    db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, db: Option<Arc<Database>>) -> Self {
        Self {
            started_at: Instant::now(),
            config,
            db,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db(&self) -> Option<Arc<Database>> {
        self.db.clone()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
