// Application state module
// Shared, read-only state handed to every connection

use super::types::Config;
use crate::routes::{self, RouteTable};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Compiled once at startup, never mutated
    pub routes: RouteTable,
}

impl AppState {
    /// Create `AppState` serving the project routes
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            routes: RouteTable::new(routes::project_routes()),
        }
    }
}
