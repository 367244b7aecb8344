//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::bonus::BonusService;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Bonus proposal rules over the configured store
    pub bonuses: BonusService,
}

impl AppState {
    pub fn new(bonuses: BonusService) -> Self {
        Self { bonuses }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
