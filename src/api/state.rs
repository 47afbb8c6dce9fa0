use std::sync::Arc;

use crate::{config::QueryLimits, services::RecommendationEngine};

/// Shared application state
///
/// The engine is immutable once built, so handlers share it without a lock.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub limits: QueryLimits,
}

impl AppState {
    pub fn new(engine: RecommendationEngine, limits: QueryLimits) -> Self {
        Self {
            engine: Arc::new(engine),
            limits,
        }
    }
}
