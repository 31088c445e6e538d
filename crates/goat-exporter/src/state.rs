use crate::client::NodeClient;
use crate::collector::Collector;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
pub struct AppState<C> {
    pub collector: Arc<Collector<C>>,
    /// When the exporter started serving
    pub started_at: Instant,
}

impl<C: NodeClient> AppState<C> {
    pub fn new(collector: Arc<Collector<C>>) -> Self {
        Self {
            collector,
            started_at: Instant::now(),
        }
    }
}
