use std::sync::Arc;

use advisory_core::Aggregator;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    /// Cancelled on shutdown; in-flight advisories observe a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(aggregator: Aggregator, shutdown: CancellationToken) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            shutdown,
        }
    }
}
