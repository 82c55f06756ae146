//! Shared application state: one struct holding the pool-backed store
//! and queue, the in-process event bus, the adapter registry, and the
//! scanner defaults.

use std::sync::Arc;

use bountyforge_adapters::registry::AdapterRegistry;
use bountyforge_config::ScannerDefaults;
use bountyforge_db::{PgJobQueue, PgResultStore};
use bountyforge_scheduler::InMemoryEventBus;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PgResultStore>,
    pub bus: Arc<InMemoryEventBus>,
    pub queue: Arc<PgJobQueue>,
    pub registry: Arc<AdapterRegistry>,
    pub defaults: Arc<ScannerDefaults>,
}

impl AppState {
    pub fn new(pool: sqlx::PgPool, defaults: ScannerDefaults) -> Self {
        Self {
            store: Arc::new(PgResultStore::new(pool.clone())),
            bus: Arc::new(InMemoryEventBus::new()),
            queue: Arc::new(PgJobQueue::new(pool)),
            registry: Arc::new(AdapterRegistry::with_defaults()),
            defaults: Arc::new(defaults),
        }
    }
}
