use std::sync::Arc;

use crate::config::FilterDefaults;
use crate::engine::discovery::DiscoveryService;
use crate::source::memory::MemoryCatalog;

pub struct AppState {
    pub discovery: DiscoveryService,
    /// Present when listings are posted locally rather than read from a backend.
    pub catalog: Option<Arc<MemoryCatalog>>,
    pub defaults: FilterDefaults,
}

impl AppState {
    pub fn new(
        discovery: DiscoveryService,
        catalog: Option<Arc<MemoryCatalog>>,
        defaults: FilterDefaults,
    ) -> Self {
        Self {
            discovery,
            catalog,
            defaults,
        }
    }

    pub fn with_local_catalog(defaults: FilterDefaults) -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        let discovery = DiscoveryService::new(catalog.clone());
        Self::new(discovery, Some(catalog), defaults)
    }
}
