//! Shared store and message bus implementations for Foreman.

pub mod in_memory;
pub mod bus;
pub mod shared_memory;
pub mod dedup_bus;

pub use in_memory::InMemoryStore;
pub use bus::InMemoryBus;
pub use shared_memory::{SharedMemory, keys};
pub use dedup_bus::DedupBus;

use foreman_config::{AppConfig, StoreBackend};
use foreman_core::bus::MessageBus;
use foreman_core::store::SharedStore;
use std::sync::Arc;

/// Build the shared store selected by configuration. `None` when disabled.
pub fn build_from_config(config: &AppConfig) -> Option<Arc<dyn SharedStore>> {
    match config.store.backend {
        StoreBackend::Memory => Some(Arc::new(InMemoryStore::new())),
        StoreBackend::None => {
            tracing::info!("Shared store disabled: dedup off, daily brief uses placeholders");
            None
        }
    }
}

/// Put `bus` behind a [`DedupBus`] keyed in `store`, using the configured
/// dedup window. Without a store the bus is returned unwrapped.
pub fn dedup_bus(
    config: &AppConfig,
    bus: Arc<dyn MessageBus>,
    store: Option<Arc<dyn SharedStore>>,
) -> Arc<dyn MessageBus> {
    match store {
        Some(store) => Arc::new(DedupBus::new(bus, store, config.escalation.dedup_ttl())),
        None => bus,
    }
}
