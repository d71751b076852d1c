use std::sync::Arc;

use sitesmith_core::events::bus::EventBus;
use sitesmith_core::photo::storage::PhotoStorage;
use sitesmith_core::photo::PhotoClassifier;
use sqlx::PgPool;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State`
/// extractor. Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    pool: PgPool,
    config: AppConfig,
    event_bus: EventBus,
    storage: Arc<dyn PhotoStorage>,
    classifier: PhotoClassifier,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: AppConfig,
        event_bus: EventBus,
        storage: Arc<dyn PhotoStorage>,
        classifier: PhotoClassifier,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState {
                pool,
                config,
                event_bus,
                storage,
                classifier,
            }),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn storage(&self) -> &dyn PhotoStorage {
        self.inner.storage.as_ref()
    }

    pub fn classifier(&self) -> &PhotoClassifier {
        &self.inner.classifier
    }
}
