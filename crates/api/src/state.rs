use std::sync::Arc;

use atelier_core::events::EventBus;
use atelier_core::Gallery;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    gallery: Gallery,
    config: AppConfig,
}

impl AppState {
    pub fn new(gallery: Gallery, config: AppConfig) -> Self {
        Self {
            inner: Arc::new(InnerState { gallery, config }),
        }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.inner.gallery
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        self.inner.gallery.events()
    }
}
