//! Shared application state for the exporter.
//!
//! Everything here is read-only after startup apart from the atomics inside
//! `ExporterMetrics`, so concurrent scrapes need no locking.

use std::sync::Arc;

use crate::collector::ScopeCollector;
use crate::config::ExporterConfig;
use crate::obs::ExporterMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    collector: Arc<ScopeCollector>,
    metrics: Arc<ExporterMetrics>,
}

struct AppStateInner {
    cfg: ExporterConfig,
}

impl AppState {
    /// Build application state from a validated config.
    pub fn new(cfg: ExporterConfig) -> Self {
        let metrics = Arc::new(ExporterMetrics::default());
        let collector = Arc::new(ScopeCollector::from_config(&cfg.dovecot, Arc::clone(&metrics)));

        for scope in collector.scopes() {
            tracing::info!(scope = %scope.name, kind = scope.kind.as_str(), "scope registered");
        }

        Self {
            inner: Arc::new(AppStateInner { cfg }),
            collector,
            metrics,
        }
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn collector(&self) -> Arc<ScopeCollector> {
        Arc::clone(&self.collector)
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.metrics
    }

    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }
}
