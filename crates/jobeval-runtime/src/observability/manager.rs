//! Tracing context manager.
//!
//! Decides, per call, whether a call configuration should carry trace
//! handlers. A run of the workflow marks its execution scope as "inside
//! a tracked unit"; calls made inside that scope are not traced again
//! on their own unless the caller forces it. The same extractor used
//! standalone is traced normally.
//!
//! The flag lives in tokio task-local storage. Each invocation runs
//! inside [`TracingManager::scope`], which creates fresh storage (seeded
//! from the enclosing scope, if any), so concurrent invocations never
//! observe each other's flag. Tasks spawned with `tokio::spawn` start
//! outside any scope.

use parking_lot::Mutex;
use std::cell::Cell;
use std::future::Future;
use std::sync::Arc;

use super::handler::{LogTraceHandlerFactory, TraceHandler, TraceHandlerFactory};
use super::settings::TracingSettings;
use super::CallConfig;

tokio::task_local! {
    static WORKFLOW_SCOPE: Cell<bool>;
}

/// Hands out call configurations and owns the cached trace handler.
pub struct TracingManager {
    settings: TracingSettings,
    factory: Arc<dyn TraceHandlerFactory>,
    handler: Mutex<Option<Arc<dyn TraceHandler>>>,
}

impl std::fmt::Debug for TracingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracingManager")
            .field("settings", &self.settings)
            .field("handler_cached", &self.handler.lock().is_some())
            .finish()
    }
}

impl Default for TracingManager {
    fn default() -> Self {
        Self::disabled()
    }
}

impl TracingManager {
    pub fn new(settings: TracingSettings, factory: Arc<dyn TraceHandlerFactory>) -> Self {
        if let Some(reason) = settings.inactive_reason() {
            tracing::debug!(reason = %reason, "Tracing inactive");
        }
        Self {
            settings,
            factory,
            handler: Mutex::new(None),
        }
    }

    /// Manager using the default log-backed handler.
    pub fn from_settings(settings: TracingSettings) -> Self {
        Self::new(settings, Arc::new(LogTraceHandlerFactory))
    }

    /// Manager that never traces.
    pub fn disabled() -> Self {
        Self::from_settings(TracingSettings::disabled())
    }

    pub fn settings(&self) -> &TracingSettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.is_active()
    }

    /// Run `fut` with its own scope flag.
    ///
    /// The flag starts as the enclosing scope's value, or `false` at
    /// top level. Changes made inside do not leak out.
    pub async fn scope<F: Future>(fut: F) -> F::Output {
        let inherited = Self::in_workflow_scope();
        WORKFLOW_SCOPE.scope(Cell::new(inherited), fut).await
    }

    /// Whether the current scope is inside a tracked unit.
    pub fn in_workflow_scope() -> bool {
        WORKFLOW_SCOPE.try_with(Cell::get).unwrap_or(false)
    }

    /// Mark the current scope as inside a tracked unit and return a
    /// configuration that traces the whole pipeline.
    pub fn enter_workflow_scope(&self) -> CallConfig {
        if WORKFLOW_SCOPE.try_with(|flag| flag.set(true)).is_err() {
            tracing::warn!("enter_workflow_scope called outside TracingManager::scope");
        }
        self.traced_config("workflow")
    }

    /// Configuration for a single call.
    ///
    /// Traced when forced, or when not already inside a tracked unit.
    pub fn call_config(&self, force_tracing: bool) -> CallConfig {
        if force_tracing || !Self::in_workflow_scope() {
            self.traced_config(if force_tracing { "forced" } else { "standalone" })
        } else {
            CallConfig::untraced()
        }
    }

    /// Clear the scope flag and drop the cached handler.
    pub fn reset(&self) {
        // Outside a scope there is no flag to clear.
        let _ = WORKFLOW_SCOPE.try_with(|flag| flag.set(false));
        *self.handler.lock() = None;
    }

    /// The shared handler, created on first use.
    ///
    /// Returns `None` while tracing is inactive or if creation fails;
    /// failures are not cached, so a later call tries again.
    pub fn handler(&self) -> Option<Arc<dyn TraceHandler>> {
        if !self.settings.is_active() {
            return None;
        }

        let mut cached = self.handler.lock();
        if let Some(handler) = cached.as_ref() {
            return Some(Arc::clone(handler));
        }

        match self.factory.create(&self.settings) {
            Ok(handler) => {
                tracing::debug!(handler = handler.name(), "Trace handler created");
                *cached = Some(Arc::clone(&handler));
                Some(handler)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Trace handler unavailable, continuing untraced");
                None
            }
        }
    }

    fn traced_config(&self, scope: &str) -> CallConfig {
        match self.handler() {
            Some(handler) => CallConfig::with_handler(handler).metadata("trace_scope", scope),
            None => CallConfig::untraced(),
        }
    }
}
