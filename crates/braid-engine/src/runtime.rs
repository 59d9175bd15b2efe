//! The runtime: configuration, shared counters, and root scopes.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::config::{ConfigError, RuntimeConfig};
use crate::context::RootScope;
use crate::metrics::{RuntimeMetrics, RuntimeStats};
use crate::revision::Revision;

/// State shared by every revision and segment of one runtime.
pub(crate) struct RuntimeShared {
    pub(crate) config: RuntimeConfig,
    pub(crate) stats: Arc<RuntimeStats>,
}

/// A revision runtime.
///
/// Owns the worker-thread configuration and the counters reported by
/// [`metrics`](Runtime::metrics). Code that never calls
/// [`enter`](Runtime::enter) runs under [`Runtime::global`].
///
/// Cloning is cheap; clones share configuration and counters.
#[derive(Clone)]
pub struct Runtime {
    shared: Arc<RuntimeShared>,
}

// Compile-time assertion: Runtime must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Runtime>();
};

impl Runtime {
    /// Create a runtime after validating `config`.
    pub fn new(config: RuntimeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(RuntimeShared {
                config,
                stats: Arc::new(RuntimeStats::default()),
            }),
        })
    }

    /// The process-wide runtime with default configuration.
    pub fn global() -> &'static Runtime {
        static GLOBAL: OnceLock<Runtime> = OnceLock::new();
        GLOBAL.get_or_init(|| Runtime {
            shared: Arc::new(RuntimeShared {
                config: RuntimeConfig::default(),
                stats: Arc::new(RuntimeStats::default()),
            }),
        })
    }

    /// Run `f` in a fresh root revision of this runtime.
    ///
    /// On return (or unwind) the calling thread's previous revision is
    /// restored and the root's segments are released. Values declared
    /// inside the scope keep no entries afterwards, so reading them from
    /// outside yields [`ReadError::Uninitialized`](braid_core::ReadError).
    pub fn enter<U>(&self, f: impl FnOnce() -> U) -> U {
        let _scope = RootScope::enter(Revision::new_root(Arc::clone(&self.shared)));
        f()
    }

    /// Snapshot of this runtime's counters.
    pub fn metrics(&self) -> RuntimeMetrics {
        self.shared.stats.snapshot()
    }

    /// The configuration this runtime was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.shared.config
    }

    pub(crate) fn shared(&self) -> Arc<RuntimeShared> {
        Arc::clone(&self.shared)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.shared.config)
            .field("metrics", &self.metrics())
            .finish()
    }
}
