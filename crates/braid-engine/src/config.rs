//! Runtime configuration, validation, and error types.
//!
//! [`RuntimeConfig`] is the builder-input for constructing a
//! [`Runtime`](crate::Runtime). [`validate()`](RuntimeConfig::validate)
//! checks the settings used when spawning revision worker threads.

use std::error::Error;
use std::fmt;

/// Smallest worker stack size accepted by [`RuntimeConfig::validate`].
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// Configuration for a [`Runtime`](crate::Runtime).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Prefix for worker thread names. Each forked revision runs on a
    /// thread named `"{thread_name}-{revision_id}"`. Default: `"braid-rev"`.
    pub thread_name: String,
    /// Stack size for worker threads, in bytes. `None` uses the platform
    /// default. Deep recursive fork trees with large frames may need more.
    pub stack_size: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            thread_name: "braid-rev".into(),
            stack_size: None,
        }
    }
}

impl RuntimeConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_name.is_empty() {
            return Err(ConfigError::InvalidThreadName {
                reason: "thread name prefix is empty".into(),
            });
        }
        // std::thread::Builder panics on interior NUL bytes.
        if self.thread_name.contains('\0') {
            return Err(ConfigError::InvalidThreadName {
                reason: "thread name prefix contains a NUL byte".into(),
            });
        }
        if let Some(configured) = self.stack_size {
            if configured < MIN_STACK_SIZE {
                return Err(ConfigError::StackTooSmall {
                    configured,
                    minimum: MIN_STACK_SIZE,
                });
            }
        }
        Ok(())
    }
}

/// Errors detected during [`RuntimeConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The worker thread name prefix cannot be used.
    InvalidThreadName {
        /// Description of what is wrong with the name.
        reason: String,
    },
    /// The worker stack size is below [`MIN_STACK_SIZE`].
    StackTooSmall {
        /// The configured size.
        configured: usize,
        /// The smallest accepted size.
        minimum: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidThreadName { reason } => write!(f, "invalid thread name: {reason}"),
            Self::StackTooSmall {
                configured,
                minimum,
            } => write!(
                f,
                "stack_size {configured} is below minimum of {minimum} bytes"
            ),
        }
    }
}

impl Error for ConfigError {}
