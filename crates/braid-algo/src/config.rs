//! Splitting configuration for the parallel helpers.

use crate::error::ParallelError;

/// Controls how finely the helpers split their input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Ranges of at most this many elements are processed sequentially
    /// in the current revision. Default: 1024.
    pub min_parallel: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self { min_parallel: 1024 }
    }
}

impl ParallelConfig {
    /// A config with the given sequential cutoff.
    pub fn with_min_parallel(min_parallel: usize) -> Self {
        Self { min_parallel }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ParallelError> {
        if self.min_parallel == 0 {
            return Err(ParallelError::ZeroGrain);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(ParallelConfig::default().min_parallel, 1024);
        assert!(ParallelConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_grain_rejected() {
        match ParallelConfig::with_min_parallel(0).validate() {
            Err(ParallelError::ZeroGrain) => {}
            other => panic!("expected ZeroGrain, got {other:?}"),
        }
    }
}
