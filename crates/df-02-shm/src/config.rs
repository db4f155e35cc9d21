//! Segment configuration from environment variables.

use std::env;

/// Default name of the per-host segment.
pub const DEFAULT_SEGMENT_NAME: &str = "dataflow";

/// First size tried when creating a segment.
pub const DEFAULT_SEGMENT_SIZE: usize = 1 << 28;

/// Smallest size tried before giving up.
pub const MIN_SEGMENT_SIZE: usize = 4096;

/// Configuration of the shared object store of one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShmConfig {
    /// Name of the segment shared by all processes of a host
    pub name: String,

    /// Size requested first; halved on failure
    pub initial_size: usize,

    /// Floor of the halving ladder
    pub min_size: usize,
}

impl Default for ShmConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SEGMENT_NAME.to_string(),
            initial_size: DEFAULT_SEGMENT_SIZE,
            min_size: MIN_SEGMENT_SIZE,
        }
    }
}

impl ShmConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DF_SHM_NAME`: Segment name (default: dataflow)
    /// - `DF_SHM_SIZE`: Initial segment size in bytes (default: 256 MiB)
    /// - `DF_SHM_MIN_SIZE`: Smallest acceptable size (default: 4096)
    pub fn from_env() -> Self {
        Self {
            name: env::var("DF_SHM_NAME").unwrap_or_else(|_| DEFAULT_SEGMENT_NAME.to_string()),

            initial_size: env::var("DF_SHM_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SEGMENT_SIZE),

            min_size: env::var("DF_SHM_MIN_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(|v: usize| v.max(MIN_SEGMENT_SIZE))
                .unwrap_or(MIN_SEGMENT_SIZE),
        }
    }

    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_initial_size(mut self, size: usize) -> Self {
        self.initial_size = size;
        self
    }

    /// Sizes tried in order when creating the segment: halving from the
    /// initial size, ending on the floor itself.
    pub fn ladder(&self) -> impl Iterator<Item = usize> {
        let floor = self.min_size.max(1);
        let first = (self.initial_size >= floor).then_some(self.initial_size);
        std::iter::successors(first, move |s| (*s > floor).then(|| (s / 2).max(floor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShmConfig::default();
        assert_eq!(config.name, "dataflow");
        assert_eq!(config.initial_size, 1 << 28);
        assert_eq!(config.min_size, 4096);
    }

    #[test]
    fn test_ladder_halves_to_floor() {
        let config = ShmConfig::named("t").with_initial_size(1 << 14);
        let sizes: Vec<usize> = config.ladder().collect();
        assert_eq!(sizes, vec![1 << 14, 1 << 13, 1 << 12]);
    }

    #[test]
    fn test_ladder_ends_on_floor() {
        let config = ShmConfig::named("t").with_initial_size(10_000);
        let sizes: Vec<usize> = config.ladder().collect();
        assert_eq!(sizes, vec![10_000, 5_000, 4096]);
    }

    #[test]
    fn test_ladder_zero_floor_terminates() {
        let config = ShmConfig {
            min_size: 0,
            ..ShmConfig::named("t").with_initial_size(8)
        };
        let sizes: Vec<usize> = config.ladder().collect();
        assert_eq!(sizes, vec![8, 4, 2, 1]);
    }

    #[test]
    fn test_ladder_empty_below_floor() {
        let config = ShmConfig::named("t").with_initial_size(1024);
        assert_eq!(config.ladder().count(), 0);
    }
}
