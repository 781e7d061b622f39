//! Configuration types for index destinations.

/// Configuration for an index destination.
///
/// Controls how large a single submit request to the backend may get. Larger
/// document slices are split into several requests.
#[derive(Debug, Clone)]
pub struct DestinationConfig {
    /// Maximum number of documents sent in one bulk request.
    ///
    /// Set to `None` to send every submit as one request (not recommended for
    /// production). Defaults to 500.
    pub max_batch_size: Option<usize>,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(500),
        }
    }
}

impl DestinationConfig {
    /// Create a config with no batch size limit.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
        }
    }

    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
        }
    }

    /// The chunk size to split `total` documents into.
    pub(crate) fn chunk_size(&self, total: usize) -> usize {
        match self.max_batch_size {
            Some(max) if max > 0 => max,
            _ => total.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size() {
        assert_eq!(DestinationConfig::default().chunk_size(10_000), 500);
        assert_eq!(DestinationConfig::with_max_batch_size(10).chunk_size(3), 10);
        assert_eq!(DestinationConfig::unlimited().chunk_size(1234), 1234);
        assert_eq!(DestinationConfig::unlimited().chunk_size(0), 1);
    }
}
