//! Queue configuration.

use derive_builder::Builder;

/// Configuration for an [`OperationQueue`](super::OperationQueue).
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct QueueConfig {
    /// Maximum number of operations executing at once. `None` means
    /// unbounded, which is the default: transitions hold a small, fixed
    /// number of operations.
    #[builder(default)]
    pub max_concurrency: Option<usize>,
}

impl QueueConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(0)) = self.max_concurrency {
            return Err("max_concurrency must be at least 1".into());
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
        }
    }
}
