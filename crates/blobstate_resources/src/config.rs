//! Resource manager configuration.

use blobstate_core::RunnerConfig;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Configuration for a [`crate::ResourceManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Tenant scope for every blob and metadata record the manager touches.
    pub namespace: String,
    /// Retry budget for metadata transactions.
    pub runner: RunnerConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            runner: RunnerConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Creates a configuration for `namespace` with the default retry budget.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Sets the runner configuration.
    #[must_use]
    pub fn runner(mut self, runner: RunnerConfig) -> Self {
        self.runner = runner;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.runner.max_attempts, 3);

        let config = ManagerConfig::new("model-1").runner(RunnerConfig::new().max_attempts(7));
        assert_eq!(config.namespace, "model-1");
        assert_eq!(config.runner.max_attempts, 7);
    }
}
