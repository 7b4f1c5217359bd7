//! Runner and store configuration.

/// Default number of attempts the transaction runner makes.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Configuration for the transaction runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// How many times a batch is built and committed before giving up.
    ///
    /// Values below 1 are treated as 1.
    pub max_attempts: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RunnerConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

/// Configuration for opening a file-backed document store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to `sync_all` the journal on every commit (safer but slower).
    pub sync_on_commit: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync the journal on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(RunnerConfig::default().max_attempts, 3);
        let store = StoreConfig::default();
        assert!(store.create_if_missing);
        assert!(store.sync_on_commit);
    }

    #[test]
    fn builder_pattern() {
        let runner = RunnerConfig::new().max_attempts(5);
        assert_eq!(runner.max_attempts, 5);

        let store = StoreConfig::new()
            .create_if_missing(false)
            .sync_on_commit(false);
        assert!(!store.create_if_missing);
        assert!(!store.sync_on_commit);
    }
}
