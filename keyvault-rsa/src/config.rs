//! Configuration for the blocking bridge.

/// How blocking calls drive the asynchronous remote operations.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeStrategy {
    /// Inside a multi-threaded Tokio runtime, block in place on the current
    /// runtime. Anywhere else, run on a dedicated worker thread.
    #[default]
    Auto,
    /// Always run on a dedicated worker thread with its own runtime.
    DedicatedThread,
}

/// Configuration of the blocking bridge.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// How to drive the future.
    pub strategy: BridgeStrategy,
    /// Name given to dedicated worker threads.
    pub thread_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            strategy: BridgeStrategy::Auto,
            thread_name: "keyvault-rsa-bridge".into(),
        }
    }
}

impl BridgeConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: BridgeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the worker thread name.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}
