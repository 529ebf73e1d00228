//! Blocking on asynchronous remote calls.
//!
//! A blocking caller must never wait on a future that needs the caller's own
//! thread to make progress. On a multi-threaded runtime the worker hands its
//! other tasks off with `block_in_place` and drives the future itself. With no
//! runtime, or on a current-thread runtime whose only thread is the caller,
//! the future runs on a scoped worker thread with a private runtime and the
//! caller waits for that thread to finish.
//!
//! On the worker-thread path the backend future runs on that private
//! runtime, not on the caller's. A [`KeyVaultClient`] whose I/O is driven by
//! tasks spawned on the caller's current-thread runtime will hang there,
//! since that runtime is blocked for the duration of the call. Such clients
//! must own their I/O (or be driven from a multi-threaded runtime), or be
//! called through the async methods instead.
//!
//! [`KeyVaultClient`]: keyvault_crypto::KeyVaultClient

use crate::config::{BridgeConfig, BridgeStrategy};
use keyvault_crypto::CryptoError;
use std::future::Future;
use tokio::runtime::{Handle, RuntimeFlavor};

#[derive(Debug, Clone)]
pub(crate) struct BlockingBridge {
    config: BridgeConfig,
}

impl BlockingBridge {
    pub(crate) fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub(crate) fn block_on<F, T>(&self, future: F) -> Result<T, CryptoError>
    where
        F: Future<Output = Result<T, CryptoError>> + Send,
        T: Send,
    {
        if self.config.strategy == BridgeStrategy::Auto {
            if let Ok(handle) = Handle::try_current() {
                if handle.runtime_flavor() == RuntimeFlavor::MultiThread {
                    tracing::trace!("blocking in place on the current runtime");
                    return tokio::task::block_in_place(|| handle.block_on(future));
                }
            }
        }
        self.on_worker_thread(future)
    }

    fn on_worker_thread<F, T>(&self, future: F) -> Result<T, CryptoError>
    where
        F: Future<Output = Result<T, CryptoError>> + Send,
        T: Send,
    {
        tracing::trace!(thread = %self.config.thread_name, "blocking on a worker thread");
        std::thread::scope(|scope| {
            let worker = std::thread::Builder::new()
                .name(self.config.thread_name.clone())
                .spawn_scoped(scope, || {
                    let runtime = tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                        .map_err(|e| {
                            CryptoError::operation_failed("failed to start bridge runtime", e)
                        })?;
                    runtime.block_on(future)
                })
                .map_err(|e| CryptoError::operation_failed("failed to spawn bridge thread", e))?;
            worker
                .join()
                .map_err(|_| CryptoError::failed("bridge thread panicked"))?
        })
    }
}
