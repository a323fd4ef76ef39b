// Adapters layer: concrete implementations for external systems.

#[cfg(feature = "ble")]
pub mod bluetooth;

use crate::utils::error::Result;
use std::future::Future;

/// Run a setup step on a connection that is already open. When the step
/// fails the connection is closed before the step's error is returned, since
/// the caller never gets a link it could disconnect.
pub async fn disconnect_on_error<T, S, D, F>(address: &str, step: S, disconnect: D) -> Result<T>
where
    S: Future<Output = Result<T>>,
    D: FnOnce() -> F,
    F: Future<Output = Result<()>>,
{
    match step.await {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::debug!("Setup of {} failed, disconnecting: {}", address, e);
            if let Err(disconnect_error) = disconnect().await {
                tracing::warn!("Failed to disconnect from {}: {}", address, disconnect_error);
            }
            Err(e)
        }
    }
}
