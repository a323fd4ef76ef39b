use crate::domain::model::DiscoveredDevice;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// 藍牙主機端：掃描與建立連線
#[async_trait]
pub trait BleCentral: Send + Sync {
    type Link: BleLink;

    /// Scan for `timeout` and return every advertisement seen.
    async fn discover(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>>;

    async fn connect(&self, address: &str) -> Result<Self::Link>;
}

/// An open GATT connection to one peripheral.
#[async_trait]
pub trait BleLink: Send + Sync {
    /// Enable notifications on `characteristic`. Each notification value is
    /// delivered on the returned channel.
    async fn subscribe(&mut self, characteristic: Uuid) -> Result<mpsc::Receiver<Vec<u8>>>;

    async fn write(&mut self, characteristic: Uuid, data: &[u8]) -> Result<()>;

    async fn is_connected(&self) -> bool;

    async fn disconnect(&mut self) -> Result<()>;
}
