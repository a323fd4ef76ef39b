use super::disconnect_on_error;
use crate::domain::model::DiscoveredDevice;
use crate::domain::ports::{BleCentral, BleLink};
use crate::utils::error::{AdaxError, Result};
use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

const NOTIFICATION_BUFFER: usize = 32;

/// [`BleCentral`] on the first Bluetooth adapter of this machine.
pub struct BtleplugCentral {
    adapter: Adapter,
}

impl BtleplugCentral {
    pub async fn new() -> Result<Self> {
        let manager = Manager::new().await.map_err(AdaxError::bluetooth)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(AdaxError::bluetooth)?
            .into_iter()
            .next()
            .ok_or_else(|| AdaxError::bluetooth("no Bluetooth adapter found"))?;
        Ok(Self { adapter })
    }

    async fn find_peripheral(&self, address: &str) -> Result<Peripheral> {
        let peripherals = self.adapter.peripherals().await.map_err(AdaxError::bluetooth)?;
        peripherals
            .into_iter()
            .find(|p| p.address().to_string().eq_ignore_ascii_case(address))
            .ok_or_else(|| AdaxError::bluetooth(format!("device {} is gone", address)))
    }
}

#[async_trait]
impl BleCentral for BtleplugCentral {
    type Link = BtleplugLink;

    async fn discover(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
        tracing::debug!("Scanning for BLE devices for {:?}", timeout);
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(AdaxError::bluetooth)?;
        tokio::time::sleep(timeout).await;
        if let Err(e) = self.adapter.stop_scan().await {
            tracing::warn!("Failed to stop BLE scan: {}", e);
        }

        let mut devices = Vec::new();
        for peripheral in self.adapter.peripherals().await.map_err(AdaxError::bluetooth)? {
            let Some(properties) = peripheral
                .properties()
                .await
                .map_err(AdaxError::bluetooth)?
            else {
                continue;
            };
            devices.push(DiscoveredDevice {
                address: properties.address.to_string(),
                name: properties.local_name,
                service_uuids: properties.services,
                manufacturer_data: DiscoveredDevice::manufacturer_data_from_entries(
                    properties.manufacturer_data,
                ),
            });
        }
        Ok(devices)
    }

    async fn connect(&self, address: &str) -> Result<BtleplugLink> {
        let peripheral = self.find_peripheral(address).await?;
        peripheral.connect().await.map_err(AdaxError::bluetooth)?;
        disconnect_on_error(
            address,
            async {
                peripheral
                    .discover_services()
                    .await
                    .map_err(AdaxError::bluetooth)
            },
            || async { peripheral.disconnect().await.map_err(AdaxError::bluetooth) },
        )
        .await?;
        tracing::debug!("Connected to {}", address);

        Ok(BtleplugLink {
            peripheral,
            forwarder: None,
        })
    }
}

pub struct BtleplugLink {
    peripheral: Peripheral,
    forwarder: Option<JoinHandle<()>>,
}

impl BtleplugLink {
    fn characteristic(&self, uuid: Uuid) -> Result<Characteristic> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or_else(|| AdaxError::bluetooth(format!("characteristic {} not found", uuid)))
    }
}

#[async_trait]
impl BleLink for BtleplugLink {
    async fn subscribe(&mut self, characteristic: Uuid) -> Result<mpsc::Receiver<Vec<u8>>> {
        let target = self.characteristic(characteristic)?;
        self.peripheral
            .subscribe(&target)
            .await
            .map_err(AdaxError::bluetooth)?;
        let mut stream = self
            .peripheral
            .notifications()
            .await
            .map_err(AdaxError::bluetooth)?;

        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
        self.forwarder = Some(tokio::spawn(async move {
            while let Some(notification) = stream.next().await {
                if notification.uuid != characteristic {
                    continue;
                }
                if tx.send(notification.value).await.is_err() {
                    break;
                }
            }
        }));
        Ok(rx)
    }

    async fn write(&mut self, characteristic: Uuid, data: &[u8]) -> Result<()> {
        let target = self.characteristic(characteristic)?;
        self.peripheral
            .write(&target, data, WriteType::WithResponse)
            .await
            .map_err(AdaxError::bluetooth)
    }

    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        self.peripheral
            .disconnect()
            .await
            .map_err(AdaxError::bluetooth)
    }
}
