use crate::core::protocol::{
    chunk_command, encode_join_command, ManufacturerData, Notification, UUID_ADAX_BLE_SERVICE,
    UUID_ADAX_BLE_SERVICE_CHARACTERISTIC_COMMAND,
};
use crate::domain::model::{DiscoveredDevice, ProvisioningOutcome};
use crate::domain::ports::{BleCentral, BleLink};
use crate::utils::error::{AdaxError, Result};
use crate::utils::token::AccessToken;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::Instant;

/// 掃描與等待註冊的時間參數
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningOptions {
    pub scan_timeout: Duration,
    /// Extra scans after the first one comes back without a heater.
    pub scan_retries: u32,
    pub poll_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for ProvisioningOptions {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(60),
            scan_retries: 1,
            poll_attempts: 20,
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Hands WiFi credentials and a fresh access token to a heater in pairing
/// mode and learns the IP address it gets on the LAN.
pub struct DeviceProvisioner<C: BleCentral> {
    central: C,
    wifi_ssid: String,
    wifi_psk: String,
    access_token: AccessToken,
    options: ProvisioningOptions,
    device_ip: Option<Ipv4Addr>,
    mac_id: Option<u64>,
}

impl<C: BleCentral> DeviceProvisioner<C> {
    pub fn new(central: C, wifi_ssid: impl Into<String>, wifi_psk: impl Into<String>) -> Self {
        Self {
            central,
            wifi_ssid: wifi_ssid.into(),
            wifi_psk: wifi_psk.into(),
            access_token: AccessToken::generate(),
            options: ProvisioningOptions::default(),
            device_ip: None,
            mac_id: None,
        }
    }

    pub fn with_options(mut self, options: ProvisioningOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_access_token(mut self, access_token: AccessToken) -> Self {
        self.access_token = access_token;
        self
    }

    pub fn device_ip(&self) -> Option<Ipv4Addr> {
        self.device_ip
    }

    pub fn mac_id(&self) -> Option<u64> {
        self.mac_id
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn outcome(&self) -> Option<ProvisioningOutcome> {
        Some(ProvisioningOutcome {
            device_ip: self.device_ip?,
            mac_id: self.mac_id?,
            access_token: self.access_token.clone(),
        })
    }

    /// Scan until an Adax heater shows up, retrying on empty scans.
    pub async fn scan_for_available_device(&self) -> Result<(String, u64)> {
        let mut retries_left = self.options.scan_retries;
        loop {
            let discovered = self.central.discover(self.options.scan_timeout).await?;
            tracing::debug!("Discovered {} BLE devices", discovered.len());

            if let Some(found) = select_available_device(&discovered)? {
                return Ok(found);
            }
            if retries_left == 0 {
                return Err(AdaxError::HeaterNotFound);
            }
            retries_left -= 1;
            tracing::info!("No Adax heater found, scanning again");
        }
    }

    /// Run the whole pairing flow. `Ok(false)` means the heater accepted the
    /// command but never reported an IP address.
    pub async fn configure_device(&mut self) -> Result<bool> {
        tracing::info!(
            "Press and hold OK button on the heater until the blue led starts blinking"
        );
        let (address, mac_id) = self.scan_for_available_device().await?;
        tracing::debug!("device: {} mac_id: {}", address, mac_id);
        self.mac_id = Some(mac_id);

        let mut link = self.central.connect(&address).await?;
        let result = self.provision(&mut link).await;
        if let Err(e) = link.disconnect().await {
            tracing::warn!("Failed to disconnect from {}: {}", address, e);
        }
        result
    }

    async fn provision(&mut self, link: &mut C::Link) -> Result<bool> {
        tracing::debug!("start_notify");
        let mut notifications = link
            .subscribe(UUID_ADAX_BLE_SERVICE_CHARACTERISTIC_COMMAND)
            .await?;

        let command = encode_join_command(
            &self.wifi_ssid,
            &self.wifi_psk,
            self.access_token.as_str(),
        );
        tracing::debug!("write_command");
        write_command(link, &command).await?;

        let deadline = Instant::now() + self.options.poll_interval * self.options.poll_attempts;
        while self.device_ip.is_none() && link.is_connected().await {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let wait = self.options.poll_interval.min(deadline - now);
            match tokio::time::timeout(wait, notifications.recv()).await {
                Ok(Some(data)) => self.handle_notification(&data)?,
                Ok(None) => {
                    tracing::debug!("Notification channel closed");
                    break;
                }
                Err(_) => {}
            }
        }

        match self.device_ip {
            Some(ip) => {
                tracing::info!("✅ Heater registered with IP {}", ip);
                Ok(true)
            }
            None => {
                tracing::warn!("Heater did not report an IP address");
                Ok(false)
            }
        }
    }

    fn handle_notification(&mut self, data: &[u8]) -> Result<()> {
        tracing::debug!("notification {:?}", data);
        match Notification::decode(data) {
            Notification::Empty => tracing::warn!("No data"),
            Notification::InvalidWifi => {
                tracing::debug!("Invalid WiFi credentials");
                return Err(AdaxError::InvalidWifiCredentials);
            }
            Notification::Registered { ip } => {
                tracing::debug!("Heater Registered, use with IP {}", ip);
                self.device_ip = Some(ip);
            }
            Notification::Status { status, .. } => tracing::debug!("Status {}", status),
        }
        Ok(())
    }
}

/// Pick the first advertisement carrying the Adax service and manufacturer
/// data. That heater must be free for pairing, otherwise the scan fails with
/// [`AdaxError::HeaterNotAvailable`].
pub fn select_available_device(devices: &[DiscoveredDevice]) -> Result<Option<(String, u64)>> {
    for device in devices {
        if !device.advertises_service(UUID_ADAX_BLE_SERVICE) {
            continue;
        }
        tracing::info!("Found Adax heater {}", device.address);

        let Some((company_id, payload)) = device.manufacturer_data.first() else {
            tracing::debug!("No manufacturer data for {}", device.address);
            continue;
        };
        let manufacturer_data = ManufacturerData::from_advertisement(*company_id, payload);
        tracing::debug!("manufacturer_data {:?}", manufacturer_data.as_bytes());

        if !manufacturer_data.is_available() {
            tracing::warn!("Heater not available.");
            return Err(AdaxError::HeaterNotAvailable);
        }
        return Ok(Some((device.address.clone(), manufacturer_data.mac_id())));
    }
    Ok(None)
}

/// Write a command to the command characteristic, one chunk per write.
/// An oversized command fails before the first write.
pub async fn write_command<L: BleLink + ?Sized>(link: &mut L, command: &[u8]) -> Result<()> {
    for chunk in chunk_command(command)? {
        link.write(UUID_ADAX_BLE_SERVICE_CHARACTERISTIC_COMMAND, &chunk)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adax_device(address: &str, status: u8) -> DiscoveredDevice {
        DiscoveredDevice {
            address: address.to_string(),
            name: Some("Adax".to_string()),
            service_uuids: vec![UUID_ADAX_BLE_SERVICE],
            // company id 低位元組為型別，高位元組為狀態
            manufacturer_data: vec![(
                (u16::from(status) << 8) | 0x0005,
                vec![0, 0, 0, 0, 0, 0, 0, 0x2a],
            )],
        }
    }

    #[test]
    fn test_select_skips_foreign_devices() {
        let other = DiscoveredDevice {
            address: "AA:AA".to_string(),
            ..Default::default()
        };
        let devices = vec![other, adax_device("BB:BB", 0)];

        let found = select_available_device(&devices).unwrap();
        assert_eq!(found, Some(("BB:BB".to_string(), 0x2a)));
    }

    #[test]
    fn test_select_skips_adax_without_manufacturer_data() {
        let mut silent = adax_device("AA:AA", 0);
        silent.manufacturer_data.clear();
        let devices = vec![silent, adax_device("BB:BB", 0)];

        let found = select_available_device(&devices).unwrap();
        assert_eq!(found.map(|(address, _)| address), Some("BB:BB".to_string()));
    }

    #[test]
    fn test_first_adax_heater_decides() {
        let devices = vec![adax_device("AA:AA", 0b01), adax_device("BB:BB", 0)];
        assert!(matches!(
            select_available_device(&devices),
            Err(AdaxError::HeaterNotAvailable)
        ));
    }

    #[test]
    fn test_select_nothing() {
        assert_eq!(select_available_device(&[]).unwrap(), None);
    }

    #[test]
    fn test_default_options() {
        let options = ProvisioningOptions::default();
        assert_eq!(options.scan_timeout, Duration::from_secs(60));
        assert_eq!(options.scan_retries, 1);
        assert_eq!(options.poll_attempts, 20);
    }
}
