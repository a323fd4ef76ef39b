use crate::utils::token::AccessToken;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use uuid::Uuid;

/// Temperatures reported by a heater, in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeaterStatus {
    pub target_temperature: f64,
    pub current_temperature: f64,
}

/// 一筆 BLE 廣播
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub address: String,
    pub name: Option<String>,
    pub service_uuids: Vec<Uuid>,
    /// (company id, payload)，依 company id 由小到大排序
    pub manufacturer_data: Vec<(u16, Vec<u8>)>,
}

impl DiscoveredDevice {
    pub fn advertises_service(&self, service: Uuid) -> bool {
        self.service_uuids.contains(&service)
    }

    /// Collect manufacturer entries sorted by company id. BLE stacks hand
    /// them over as an unordered map.
    pub fn manufacturer_data_from_entries(
        entries: impl IntoIterator<Item = (u16, Vec<u8>)>,
    ) -> Vec<(u16, Vec<u8>)> {
        let mut manufacturer_data: Vec<_> = entries.into_iter().collect();
        manufacturer_data.sort_by_key(|(company_id, _)| *company_id);
        manufacturer_data
    }
}

/// Result of a successful BLE provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningOutcome {
    pub device_ip: Ipv4Addr,
    pub mac_id: u64,
    pub access_token: AccessToken,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_manufacturer_data_sorted_by_company_id() {
        let entries: HashMap<u16, Vec<u8>> = [
            (0x0105, vec![3]),
            (0x004c, vec![1]),
            (0x0005, vec![2]),
            (0xffff, vec![4]),
        ]
        .into_iter()
        .collect();

        let manufacturer_data = DiscoveredDevice::manufacturer_data_from_entries(entries);
        let company_ids: Vec<u16> = manufacturer_data.iter().map(|(id, _)| *id).collect();
        assert_eq!(company_ids, vec![0x0005, 0x004c, 0x0105, 0xffff]);
        assert_eq!(manufacturer_data[0].1, vec![2]);
    }

    #[test]
    fn test_manufacturer_data_from_no_entries() {
        assert!(DiscoveredDevice::manufacturer_data_from_entries(Vec::new()).is_empty());
    }
}
