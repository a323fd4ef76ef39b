//! Adax BLE wire format: advertisement decoding, the join command and its
//! chunking, and command-characteristic notifications.

use crate::utils::error::{AdaxError, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::net::Ipv4Addr;
use uuid::Uuid;

pub const ADAX_DEVICE_TYPE_HEATER_BLE: u8 = 5;
pub const BLE_COMMAND_STATUS_OK: u8 = 0;
pub const BLE_COMMAND_STATUS_INVALID_WIFI: u8 = 1;
pub const MAX_BYTES_IN_COMMAND_CHUNK: usize = 17;
/// 分塊編號只有一個位元組
pub const MAX_COMMAND_CHUNKS: usize = u8::MAX as usize + 1;
pub const UUID_ADAX_BLE_SERVICE: Uuid = Uuid::from_u128(0x3885cc10_7c18_4ad4_a48d_bf11abf7cb92);
pub const UUID_ADAX_BLE_SERVICE_CHARACTERISTIC_COMMAND: Uuid =
    Uuid::from_u128(0x0000cc11_0000_1000_8000_00805f9b34fb);

/// 廣播中 type id + 狀態 + 8 位元組 MAC 的最小長度
pub const MIN_MANUFACTURER_DATA_LEN: usize = 10;

const STATUS_REGISTERED: u8 = 0x1 << 0;
const STATUS_MANAGED: u8 = 0x1 << 1;

// 字母數字與 `_.-~/` 以外的字元都要編碼
const COMMAND_VALUE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Manufacturer data flattened to bytes: the little-endian company id
/// followed by the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerData(Vec<u8>);

impl ManufacturerData {
    pub fn from_advertisement(company_id: u16, payload: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(payload.len() + 2);
        bytes.push((company_id % 256) as u8);
        bytes.push((company_id / 256) as u8);
        bytes.extend_from_slice(payload);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn mac_id(&self) -> u64 {
        find_mac_id(&self.0)
    }

    pub fn is_available(&self) -> bool {
        device_available(&self.0)
    }
}

impl From<Vec<u8>> for ManufacturerData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Big-endian MAC id from bytes 2..10 (fewer when the data is short).
pub fn find_mac_id(manufacturer_data: &[u8]) -> u64 {
    manufacturer_data
        .iter()
        .skip(2)
        .take(8)
        .fold(0u64, |mac_id, byte| (mac_id << 8) | u64::from(*byte))
}

/// A heater can be provisioned when it is a BLE heater with a MAC id that is
/// neither registered nor managed yet.
pub fn device_available(manufacturer_data: &[u8]) -> bool {
    if manufacturer_data.len() < MIN_MANUFACTURER_DATA_LEN {
        tracing::debug!(
            "Manufacturer data too short: {} bytes",
            manufacturer_data.len()
        );
        return false;
    }

    let type_id = manufacturer_data[0];
    let status_byte = manufacturer_data[1];
    let mac_id = find_mac_id(manufacturer_data);
    let registered = status_byte & STATUS_REGISTERED != 0;
    let managed = status_byte & STATUS_MANAGED != 0;
    tracing::debug!(
        "device_available mac_id={} type_id={} registered={} managed={}",
        mac_id,
        type_id,
        registered,
        managed
    );

    mac_id != 0 && type_id == ADAX_DEVICE_TYPE_HEATER_BLE && !registered && !managed
}

/// `command=join&ssid=..&psk=..&token=..` with every value percent-encoded.
pub fn encode_join_command(ssid: &str, psk: &str, token: &str) -> Vec<u8> {
    format!(
        "command=join&ssid={}&psk={}&token={}",
        utf8_percent_encode(ssid, COMMAND_VALUE_SET),
        utf8_percent_encode(psk, COMMAND_VALUE_SET),
        utf8_percent_encode(token, COMMAND_VALUE_SET),
    )
    .into_bytes()
}

/// Split a command into GATT writes: `[chunk_nr, is_last, payload..]` with at
/// most [`MAX_BYTES_IN_COMMAND_CHUNK`] payload bytes each. The chunk number is
/// a single byte, so a command needing more than [`MAX_COMMAND_CHUNKS`]
/// chunks is refused instead of wrapping around.
pub fn chunk_command(command: &[u8]) -> Result<Vec<Vec<u8>>> {
    let chunk_count = command.len().div_ceil(MAX_BYTES_IN_COMMAND_CHUNK);
    if chunk_count > MAX_COMMAND_CHUNKS {
        return Err(AdaxError::CommandTooLong {
            length: command.len(),
            max_chunks: MAX_COMMAND_CHUNKS,
        });
    }

    command
        .chunks(MAX_BYTES_IN_COMMAND_CHUNK)
        .enumerate()
        .map(|(chunk_nr, payload)| {
            let chunk_nr = u8::try_from(chunk_nr).map_err(|_| AdaxError::CommandTooLong {
                length: command.len(),
                max_chunks: MAX_COMMAND_CHUNKS,
            })?;
            let is_last = usize::from(chunk_nr) + 1 == chunk_count;
            let mut chunk = Vec::with_capacity(payload.len() + 2);
            chunk.push(chunk_nr);
            chunk.push(u8::from(is_last));
            chunk.extend_from_slice(payload);
            Ok(chunk)
        })
        .collect()
}

/// Notification received on the command characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Empty,
    InvalidWifi,
    Registered { ip: Ipv4Addr },
    Status { status: u8, bytes: Vec<u8> },
}

impl Notification {
    pub fn decode(data: &[u8]) -> Self {
        match data {
            [] => Notification::Empty,
            [BLE_COMMAND_STATUS_INVALID_WIFI, ..] => Notification::InvalidWifi,
            [BLE_COMMAND_STATUS_OK, a, b, c, d, ..] => Notification::Registered {
                ip: Ipv4Addr::new(*a, *b, *c, *d),
            },
            [status, ..] => Notification::Status {
                status: *status,
                bytes: data.to_vec(),
            },
        }
    }
}
