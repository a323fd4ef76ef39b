pub mod client;
pub mod protocol;
pub mod provisioning;

pub use crate::domain::model::{DiscoveredDevice, HeaterStatus, ProvisioningOutcome};
pub use crate::domain::ports::{BleCentral, BleLink};
pub use crate::utils::error::Result;
