pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "ble")]
pub use adapters::bluetooth::BtleplugCentral;

pub use config::TomlConfig;
pub use crate::core::{
    client::AdaxClient,
    provisioning::{DeviceProvisioner, ProvisioningOptions},
};
pub use domain::model::{HeaterStatus, ProvisioningOutcome};
pub use utils::error::{AdaxError, Result};
pub use utils::token::AccessToken;
