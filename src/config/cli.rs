use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "adax-local")]
#[command(about = "Local control and BLE provisioning of Adax heaters", version)]
pub struct CliConfig {
    #[arg(long, global = true, env = "ADAX_CONFIG", help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print current and target temperature
    Status(HeaterArgs),
    /// Set the target temperature in degrees Celsius
    SetTarget {
        temperature: f64,
        #[command(flatten)]
        heater: HeaterArgs,
    },
    /// Send WiFi credentials to a heater in pairing mode
    Configure(WifiArgs),
    /// Print a freshly generated access token
    Token,
}

#[derive(Debug, Clone, Default, Args)]
pub struct HeaterArgs {
    #[arg(long, env = "ADAX_IP")]
    pub ip: Option<String>,

    #[arg(long, env = "ADAX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct WifiArgs {
    #[arg(long, env = "ADAX_WIFI_SSID")]
    pub ssid: Option<String>,

    #[arg(long, env = "ADAX_WIFI_PSK", hide_env_values = true)]
    pub psk: Option<String>,
}

impl CliConfig {
    /// 讀取設定檔，並以命令列參數覆寫
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        match &self.command {
            Command::Status(heater) | Command::SetTarget { heater, .. } => {
                heater.apply(&mut config);
            }
            Command::Configure(wifi) => wifi.apply(&mut config),
            Command::Token => {}
        }
        Ok(config)
    }
}

impl HeaterArgs {
    fn apply(&self, config: &mut TomlConfig) {
        if let Some(ip) = &self.ip {
            config.heater.ip = Some(ip.clone());
        }
        if let Some(token) = &self.token {
            config.heater.access_token = Some(token.clone());
        }
    }
}

impl WifiArgs {
    fn apply(&self, config: &mut TomlConfig) {
        if let Some(ssid) = &self.ssid {
            config.wifi.ssid = Some(ssid.clone());
        }
        if let Some(psk) = &self.psk {
            config.wifi.psk = Some(psk.clone());
        }
    }
}
