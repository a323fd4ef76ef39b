use crate::core::client::{AdaxClient, DEFAULT_TIMEOUT};
use crate::core::provisioning::ProvisioningOptions;
use crate::utils::error::{AdaxError, Result};
use crate::utils::token::AccessToken;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub heater: HeaterConfig,
    #[serde(default)]
    pub wifi: WifiConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaterConfig {
    pub ip: Option<String>,
    pub access_token: Option<String>,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub accept_invalid_certs: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: Option<String>,
    pub psk: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    pub scan_timeout_seconds: Option<u64>,
    pub scan_retries: Option<u32>,
    pub poll_attempts: Option<u32>,
    pub poll_interval_ms: Option<u64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdaxError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AdaxError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ADAX_TOKEN})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AdaxError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn provisioning_options(&self) -> ProvisioningOptions {
        let defaults = ProvisioningOptions::default();
        let p = &self.provisioning;
        ProvisioningOptions {
            scan_timeout: p
                .scan_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.scan_timeout),
            scan_retries: p.scan_retries.unwrap_or(defaults.scan_retries),
            poll_attempts: p.poll_attempts.unwrap_or(defaults.poll_attempts),
            poll_interval: p
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        }
    }
}

impl HeaterConfig {
    pub fn timeout(&self) -> Duration {
        self.timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// 需要 ip 與 access_token 才能建立 HTTP 客戶端
    pub fn build_client(&self) -> Result<AdaxClient> {
        let ip = validation::validate_required_field("heater.ip", &self.ip)?;
        let ip = validation::validate_ipv4("heater.ip", ip)?;
        let token = validation::validate_required_field("heater.access_token", &self.access_token)?;
        validation::validate_non_empty_string("heater.access_token", token)?;

        let mut builder = AdaxClient::builder(ip.to_string(), AccessToken::from(token.as_str()))
            .timeout(self.timeout())
            .accept_invalid_certs(self.accept_invalid_certs.unwrap_or(true));
        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url.clone());
        }
        builder.build()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(ip) = &self.heater.ip {
            validation::validate_ipv4("heater.ip", ip)?;
        }
        if let Some(base_url) = &self.heater.base_url {
            validation::validate_url("heater.base_url", base_url)?;
        }
        if let Some(timeout) = self.heater.timeout_seconds {
            validation::validate_positive_number("heater.timeout_seconds", timeout, 1)?;
        }
        if let Some(ssid) = &self.wifi.ssid {
            validation::validate_non_empty_string("wifi.ssid", ssid)?;
        }
        if let Some(scan_timeout) = self.provisioning.scan_timeout_seconds {
            validation::validate_positive_number(
                "provisioning.scan_timeout_seconds",
                scan_timeout,
                1,
            )?;
        }
        if let Some(attempts) = self.provisioning.poll_attempts {
            validation::validate_positive_number(
                "provisioning.poll_attempts",
                u64::from(attempts),
                1,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.heater.ip.is_none());
        assert_eq!(config.heater.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.provisioning_options(), ProvisioningOptions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ADAX_LOCAL_TEST_TOKEN", "cafebabe");
        let config = TomlConfig::from_toml_str(
            r#"
[heater]
ip = "10.0.0.2"
access_token = "${ADAX_LOCAL_TEST_TOKEN}"
base_url = "${ADAX_LOCAL_TEST_UNSET_VAR}"
"#,
        )
        .unwrap();

        assert_eq!(config.heater.access_token.as_deref(), Some("cafebabe"));
        assert_eq!(
            config.heater.base_url.as_deref(),
            Some("${ADAX_LOCAL_TEST_UNSET_VAR}")
        );
    }

    #[test]
    fn test_provisioning_options_from_file() {
        let config = TomlConfig::from_toml_str(
            r#"
[provisioning]
scan_timeout_seconds = 10
poll_interval_ms = 250
"#,
        )
        .unwrap();

        let options = config.provisioning_options();
        assert_eq!(options.scan_timeout, Duration::from_secs(10));
        assert_eq!(options.poll_interval, Duration::from_millis(250));
        assert_eq!(options.scan_retries, 1);
        assert_eq!(options.poll_attempts, 20);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TomlConfig::default();
        config.heater.ip = Some("not-an-ip".to_string());
        assert!(config.validate().is_err());

        let mut config = TomlConfig::default();
        config.provisioning.poll_attempts = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_client_requires_token() {
        let heater = HeaterConfig {
            ip: Some("10.0.0.2".to_string()),
            ..Default::default()
        };
        match heater.build_client() {
            Err(AdaxError::MissingConfigError { field }) => {
                assert_eq!(field, "heater.access_token")
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.url().to_string())),
        }
    }

    #[test]
    fn test_parse_error_is_config_error() {
        assert!(matches!(
            TomlConfig::from_toml_str("[heater\nip = 1"),
            Err(AdaxError::ConfigError { .. })
        ));
    }
}
