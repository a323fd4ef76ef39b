use crate::domain::model::HeaterStatus;
use crate::utils::error::{AdaxError, Result};
use crate::utils::token::AccessToken;
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Local HTTP API of a provisioned heater.
#[derive(Debug, Clone)]
pub struct AdaxClient {
    device_ip: String,
    url: String,
    authorization: String,
    timeout: Duration,
    client: Client,
}

#[derive(Debug, Clone)]
pub struct AdaxClientBuilder {
    device_ip: String,
    access_token: AccessToken,
    base_url: Option<String>,
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl AdaxClientBuilder {
    /// 覆寫 `https://<ip>/api`，例如測試或反向代理
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 熱水器使用自簽憑證，預設不驗證
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> Result<AdaxClient> {
        let client = Client::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .timeout(self.timeout)
            .build()?;

        let url = self
            .base_url
            .unwrap_or_else(|| format!("https://{}/api", self.device_ip));

        Ok(AdaxClient {
            device_ip: self.device_ip,
            url,
            authorization: format!("Basic {}", self.access_token),
            timeout: self.timeout,
            client,
        })
    }
}

impl AdaxClient {
    pub fn new(device_ip: impl Into<String>, access_token: AccessToken) -> Result<Self> {
        Self::builder(device_ip, access_token).build()
    }

    pub fn builder(device_ip: impl Into<String>, access_token: AccessToken) -> AdaxClientBuilder {
        AdaxClientBuilder {
            device_ip: device_ip.into(),
            access_token,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: true,
        }
    }

    pub fn device_ip(&self) -> &str {
        &self.device_ip
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Set the target temperature in degrees Celsius and return the HTTP
    /// status code. A non-200 answer is logged, not treated as an error.
    /// NaN and infinities are rejected before anything is sent.
    pub async fn set_target_temperature(&self, target_temperature: f64) -> Result<u16> {
        if !target_temperature.is_finite() {
            return Err(AdaxError::InvalidConfigValueError {
                field: "target_temperature".to_string(),
                value: target_temperature.to_string(),
                reason: "Temperature must be a finite number".to_string(),
            });
        }
        // 裝置以百分之一度為單位，小數部分直接截斷
        let value = (target_temperature * 100.0) as i64;
        let params = [
            ("command", "set_target".to_string()),
            ("time", unix_time().to_string()),
            ("value", value.to_string()),
        ];

        let response = self.send(&params).await?;
        let status = response.status();
        tracing::debug!("Heater response {}", status.as_u16());

        if status != StatusCode::OK {
            tracing::error!(
                "Failed to set target temperature {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            );
        }
        Ok(status.as_u16())
    }

    /// Read current and target temperature. Returns `None` when the heater
    /// answers with a non-200 status or does not answer in time.
    pub async fn get_status(&self) -> Result<Option<HeaterStatus>> {
        let body = match self.fetch_status_body().await {
            Ok(Some(body)) => body,
            Ok(None) => return Ok(None),
            Err(AdaxError::Timeout { .. }) => {
                tracing::warn!("Heater {} did not answer in time", self.device_ip);
                return Ok(None);
            }
            Err(AdaxError::Http(e)) if e.is_timeout() => {
                tracing::warn!("Heater {} did not answer in time", self.device_ip);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let json: serde_json::Value = serde_json::from_str(&body)?;
        tracing::debug!("Heater response {}", json);
        parse_status(&json).map(Some)
    }

    async fn fetch_status_body(&self) -> Result<Option<String>> {
        let params = [
            ("command", "stat".to_string()),
            ("time", unix_time().to_string()),
        ];

        let response = self.send(&params).await?;
        let status = response.status();
        if status != StatusCode::OK {
            tracing::error!(
                "Failed to get status {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            );
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }

    async fn send(&self, params: &[(&str, String)]) -> Result<reqwest::Response> {
        let request = self
            .client
            .get(&self.url)
            .query(params)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .send();

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) if e.is_timeout() => Err(self.timeout_error()),
            Ok(Err(e)) => Err(AdaxError::Http(e)),
            Err(_) => Err(self.timeout_error()),
        }
    }

    fn timeout_error(&self) -> AdaxError {
        AdaxError::Timeout {
            seconds: self.timeout.as_secs(),
        }
    }
}

fn unix_time() -> i64 {
    chrono::Utc::now().timestamp()
}

fn parse_status(json: &serde_json::Value) -> Result<HeaterStatus> {
    let field = |name: &str| {
        json.get(name)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| AdaxError::protocol(format!("missing numeric field '{}'", name)))
    };

    Ok(HeaterStatus {
        target_temperature: field("targTemp")? / 100.0,
        current_temperature: field("currTemp")? / 100.0,
    })
}
