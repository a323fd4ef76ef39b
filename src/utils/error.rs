use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdaxError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Heater did not answer within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Unexpected heater response: {message}")]
    Protocol { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid WiFi credentials")]
    InvalidWifiCredentials,

    #[error("Command of {length} bytes does not fit in {max_chunks} BLE chunks")]
    CommandTooLong { length: usize, max_chunks: usize },

    #[error("Heater not available")]
    HeaterNotAvailable,

    #[error("Heater not found")]
    HeaterNotFound,

    #[error("Bluetooth error: {message}")]
    Bluetooth { message: String },

    #[error("Bluetooth support is not available in this build")]
    BluetoothUnavailable,
}

/// 錯誤分類，用於日誌與統計
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Device,
    Configuration,
    Bluetooth,
    System,
}

/// 錯誤嚴重程度，CLI 依此決定退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AdaxError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn bluetooth(message: impl std::fmt::Display) -> Self {
        Self::Bluetooth {
            message: message.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) | Self::Timeout { .. } => ErrorCategory::Network,
            Self::Protocol { .. }
            | Self::InvalidWifiCredentials
            | Self::HeaterNotAvailable
            | Self::HeaterNotFound => ErrorCategory::Device,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::CommandTooLong { .. } => ErrorCategory::Configuration,
            Self::Bluetooth { .. } | Self::BluetoothUnavailable => ErrorCategory::Bluetooth,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路與配對狀態通常重試即可
            Self::Http(_)
            | Self::Timeout { .. }
            | Self::HeaterNotFound
            | Self::HeaterNotAvailable => ErrorSeverity::Medium,
            Self::Protocol { .. }
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::CommandTooLong { .. }
            | Self::InvalidWifiCredentials
            | Self::SerializationError(_) => ErrorSeverity::High,
            Self::IoError(_) | Self::Bluetooth { .. } | Self::BluetoothUnavailable => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Http(_) => "Check that the heater is powered on and reachable on the local network",
            Self::Timeout { .. } => "Retry, or raise heater.timeout_seconds",
            Self::Protocol { .. } => "Check that the address points at an Adax heater",
            Self::IoError(_) => "Check file permissions and paths",
            Self::SerializationError(_) => "The heater answered with malformed JSON; retry",
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file or command line flags",
            Self::InvalidWifiCredentials => "Check the WiFi SSID and password and run configure again",
            Self::CommandTooLong { .. } => "Use a shorter WiFi SSID or password",
            Self::HeaterNotAvailable => {
                "The heater is already registered; reset it before configuring it again"
            }
            Self::HeaterNotFound => {
                "Press and hold the OK button on the heater until the blue led starts blinking"
            }
            Self::Bluetooth { .. } => "Check that Bluetooth is enabled on this machine",
            Self::BluetoothUnavailable => "Rebuild with `--features ble`",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not talk to the heater: {}", self),
            ErrorCategory::Device => format!("Heater problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Bluetooth => format!("Bluetooth problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdaxError>;
