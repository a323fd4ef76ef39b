use adax_local::config::{CliConfig, Command, TomlConfig};
use adax_local::utils::error::{AdaxError, ErrorSeverity};
use adax_local::utils::validation::{self, Validate};
use adax_local::utils::logger;
use adax_local::{AccessToken, Result};
use clap::Parser;

// Adax 熱水器可設定的溫度範圍
const MIN_TARGET_TEMPERATURE: f64 = 5.0;
const MAX_TARGET_TEMPERATURE: f64 = 35.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("Starting adax-local CLI");

    let result = match cli.resolve() {
        Ok(config) => match config.validate() {
            Ok(()) => run(&cli.command, &config).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::debug!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(command: &Command, config: &TomlConfig) -> Result<()> {
    match command {
        Command::Status(_) => {
            let client = config.heater.build_client()?;
            let status = client
                .get_status()
                .await?
                .ok_or_else(|| AdaxError::protocol("heater did not report its status"))?;
            println!("🌡️  Current temperature: {:.2} °C", status.current_temperature);
            println!("🎯 Target temperature:  {:.2} °C", status.target_temperature);
        }
        Command::SetTarget { temperature, .. } => {
            validation::validate_range(
                "temperature",
                *temperature,
                MIN_TARGET_TEMPERATURE,
                MAX_TARGET_TEMPERATURE,
            )?;
            let client = config.heater.build_client()?;
            let status = client.set_target_temperature(*temperature).await?;
            if status != 200 {
                return Err(AdaxError::protocol(format!("heater answered HTTP {}", status)));
            }
            println!("✅ Target temperature set to {:.2} °C", temperature);
        }
        Command::Configure(_) => configure(config).await?,
        Command::Token => println!("{}", AccessToken::generate()),
    }
    Ok(())
}

#[cfg(feature = "ble")]
async fn configure(config: &TomlConfig) -> Result<()> {
    use adax_local::{BtleplugCentral, DeviceProvisioner};

    let ssid = validation::validate_required_field("wifi.ssid", &config.wifi.ssid)?;
    let psk = validation::validate_required_field("wifi.psk", &config.wifi.psk)?;

    let central = BtleplugCentral::new().await?;
    let mut provisioner = DeviceProvisioner::new(central, ssid.as_str(), psk.as_str())
        .with_options(config.provisioning_options());

    println!("👉 Press and hold the OK button on the heater until the blue led starts blinking");
    if !provisioner.configure_device().await? {
        return Err(AdaxError::protocol("heater did not report an IP address"));
    }

    if let Some(outcome) = provisioner.outcome() {
        println!("✅ Heater configured");
        println!("📍 IP address:   {}", outcome.device_ip);
        println!("🔑 Access token: {}", outcome.access_token);
        println!("🆔 MAC id:       {:016x}", outcome.mac_id);
    }
    Ok(())
}

#[cfg(not(feature = "ble"))]
async fn configure(_config: &TomlConfig) -> Result<()> {
    Err(AdaxError::BluetoothUnavailable)
}
