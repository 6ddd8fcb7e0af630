//! `viera` - remote control for Panasonic Viera televisions
//!
//! Settings come from flags, `VIERA_*` environment variables or a JSON config
//! file with the same fields the bridge uses.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use viera_sdk::viera_api::{KeyCode, VieraClient, VieraKey};
use viera_sdk::{
    host, init_logging, init_logging_from_env, DeviceController, LoggingMode, PollingTask, StateSink,
    StateValue, VieraConfig,
};

#[derive(Debug, Parser)]
#[command(name = "viera", version, about = "Remote control for Panasonic Viera televisions")]
struct Cli {
    /// IPv4 address of the television
    #[arg(long, env = "VIERA_IP")]
    ip: Option<String>,

    /// Application id from pairing
    #[arg(long, env = "VIERA_APP_ID")]
    app_id: Option<String>,

    /// Encryption key from pairing
    #[arg(long, env = "VIERA_ENCRYPTION_KEY", hide_env_values = true)]
    encryption_key: Option<String>,

    /// JSON config file; flags override its values
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Press a remote button, e.g. `power`, `VOLUP` or `30s_skip`
    Key { code: String },
    /// List the known buttons and their host state ids
    Keys,
    /// Show the volume, or set it and show the result
    Volume { value: Option<i64> },
    /// Show mute, or set it (`on`/`off`) and show the result
    Mute {
        #[arg(value_parser = parse_switch)]
        state: Option<bool>,
    },
    /// Run one status check and print the report
    Status,
    /// Poll until interrupted, printing every state update
    Watch {
        /// Seconds between checks
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

/// Prints each update as a JSON line
struct PrintSink;

impl StateSink for PrintSink {
    fn set_value(&self, key: &str, value: StateValue, ack: bool) {
        println!("{}", serde_json::json!({ "key": key, "value": value, "ack": ack }));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.verbose {
        0 => init_logging_from_env(LoggingMode::Silent)?,
        1 => init_logging(LoggingMode::Development)?,
        _ => init_logging(LoggingMode::Debug)?,
    }

    if let CliCommand::Keys = cli.command {
        for key in VieraKey::ALL {
            println!("{:<12} {}", key.code(), host::state_id(*key));
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    config.validate().context("invalid configuration")?;

    match cli.command {
        CliCommand::Keys => {}
        CliCommand::Key { code } => {
            let client = client(&config)?;
            let key = match code.parse::<VieraKey>() {
                Ok(key) => KeyCode::from(key),
                Err(_) => {
                    warn!(%code, "not a known key, sending as is");
                    KeyCode::from(code)
                }
            };
            client.send_key(key.clone()).await.context("key press failed")?;
            println!("sent {}", key);
        }
        CliCommand::Volume { value } => {
            let client = client(&config)?;
            if let Some(value) = value {
                client.set_volume(value).await.context("setVolume failed")?;
            }
            println!("{}", client.get_volume().await.context("getVolume failed")?);
        }
        CliCommand::Mute { state } => {
            let client = client(&config)?;
            if let Some(state) = state {
                client.set_mute(state).await.context("setMute failed")?;
            }
            println!("{}", client.get_mute().await.context("getMute failed")?);
        }
        CliCommand::Status => {
            let controller = DeviceController::from_config(&config, Arc::new(PrintSink))?;
            let report = controller.check_status().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        CliCommand::Watch { interval_secs } => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.poll_interval());
            if interval.is_zero() {
                bail!("interval must be greater than 0");
            }

            let controller = Arc::new(DeviceController::from_config(&config, Arc::new(PrintSink))?);
            let polling = PollingTask::start(controller, interval);
            info!(?interval, "watching, press Ctrl+C to stop");

            tokio::signal::ctrl_c().await.context("failed to listen for Ctrl+C")?;
            polling.shutdown().await;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<VieraConfig> {
    let mut config = match (&cli.config, &cli.ip) {
        (Some(path), _) => VieraConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        (None, Some(ip)) => VieraConfig::new(ip.clone()),
        (None, None) => bail!("pass --ip, set VIERA_IP or use --config"),
    };

    if let Some(ip) = &cli.ip {
        config.ip = ip.clone();
    }
    if cli.app_id.is_some() {
        config.app_id = cli.app_id.clone();
    }
    if cli.encryption_key.is_some() {
        config.encryption_key = cli.encryption_key.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }

    Ok(config)
}

fn client(config: &VieraConfig) -> anyhow::Result<VieraClient> {
    Ok(VieraClient::with_timeout(config.endpoint()?, config.request_timeout())?)
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => Err(format!("expected on or off, got {:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("ON"), Ok(true));
        assert_eq!(parse_switch("0"), Ok(false));
        assert!(parse_switch("maybe").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "viera",
            "--ip",
            "10.0.0.9",
            "--timeout-ms",
            "1500",
            "volume",
            "20",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.ip, "10.0.0.9");
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));
        assert!(matches!(cli.command, CliCommand::Volume { value: Some(20) }));
    }
}
