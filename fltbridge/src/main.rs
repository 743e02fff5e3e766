/*!
# Flight Simulator Bridge

Polls live aircraft telemetry and re-broadcasts it as X-Plane style `XGPS1`
and `XATT1` UDP sentences, so moving-map apps (FltPlan Go, ForeFlight and
friends) can follow the simulated aircraft.

## Features

- Position sentence at 1 Hz, attitude sentence at the update rate (default 5 Hz)
- Junk-value filtering with last-known-good fallback per variable
- Fan-out to any number of receivers from one socket
- Built-in synthetic flight and JSON Lines replay sources
- TOML configuration with command-line overrides

## Usage

### Send to one tablet
```bash
fltbridge 192.168.1.20
```

### Several receivers, custom rate
```bash
fltbridge 192.168.1.20 192.168.1.21:49003 --rate 10
```

### Replay a recording
```bash
fltbridge --source replay --replay flight.jsonl 192.168.1.20
```

### Generate a configuration file
```bash
fltbridge config --output fltbridge.toml
```
*/

use chrono::Local;
use clap::{Parser, Subcommand};
use shared::{BridgeError, OrbitParams, ReplaySource, SyntheticSource, TelemetrySource};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{info, Level};

mod broadcaster;
mod config;
mod scheduler;

use broadcaster::{Broadcaster, Destination};
use config::{AppConfig, BridgeConfig, SourceKind};
use scheduler::{StopReason, UpdateCycle, UpdateScheduler};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_PATH: &str = "fltbridge.toml";

#[derive(Parser)]
#[command(name = "fltbridge")]
#[command(about = "Broadcast flight simulator telemetry as X-Plane XGPS/XATT sentences")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Receiver addresses (host or host:port)
    destinations: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// UDP port for receivers given without one
    #[arg(short, long)]
    port: Option<u16>,

    /// Update rate in Hz (attitude sentences per second)
    #[arg(short, long)]
    rate: Option<u32>,

    /// Telemetry source
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// JSON Lines recording for the replay source
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Allow broadcast destination addresses
    #[arg(long)]
    broadcast: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    // Logging goes to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match &cli.command {
        Some(Commands::Config { output }) => generate_config_file(output),
        None => run_bridge(&cli),
    }
}

/// Load the configuration file, if any
fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => AppConfig::load_from_file(DEFAULT_CONFIG_PATH),
        None => Ok(AppConfig::new()),
    }
}

/// Command-line values win over the file
fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if !cli.destinations.is_empty() {
        config.bridge.destinations = cli.destinations.clone();
    }
    if let Some(port) = cli.port {
        config.bridge.port = port;
    }
    if let Some(rate) = cli.rate {
        config.bridge.update_rate_hz = rate;
    }
    if let Some(kind) = cli.source {
        config.source.kind = kind;
    }
    if let Some(replay) = &cli.replay {
        config.source.replay_file = Some(replay.display().to_string());
        if cli.source.is_none() {
            config.source.kind = SourceKind::Replay;
        }
    }
    if cli.broadcast {
        config.bridge.enable_broadcast = true;
    }
}

/// Resolve every configured receiver. At least one is required.
fn resolve_destinations(bridge: &BridgeConfig) -> shared::Result<Vec<Destination>> {
    if bridge.destinations.is_empty() {
        return Err(BridgeError::config("a destination address is required"));
    }

    bridge
        .destinations
        .iter()
        .map(|spec| Destination::parse(spec, bridge.port))
        .collect()
}

/// Open the configured telemetry source
fn connect_source(config: &AppConfig, period: Duration) -> shared::Result<Box<dyn TelemetrySource>> {
    match config.source.kind {
        SourceKind::Synthetic => {
            let params = OrbitParams {
                step: period,
                ..OrbitParams::default()
            };
            Ok(Box::new(SyntheticSource::connect(params, config.source.glitch_every)))
        }
        SourceKind::Replay => {
            let path = config
                .source
                .replay_file
                .as_deref()
                .ok_or_else(|| BridgeError::config("the replay source needs a replay file"))?;
            Ok(Box::new(ReplaySource::open(path)?))
        }
    }
}

/// Run the bridge until stopped
fn run_bridge(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, cli);

    // Everything that can be checked without touching the network or the
    // simulator is checked first
    let destinations = resolve_destinations(&config.bridge)?;
    let period = UpdateCycle::new(config.bridge.update_rate_hz)?.period();

    println!("🚀 Starting fltbridge ({})", Local::now().format("%Y-%m-%d %H:%M:%S"));
    for destination in &destinations {
        println!("📡 Receiver: {}", destination);
    }
    println!("⏱️ Update rate: {} Hz", config.bridge.update_rate_hz);
    println!("🛩️ Source: {:?}", config.source.kind);

    let socket = broadcaster::bind_socket(&config.bridge.bind_addr, config.bridge.enable_broadcast)?;
    let broadcaster = Broadcaster::new(socket, destinations)?;

    let source = connect_source(&config, period)?;
    let mut scheduler = UpdateScheduler::new(source, broadcaster, config.bridge.update_rate_hz)?
        .with_stats_interval(config.bridge.stats_interval_seconds);

    // Set up Ctrl+C handler
    let running = scheduler.get_running_flag();
    ctrlc::set_handler(move || {
        println!("\n🛑 Received Ctrl+C, shutting down gracefully...");
        running.store(false, Ordering::SeqCst);
    })?;

    match scheduler.run() {
        Ok(reason) => {
            let last = scheduler.last_sample();
            info!("Sent {} ticks, last position {:.5},{:.5} at {:.0} m",
                  scheduler.stats().ticks, last.latitude, last.longitude, last.altitude_m);
            match reason {
                StopReason::Requested => println!("✅ Bridge stopped"),
                StopReason::SourceClosed => println!("✅ Simulator disconnected, bridge stopped"),
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Bridge failed: {}", e);
            Err(e.into())
        }
    }
}

/// Generate a default configuration file
fn generate_config_file(output_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::new();
    config.save_to_file(output_path)?;

    println!("✅ Generated configuration file: {}", output_path.display());
    println!("📝 Add receivers under [bridge] destinations, then run:");
    println!("   fltbridge --config {}", output_path.display());

    Ok(())
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
    fn test_cli_destinations_and_overrides() {
        let cli = Cli::parse_from(["fltbridge", "10.0.0.1", "10.0.0.2:49003", "--rate", "10", "--broadcast"]);
        let mut config = AppConfig::new();
        config.bridge.destinations = vec!["192.168.1.99".to_string()];
        apply_overrides(&mut config, &cli);

        assert_eq!(config.bridge.destinations, vec!["10.0.0.1", "10.0.0.2:49003"]);
        assert_eq!(config.bridge.update_rate_hz, 10);
        assert!(config.bridge.enable_broadcast);

        let destinations = resolve_destinations(&config.bridge).unwrap();
        assert_eq!(destinations[0].addr, "10.0.0.1:49002".parse().unwrap());
        assert_eq!(destinations[1].addr, "10.0.0.2:49003".parse().unwrap());
    }

    #[test]
    fn test_replay_flag_selects_replay_source() {
        let cli = Cli::parse_from(["fltbridge", "--replay", "flight.jsonl", "10.0.0.1"]);
        let mut config = AppConfig::new();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.source.kind, SourceKind::Replay);
        assert_eq!(config.source.replay_file.as_deref(), Some("flight.jsonl"));
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::parse_from(["fltbridge", "config", "--output", "out.toml"]);
        assert!(matches!(cli.command, Some(Commands::Config { ref output }) if output == Path::new("out.toml")));
    }

    #[test]
    fn test_no_destination_fails_before_connecting() {
        // A replay source pointing nowhere would fail differently if it were opened
        let cli = Cli::parse_from(["fltbridge", "--replay", "/nonexistent/flight.jsonl"]);
        let err = run_bridge(&cli).unwrap_err();
        assert!(err.to_string().contains("a destination address is required"));
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let cli = Cli::parse_from(["fltbridge", "--rate", "0", "10.0.0.1"]);
        let err = run_bridge(&cli).unwrap_err();
        assert!(err.to_string().contains("at least 1 Hz"));
    }

    #[test]
    fn test_connect_source() {
        let config = AppConfig::new();
        let source = connect_source(&config, Duration::from_millis(200)).unwrap();
        assert!(source.is_live());

        let mut config = AppConfig::new();
        config.source.kind = SourceKind::Replay;
        assert!(matches!(
            connect_source(&config, Duration::from_millis(200)),
            Err(BridgeError::Config(_))
        ));
    }
}
