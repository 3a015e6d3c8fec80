//! Sensor Panel - Host Hardware Telemetry Binary
//!
//! Runs the background samplers and serves their latest readings over HTTP.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use sensor_panel::{
    start_web_server, MetricsResponse, SamplerConfig, SensorHub, WebConfig, DEFAULT_INTERVAL_MS,
    DEFAULT_WEB_PORT,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;
use tracing::{info, Level};
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "sensor_panel")]
#[command(about = "Sensor Panel - Host Hardware Telemetry")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Samples CPU, RAM, GPU and chip sensors in the background and serves the latest readings as JSON")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Web server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Sampling interval in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_INTERVAL_MS)]
    interval: u64,

    /// Hardware-monitoring command printing a JSON chip report
    #[arg(long, default_value = "sensors -j")]
    sensors_command: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default)
    Serve(ServeArgs),

    /// Sample for two intervals, print one reading and exit
    Snapshot(SnapshotArgs),

    /// Show host details and which sensors were discovered
    Info,
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Static files directory (optional)
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// HTML page to serve at / instead of the static directory's index.html
    #[arg(long)]
    index_file: Option<PathBuf>,

    /// Answer 404 at / when no dashboard page exists on disk
    #[arg(long)]
    no_dashboard: bool,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Serve(args)) => serve_command(&cli, args).await?,
        Some(Commands::Snapshot(args)) => snapshot_command(&cli, args).await?,
        Some(Commands::Info) => info_command(&cli).await?,
        None => serve_command(&cli, &ServeArgs::default()).await?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    tracing::subscriber::set_global_default(log_subscriber(cli))?;
    Ok(())
}

/// `RUST_LOG` directives win; otherwise the level comes from the flags.
fn log_subscriber(cli: &Cli) -> impl tracing::Subscriber + Send + Sync + 'static {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish()
}

fn sampler_config(cli: &Cli) -> anyhow::Result<SamplerConfig> {
    if cli.interval == 0 {
        bail!("--interval must be greater than zero");
    }

    let mut words = cli.sensors_command.split_whitespace();
    let program = words
        .next()
        .context("--sensors-command must name a program")?;

    Ok(SamplerConfig::default()
        .with_interval_ms(cli.interval)
        .with_sensors_command(program, words))
}

fn web_config(cli: &Cli, args: &ServeArgs) -> WebConfig {
    let mut config = WebConfig::new(&cli.host, cli.port)
        .with_cors(!args.no_cors)
        .with_builtin_dashboard(!args.no_dashboard);
    if let Some(static_dir) = &args.static_dir {
        config = config.with_static_path(Some(static_dir.clone()));
    }
    if let Some(index_file) = &args.index_file {
        config = config.with_index_file(index_file);
    }
    config
}

async fn serve_command(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    info!("Starting sensor panel...");

    let hub = Arc::new(SensorHub::start(&sampler_config(cli)?)?);
    info!("Started samplers with {}ms interval", cli.interval);

    let web_config = web_config(cli, args);

    info!("Web server configuration:");
    info!("  - Bind address: {}", web_config.bind_address());
    info!("  - CORS enabled: {}", web_config.enable_cors);

    start_web_server(web_config, hub).await?;

    Ok(())
}

async fn snapshot_command(cli: &Cli, args: &SnapshotArgs) -> anyhow::Result<()> {
    if args.format != "json" && args.format != "pretty" {
        bail!("Unsupported format: {}. Use 'json' or 'pretty'", args.format);
    }

    let config = sampler_config(cli)?;
    let hub = SensorHub::start(&config)?;

    // Delta-based samplers need a baseline tick and one more.
    tokio::time::sleep(config.interval() * 2 + Duration::from_millis(100)).await;
    let metrics = hub.metrics();
    hub.shutdown().await;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print_pretty_metrics(&metrics);
    }

    Ok(())
}

async fn info_command(cli: &Cli) -> anyhow::Result<()> {
    println!("Sensor Panel Host Information");
    println!("=============================");
    println!();

    let system = System::new_all();
    println!("System Details:");
    println!(
        "  Hostname: {}",
        System::host_name().unwrap_or_else(|| "unknown".to_string())
    );
    println!(
        "  OS: {} {}",
        System::name().unwrap_or_else(|| "unknown".to_string()),
        System::os_version().unwrap_or_default()
    );
    println!(
        "  Kernel: {}",
        System::kernel_version().unwrap_or_else(|| "unknown".to_string())
    );
    println!(
        "  CPU: {} ({} logical cores)",
        system
            .cpus()
            .first()
            .map(|cpu| cpu.brand().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        system.cpus().len()
    );
    println!(
        "  Memory: {:.1} GB total",
        system.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0
    );
    println!();

    let hub = SensorHub::start(&sampler_config(cli)?)?;
    let hardware = hub.hardware();
    hub.shutdown().await;

    let mark = |found: bool| if found { "✓" } else { "✗" };
    println!("Discovered sensors:");
    println!("  - CPU package energy counter: {}", mark(hardware.cpu_power));
    println!("  - GPU busy percentage: {}", mark(hardware.gpu_util));
    println!("  - GPU VRAM usage: {}", mark(hardware.gpu_vram));
    println!("  - Chip sensors command: {}", cli.sensors_command);

    Ok(())
}

fn print_pretty_metrics(metrics: &MetricsResponse) {
    println!(
        "Sensor Snapshot ({})",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");
    println!();

    println!("CPU:");
    println!("  Usage: {:.1}%", metrics.cpu.util_pct);
    println!("  Temperature: {:.1}°C", metrics.cpu.temp_c);
    println!("  Power: {:.1} W", metrics.cpu.power_w);
    println!();

    println!("Memory:");
    println!("  Total: {:.1} GB", metrics.ram.total_gb);
    println!("  Used: {:.1} GB ({:.1}%)", metrics.ram.used_gb, metrics.ram.used_pct);
    println!("  Available: {:.1} GB", metrics.ram.avail_gb);
    println!();

    println!("GPU:");
    println!("  Usage: {:.1}%", metrics.gpu.util_pct);
    println!(
        "  Temperatures: edge {:.1}°C, hotspot {:.1}°C, VRAM {:.1}°C",
        metrics.gpu.edge_c, metrics.gpu.hotspot_c, metrics.gpu.vram_c
    );
    println!(
        "  VRAM: {:.2} / {:.2} GB ({:.1}%)",
        metrics.gpu.vram_used_gb, metrics.gpu.vram_total_gb, metrics.gpu.vram_used_pct
    );
    println!("  Power: {:.1} W", metrics.gpu.power_w);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["sensor_panel", "--port", "9090"]).unwrap();
        assert_eq!(cli.port, 9090);
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["sensor_panel"]).unwrap();
        assert_eq!(cli.port, DEFAULT_WEB_PORT);
        assert_eq!(cli.interval, DEFAULT_INTERVAL_MS);
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.sensors_command, "sensors -j");
    }

    #[test]
    fn test_sensors_command_split() {
        let cli = Cli::try_parse_from([
            "sensor_panel",
            "--sensors-command",
            "/usr/bin/sensors -j -A",
        ])
        .unwrap();
        let config = sampler_config(&cli).unwrap();
        assert_eq!(config.sensors_program, "/usr/bin/sensors");
        assert_eq!(config.sensors_args, vec!["-j", "-A"]);
    }

    /// Which levels the subscriber built for `args` lets through.
    fn enabled_levels(args: &[&str]) -> (bool, bool, bool) {
        std::env::remove_var("RUST_LOG");
        let cli = Cli::try_parse_from(args).unwrap();
        tracing::subscriber::with_default(log_subscriber(&cli), || {
            (
                tracing::enabled!(Level::DEBUG),
                tracing::enabled!(Level::INFO),
                tracing::enabled!(Level::WARN),
            )
        })
    }

    #[test]
    fn test_log_level_from_flags() {
        assert_eq!(enabled_levels(&["sensor_panel", "--debug"]), (true, true, true));
        assert_eq!(enabled_levels(&["sensor_panel", "--verbose"]), (false, true, true));
        assert_eq!(enabled_levels(&["sensor_panel"]), (false, false, true));
    }

    #[test]
    fn test_serve_dashboard_flags() {
        let cli = Cli::try_parse_from([
            "sensor_panel",
            "serve",
            "--static-dir",
            "/srv/panel",
            "--index-file",
            "/srv/panel/wide.html",
            "--no-dashboard",
        ])
        .unwrap();
        let Some(Commands::Serve(args)) = &cli.command else {
            panic!("expected serve subcommand");
        };
        let config = web_config(&cli, args);
        assert_eq!(config.static_path, Some(PathBuf::from("/srv/panel")));
        assert_eq!(config.index_file, Some(PathBuf::from("/srv/panel/wide.html")));
        assert!(!config.builtin_dashboard);
        assert!(config.enable_cors);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let cli = Cli::try_parse_from(["sensor_panel", "--interval", "0"]).unwrap();
        assert!(sampler_config(&cli).is_err());
    }
}
