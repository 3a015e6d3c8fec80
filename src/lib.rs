//! # Sensor Panel - Host Hardware Telemetry
//!
//! Background samplers for host hardware telemetry with a small JSON web
//! interface. Each metric family is refreshed by its own task on a fixed
//! interval; requests read the latest published values without touching
//! the hardware.
//!
//! ## Metric families
//!
//! - **CPU utilization**: busy percentage from `/proc/stat` deltas
//! - **CPU power**: package watts from the power-capping energy counter
//! - **System RAM**: total/used/available from `/proc/meminfo`
//! - **GPU utilization and VRAM**: DRM device attributes
//! - **Chip sensors**: CPU/GPU temperatures and GPU power via `sensors -j`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sensor_panel::{start_web_server, SamplerConfig, SensorHub, WebConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = Arc::new(SensorHub::start(&SamplerConfig::default())?);
//!     println!("{:?}", hub.metrics());
//!
//!     start_web_server(WebConfig::default(), hub).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod metrics;
pub mod web;

// Re-export public API
pub use error::{Result, SensorError};
pub use metrics::{
    collector::{HardwareSupport, SensorHub},
    config::SamplerConfig,
    data::{
        CpuPower, CpuUtilization, GpuUtilization, GpuVram, MetricsResponse, RamUsage,
        SensorReadings,
    },
    sampler::Sampler,
    traits::Probe,
};

pub use web::{start_web_server, WebConfig};

/// The default sampling interval in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 9070;
