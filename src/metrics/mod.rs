//! Hardware telemetry sampling.
//!
//! Each metric family has a pure raw-source parser, a [`Probe`] that does
//! one tick of I/O, and a [`Sampler`] that runs the probe in the background
//! and publishes its latest snapshot. [`SensorHub`] owns one sampler per
//! family and assembles the served response.

pub mod collector;
pub mod config;
pub mod cpu;
pub mod data;
pub mod gpu;
pub mod memory;
pub mod power;
pub mod sampler;
pub mod sensors;
pub mod traits;

// Re-export commonly used items
pub use collector::{HardwareSupport, SensorHub};
pub use config::SamplerConfig;
pub use data::MetricsResponse;
pub use sampler::Sampler;
pub use traits::Probe;
