//! Snapshot types published by the samplers and the aggregated response.
//!
//! Every snapshot is a plain value: the zero value means "no successful
//! read yet", anything else was computed entirely within one tick.

use serde::{Deserialize, Serialize};

const KB_PER_GB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        100.0 * part / whole
    } else {
        0.0
    }
}

/// Aggregate CPU busy percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuUtilization {
    /// Busy time as a percentage of elapsed time (0.0 to 100.0)
    pub pct: f64,
}

/// CPU package power draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuPower {
    /// Average package power over the last interval, in watts
    pub watts: f64,
}

/// System memory usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RamUsage {
    /// Total memory in GiB
    pub total_gb: f64,
    /// Used memory (total minus available) in GiB
    pub used_gb: f64,
    /// Available memory in GiB
    pub avail_gb: f64,
    /// Used memory percentage (0.0 to 100.0)
    pub used_pct: f64,
}

impl RamUsage {
    /// Build a snapshot from `MemTotal` and `MemAvailable` values in kB.
    pub fn from_kb(total_kb: u64, avail_kb: u64) -> Self {
        let total_gb = total_kb as f64 / KB_PER_GB;
        let avail_gb = avail_kb as f64 / KB_PER_GB;
        let used_gb = total_gb - avail_gb;

        Self {
            total_gb,
            used_gb,
            avail_gb,
            used_pct: percent_of(used_gb, total_gb),
        }
    }
}

/// GPU busy percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuUtilization {
    /// Busy percentage as reported by the driver
    pub pct: f64,
}

/// GPU video memory usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuVram {
    /// Total VRAM in GiB
    pub total_gb: f64,
    /// Used VRAM in GiB
    pub used_gb: f64,
    /// Used VRAM percentage (0.0 to 100.0)
    pub used_pct: f64,
}

impl GpuVram {
    /// Build a snapshot from used and total byte counts.
    pub fn from_bytes(used_bytes: u64, total_bytes: u64) -> Self {
        let used_gb = used_bytes as f64 / BYTES_PER_GB;
        let total_gb = total_bytes as f64 / BYTES_PER_GB;

        Self {
            total_gb,
            used_gb,
            used_pct: percent_of(used_gb, total_gb),
        }
    }
}

/// Chip temperatures and GPU power reported by the hardware-monitoring command.
///
/// Each field is 0.0 when its chip or sub-feature was not present in the
/// most recent successful report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub cpu_temp_c: f64,
    pub gpu_edge_c: f64,
    pub gpu_hotspot_c: f64,
    pub gpu_vram_temp_c: f64,
    pub gpu_power_w: f64,
}

/// The aggregated response served to clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub cpu: CpuMetrics,
    pub ram: RamMetrics,
    pub gpu: GpuMetrics,
}

/// CPU group of [`MetricsResponse`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    pub temp_c: f64,
    pub util_pct: f64,
    pub power_w: f64,
}

/// RAM group of [`MetricsResponse`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RamMetrics {
    pub total_gb: f64,
    pub used_gb: f64,
    pub avail_gb: f64,
    pub used_pct: f64,
}

impl From<RamUsage> for RamMetrics {
    fn from(ram: RamUsage) -> Self {
        Self {
            total_gb: ram.total_gb,
            used_gb: ram.used_gb,
            avail_gb: ram.avail_gb,
            used_pct: ram.used_pct,
        }
    }
}

/// GPU group of [`MetricsResponse`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuMetrics {
    pub edge_c: f64,
    pub hotspot_c: f64,
    pub vram_c: f64,
    pub vram_used_gb: f64,
    pub vram_total_gb: f64,
    pub vram_used_pct: f64,
    pub power_w: f64,
    pub util_pct: f64,
}

impl MetricsResponse {
    /// Assemble a response from one snapshot of every sampler.
    pub fn assemble(
        cpu_util: CpuUtilization,
        cpu_power: CpuPower,
        ram: RamUsage,
        gpu_util: GpuUtilization,
        vram: GpuVram,
        sensors: SensorReadings,
    ) -> Self {
        Self {
            cpu: CpuMetrics {
                temp_c: sensors.cpu_temp_c,
                util_pct: cpu_util.pct,
                power_w: cpu_power.watts,
            },
            ram: ram.into(),
            gpu: GpuMetrics {
                edge_c: sensors.gpu_edge_c,
                hotspot_c: sensors.gpu_hotspot_c,
                vram_c: sensors.gpu_vram_temp_c,
                vram_used_gb: vram.used_gb,
                vram_total_gb: vram.total_gb,
                vram_used_pct: vram.used_pct,
                power_w: sensors.gpu_power_w,
                util_pct: gpu_util.pct,
            },
        }
    }
}
