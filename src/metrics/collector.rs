//! Sampler ownership, hardware discovery and response aggregation.

use crate::error::Result;
use crate::metrics::config::SamplerConfig;
use crate::metrics::cpu::{CpuBusyProbe, CpuUtilSampler};
use crate::metrics::data::MetricsResponse;
use crate::metrics::gpu::{self, GpuBusyProbe, GpuUtilSampler, GpuVramProbe, GpuVramSampler};
use crate::metrics::memory::{MemInfoProbe, RamSampler};
use crate::metrics::power::{self, CpuPowerSampler, RaplProbe};
use crate::metrics::sampler::Sampler;
use crate::metrics::sensors::{LmSensorsProbe, SensorsSampler};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Which discovery-gated samplers found their hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSupport {
    pub cpu_power: bool,
    pub gpu_util: bool,
    pub gpu_vram: bool,
}

/// Owns one sampler per metric family and assembles responses from their
/// current snapshots.
pub struct SensorHub {
    cpu_util: CpuUtilSampler,
    cpu_power: CpuPowerSampler,
    ram: RamSampler,
    gpu_util: GpuUtilSampler,
    gpu_vram: GpuVramSampler,
    sensors: SensorsSampler,
    hardware: HardwareSupport,
}

impl SensorHub {
    /// Discover hardware interfaces and start every sampler that has one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &SamplerConfig) -> Result<Self> {
        let interval = config.interval();

        let cpu_util = Sampler::spawn(CpuBusyProbe::new(config.proc_stat_path()), interval)?;
        let ram = Sampler::spawn(MemInfoProbe::new(config.meminfo_path()), interval)?;

        let cpu_power = match power::detect_rapl_package(&config.rapl_package_path()) {
            Some(package) => {
                info!("CPU power: using energy counter at {}", package.display());
                Sampler::spawn(RaplProbe::new(&package, interval), interval)?
            }
            None => {
                warn!("CPU power: no energy counter found, reporting 0");
                Sampler::disabled("cpu_power")
            }
        };

        let gpu_util = match gpu::detect_gpu_busy(&config.drm_root) {
            Some(path) => {
                info!("GPU utilization: using {}", path.display());
                Sampler::spawn(GpuBusyProbe::new(path), interval)?
            }
            None => {
                warn!("GPU utilization: no device found, reporting 0");
                Sampler::disabled("gpu_busy")
            }
        };

        let gpu_vram = match gpu::find_vram_files(&config.drm_root) {
            Some((used, total)) => {
                info!("GPU VRAM: using {} and {}", used.display(), total.display());
                Sampler::spawn(GpuVramProbe::new(used, total), interval)?
            }
            None => {
                warn!("GPU VRAM: no device found, reporting 0");
                Sampler::disabled("gpu_vram")
            }
        };

        let sensors = Sampler::spawn(
            LmSensorsProbe::new(
                config.sensors_program.clone(),
                config.sensors_args.clone(),
                config.sensors_timeout(),
            ),
            interval,
        )?;

        let hardware = HardwareSupport {
            cpu_power: cpu_power.is_running(),
            gpu_util: gpu_util.is_running(),
            gpu_vram: gpu_vram.is_running(),
        };

        Ok(Self {
            hardware,
            cpu_util,
            cpu_power,
            ram,
            gpu_util,
            gpu_vram,
            sensors,
        })
    }

    /// Current value of every sampler. Never blocks on I/O.
    pub fn metrics(&self) -> MetricsResponse {
        MetricsResponse::assemble(
            self.cpu_util.snapshot(),
            self.cpu_power.snapshot(),
            self.ram.snapshot(),
            self.gpu_util.snapshot(),
            self.gpu_vram.snapshot(),
            self.sensors.snapshot(),
        )
    }

    /// What discovery found at start. Unaffected by [`SensorHub::shutdown`].
    pub fn hardware(&self) -> HardwareSupport {
        self.hardware
    }

    pub fn cpu_util(&self) -> &CpuUtilSampler {
        &self.cpu_util
    }

    pub fn cpu_power(&self) -> &CpuPowerSampler {
        &self.cpu_power
    }

    pub fn ram(&self) -> &RamSampler {
        &self.ram
    }

    pub fn gpu_util(&self) -> &GpuUtilSampler {
        &self.gpu_util
    }

    pub fn gpu_vram(&self) -> &GpuVramSampler {
        &self.gpu_vram
    }

    pub fn sensors(&self) -> &SensorsSampler {
        &self.sensors
    }

    /// Stop every sampler and wait for their tasks to finish.
    pub async fn shutdown(&self) {
        futures_util::join!(
            self.cpu_util.shutdown(),
            self.cpu_power.shutdown(),
            self.ram.shutdown(),
            self.gpu_util.shutdown(),
            self.gpu_vram.shutdown(),
            self.sensors.shutdown(),
        );
        info!("All samplers stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_hardware_disables_samplers() {
        let dir = tempfile::tempdir().unwrap();
        let config = SamplerConfig::default()
            .with_proc_root(dir.path())
            .with_powercap_root(dir.path().join("powercap"))
            .with_drm_root(dir.path().join("drm"))
            .with_sensors_command("false", Vec::<String>::new());

        let hub = SensorHub::start(&config).unwrap();
        assert_eq!(hub.hardware(), HardwareSupport::default());
        assert!(hub.cpu_util().is_running());
        assert!(hub.ram().is_running());
        assert!(hub.sensors().is_running());
        assert_eq!(hub.metrics(), MetricsResponse::default());

        hub.shutdown().await;
        assert!(!hub.sensors().is_running());
    }

    #[tokio::test]
    async fn test_hardware_survives_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("powercap/intel-rapl:0")).unwrap();
        let card = dir.path().join("drm/card0/device");
        std::fs::create_dir_all(&card).unwrap();
        std::fs::write(card.join("gpu_busy_percent"), "5\n").unwrap();

        let config = SamplerConfig::default()
            .with_proc_root(dir.path())
            .with_powercap_root(dir.path().join("powercap"))
            .with_drm_root(dir.path().join("drm"))
            .with_sensors_command("false", Vec::<String>::new());

        let hub = SensorHub::start(&config).unwrap();
        let found = HardwareSupport {
            cpu_power: true,
            gpu_util: true,
            gpu_vram: false,
        };
        assert_eq!(hub.hardware(), found);

        hub.shutdown().await;
        assert!(!hub.cpu_power().is_running());
        assert!(!hub.gpu_util().is_running());
        assert_eq!(hub.hardware(), found);
    }
}
