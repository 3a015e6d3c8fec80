//! Sampler configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where the samplers read from and how often.
///
/// The path roots default to the real kernel interfaces; tests point them
/// at fixture directories instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Refresh interval shared by every sampler, in milliseconds
    pub interval_ms: u64,
    /// Root of the process information pseudo-filesystem
    pub proc_root: PathBuf,
    /// Root of the power-capping class directory
    pub powercap_root: PathBuf,
    /// Power-capping zone for CPU package 0
    pub rapl_package: String,
    /// Root of the DRM device class directory
    pub drm_root: PathBuf,
    /// Hardware-monitoring program emitting a JSON chip report
    pub sensors_program: String,
    /// Arguments passed to the hardware-monitoring program
    pub sensors_args: Vec<String>,
    /// Upper bound on one hardware-monitoring invocation, in milliseconds
    pub sensors_timeout_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: crate::DEFAULT_INTERVAL_MS,
            proc_root: PathBuf::from("/proc"),
            powercap_root: PathBuf::from("/sys/class/powercap"),
            rapl_package: "intel-rapl:0".to_string(),
            drm_root: PathBuf::from("/sys/class/drm"),
            sensors_program: "sensors".to_string(),
            sensors_args: vec!["-j".to_string()],
            sensors_timeout_ms: 750,
        }
    }
}

impl SamplerConfig {
    /// Set the refresh interval in milliseconds.
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Set the `/proc` root.
    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = root.into();
        self
    }

    /// Set the power-capping class root.
    pub fn with_powercap_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.powercap_root = root.into();
        self
    }

    /// Set the DRM class root.
    pub fn with_drm_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.drm_root = root.into();
        self
    }

    /// Set the hardware-monitoring command.
    pub fn with_sensors_command<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensors_program = program.into();
        self.sensors_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the hardware-monitoring command timeout in milliseconds.
    pub fn with_sensors_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.sensors_timeout_ms = timeout_ms;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn sensors_timeout(&self) -> Duration {
        Duration::from_millis(self.sensors_timeout_ms)
    }

    /// Path of the aggregate CPU statistics file.
    pub fn proc_stat_path(&self) -> PathBuf {
        self.proc_root.join("stat")
    }

    /// Path of the memory information file.
    pub fn meminfo_path(&self) -> PathBuf {
        self.proc_root.join("meminfo")
    }

    /// Directory of the CPU package 0 energy counter.
    pub fn rapl_package_path(&self) -> PathBuf {
        self.powercap_root.join(&self.rapl_package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_kernel_interfaces() {
        let config = SamplerConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(1));
        assert_eq!(config.proc_stat_path(), PathBuf::from("/proc/stat"));
        assert_eq!(config.meminfo_path(), PathBuf::from("/proc/meminfo"));
        assert_eq!(
            config.rapl_package_path(),
            PathBuf::from("/sys/class/powercap/intel-rapl:0")
        );
        assert_eq!(config.sensors_program, "sensors");
        assert_eq!(config.sensors_args, vec!["-j"]);
    }

    #[test]
    fn test_builder() {
        let config = SamplerConfig::default()
            .with_interval_ms(250)
            .with_proc_root("/tmp/proc")
            .with_sensors_command("sh", ["-c", "cat report.json"])
            .with_sensors_timeout_ms(100);

        assert_eq!(config.interval(), Duration::from_millis(250));
        assert_eq!(config.proc_stat_path(), PathBuf::from("/tmp/proc/stat"));
        assert_eq!(config.sensors_program, "sh");
        assert_eq!(config.sensors_args, vec!["-c", "cat report.json"]);
        assert_eq!(config.sensors_timeout(), Duration::from_millis(100));
    }
}
