//! CPU package power from the power-capping energy counter.

use crate::error::{Result, SensorError};
use crate::metrics::data::CpuPower;
use crate::metrics::sampler::Sampler;
use crate::metrics::traits::Probe;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MICROJOULES_PER_JOULE: f64 = 1_000_000.0;

/// Sampler publishing [`CpuPower`].
pub type CpuPowerSampler = Sampler<CpuPower>;

impl Sampler<CpuPower> {
    /// Most recent package power in watts. 0 before the first delta or when
    /// no energy counter exists.
    pub fn power_w(&self) -> f64 {
        self.snapshot().watts
    }
}

/// One read of the package energy counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyReading {
    /// Cumulative energy in microjoules
    pub energy_uj: u64,
    /// Counter value at which `energy_uj` wraps back to zero
    pub max_energy_uj: u64,
}

/// Locate the package 0 power-capping zone. `None` means the hardware
/// interface is absent and the sampler stays disabled.
pub fn detect_rapl_package(package_dir: &Path) -> Option<PathBuf> {
    package_dir.is_dir().then(|| package_dir.to_path_buf())
}

/// Parse the contents of `energy_uj` and `max_energy_range_uj`.
pub fn parse_energy(energy: &str, max_energy: &str) -> Result<EnergyReading> {
    let parse = |raw: &str, what: &str| {
        raw.trim()
            .parse::<u64>()
            .map_err(|e| SensorError::parse_error(format!("{} {:?}: {}", what, raw.trim(), e)))
    };

    Ok(EnergyReading {
        energy_uj: parse(energy, "energy_uj")?,
        max_energy_uj: parse(max_energy, "max_energy_range_uj")?,
    })
}

/// Turns successive energy readings into average power.
#[derive(Debug, Default)]
pub struct EnergyTracker {
    last_energy_uj: Option<u64>,
}

impl EnergyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Microjoules consumed since the previous reading, corrected for
    /// counter wraparound. `None` on the first reading or when the counter
    /// went backwards with no known ceiling.
    pub fn delta_uj(&mut self, reading: EnergyReading) -> Option<u64> {
        let last = self.last_energy_uj.replace(reading.energy_uj)?;

        if reading.energy_uj >= last {
            Some(reading.energy_uj - last)
        } else if reading.max_energy_uj > 0 {
            Some(reading.max_energy_uj.saturating_sub(last) + reading.energy_uj)
        } else {
            None
        }
    }

    /// Record a reading taken `interval` after the previous one.
    pub fn update(&mut self, reading: EnergyReading, interval: Duration) -> Option<CpuPower> {
        let delta = self.delta_uj(reading)?;
        let seconds = interval.as_secs_f64();
        if seconds <= 0.0 {
            return None;
        }

        Some(CpuPower {
            watts: delta as f64 / seconds / MICROJOULES_PER_JOULE,
        })
    }
}

/// Reads the package energy counter every tick.
pub struct RaplProbe {
    energy_path: PathBuf,
    max_path: PathBuf,
    interval: Duration,
    tracker: EnergyTracker,
}

impl RaplProbe {
    pub fn new(package_dir: &Path, interval: Duration) -> Self {
        Self {
            energy_path: package_dir.join("energy_uj"),
            max_path: package_dir.join("max_energy_range_uj"),
            interval,
            tracker: EnergyTracker::new(),
        }
    }
}

impl Probe for RaplProbe {
    type Output = CpuPower;

    fn name(&self) -> &'static str {
        "cpu_power"
    }

    async fn sample(&mut self) -> Result<Option<CpuPower>> {
        let energy = tokio::fs::read_to_string(&self.energy_path).await?;
        let max_energy = tokio::fs::read_to_string(&self.max_path).await?;
        let reading = parse_energy(&energy, &max_energy)?;
        Ok(self.tracker.update(reading, self.interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(energy_uj: u64, max_energy_uj: u64) -> EnergyReading {
        EnergyReading {
            energy_uj,
            max_energy_uj,
        }
    }

    #[test]
    fn test_parse_energy() {
        let parsed = parse_energy("123456789\n", "262143328850\n").unwrap();
        assert_eq!(parsed, reading(123_456_789, 262_143_328_850));
        assert!(parse_energy("", "1").is_err());
        assert!(parse_energy("1", "n/a").is_err());
    }

    #[test]
    fn test_first_reading_is_baseline() {
        let mut tracker = EnergyTracker::new();
        assert_eq!(tracker.update(reading(100, 1000), Duration::from_secs(1)), None);
    }

    #[test]
    fn test_power_without_wrap() {
        let mut tracker = EnergyTracker::new();
        tracker.update(reading(100, 1000), Duration::from_secs(1));
        let power = tracker
            .update(reading(950, 1000), Duration::from_secs(1))
            .unwrap();
        // 850 µJ over one second.
        assert!((power.watts - 850e-6).abs() < 1e-12);
    }

    #[test]
    fn test_power_scales_with_interval() {
        let mut tracker = EnergyTracker::new();
        tracker.update(reading(0, 0), Duration::from_millis(500));
        let power = tracker
            .update(reading(10_000_000, 0), Duration::from_millis(500))
            .unwrap();
        assert!((power.watts - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_wraparound_delta() {
        let mut tracker = EnergyTracker::new();
        tracker.delta_uj(reading(900, 1000));
        assert_eq!(tracker.delta_uj(reading(50, 1000)), Some(150));
    }

    #[test]
    fn test_power_across_wraparound() {
        let mut tracker = EnergyTracker::new();
        tracker.update(reading(1_800_000, 2_000_000), Duration::from_millis(200));
        // 200_000 µJ to the ceiling plus 400_000 µJ after it, over 0.2 s.
        let power = tracker
            .update(reading(400_000, 2_000_000), Duration::from_millis(200))
            .unwrap();
        assert!((power.watts - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_backwards_without_ceiling_is_skipped() {
        let mut tracker = EnergyTracker::new();
        tracker.delta_uj(reading(900, 0));
        assert_eq!(tracker.delta_uj(reading(50, 0)), None);
        assert_eq!(tracker.delta_uj(reading(80, 0)), Some(30));
    }

    #[test]
    fn test_detect_missing_package() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect_rapl_package(&dir.path().join("intel-rapl:0")), None);

        let package = dir.path().join("intel-rapl:0");
        std::fs::create_dir(&package).unwrap();
        assert_eq!(detect_rapl_package(&package), Some(package));
    }
}
