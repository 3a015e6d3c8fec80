//! GPU busy percentage and VRAM usage from DRM device attributes.
//!
//! Both samplers discover their files once, at construction, by scanning
//! `<drm_root>/card*/device/` in name order and using the first card that
//! has the attribute. Only a single GPU is reported.

use crate::error::{Result, SensorError};
use crate::metrics::data::{GpuUtilization, GpuVram};
use crate::metrics::sampler::Sampler;
use crate::metrics::traits::Probe;
use std::fs;
use std::path::{Path, PathBuf};

const GPU_BUSY_FILE: &str = "gpu_busy_percent";
const VRAM_USED_FILE: &str = "mem_info_vram_used";
const VRAM_TOTAL_FILE: &str = "mem_info_vram_total";

/// Sampler publishing [`GpuUtilization`].
pub type GpuUtilSampler = Sampler<GpuUtilization>;

/// Sampler publishing [`GpuVram`].
pub type GpuVramSampler = Sampler<GpuVram>;

impl Sampler<GpuUtilization> {
    /// Most recent GPU busy percentage, 0 if no GPU was discovered.
    pub fn utilization(&self) -> f64 {
        self.snapshot().pct
    }
}

/// `<drm_root>/card*/device` directories, sorted by card name.
fn card_device_dirs(drm_root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(drm_root) else {
        return Vec::new();
    };

    let mut cards: Vec<(String, PathBuf)> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.starts_with("card")
                .then(|| (name, entry.path().join("device")))
        })
        .collect();
    cards.sort();

    cards.into_iter().map(|(_, dir)| dir).collect()
}

/// First `<drm_root>/card*/device/<file_name>` that exists.
pub fn find_drm_device_file(drm_root: &Path, file_name: &str) -> Option<PathBuf> {
    card_device_dirs(drm_root)
        .into_iter()
        .map(|dir| dir.join(file_name))
        .find(|path| path.is_file())
}

/// `(used, total)` VRAM attribute paths of the first card exposing both.
pub fn find_vram_files(drm_root: &Path) -> Option<(PathBuf, PathBuf)> {
    card_device_dirs(drm_root).into_iter().find_map(|dir| {
        let used = dir.join(VRAM_USED_FILE);
        let total = dir.join(VRAM_TOTAL_FILE);
        (used.is_file() && total.is_file()).then_some((used, total))
    })
}

/// Locate the busy-percentage attribute.
pub fn detect_gpu_busy(drm_root: &Path) -> Option<PathBuf> {
    find_drm_device_file(drm_root, GPU_BUSY_FILE)
}

pub fn parse_gpu_busy(content: &str) -> Result<f64> {
    let raw = content.trim();
    raw.parse::<f64>()
        .map_err(|e| SensorError::parse_error(format!("{} {:?}: {}", GPU_BUSY_FILE, raw, e)))
}

pub fn parse_byte_count(content: &str) -> Result<u64> {
    let raw = content.trim();
    raw.parse::<u64>()
        .map_err(|e| SensorError::parse_error(format!("byte count {:?}: {}", raw, e)))
}

/// Reads the busy-percentage attribute every tick.
pub struct GpuBusyProbe {
    path: PathBuf,
}

impl GpuBusyProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Probe for GpuBusyProbe {
    type Output = GpuUtilization;

    fn name(&self) -> &'static str {
        "gpu_busy"
    }

    async fn sample(&mut self) -> Result<Option<GpuUtilization>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(Some(GpuUtilization {
            pct: parse_gpu_busy(&content)?,
        }))
    }
}

/// Reads the VRAM used and total attributes every tick.
///
/// The two reads are separate; the published snapshot is consistent with
/// what was read in the tick, not with a single instant of device state.
pub struct GpuVramProbe {
    used_path: PathBuf,
    total_path: PathBuf,
}

impl GpuVramProbe {
    pub fn new(used_path: impl Into<PathBuf>, total_path: impl Into<PathBuf>) -> Self {
        Self {
            used_path: used_path.into(),
            total_path: total_path.into(),
        }
    }
}

impl Probe for GpuVramProbe {
    type Output = GpuVram;

    fn name(&self) -> &'static str {
        "gpu_vram"
    }

    async fn sample(&mut self) -> Result<Option<GpuVram>> {
        let used = parse_byte_count(&tokio::fs::read_to_string(&self.used_path).await?)?;
        let total = parse_byte_count(&tokio::fs::read_to_string(&self.total_path).await?)?;
        Ok(Some(GpuVram::from_bytes(used, total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_attr(root: &Path, card: &str, file: &str, value: &str) {
        let dir = root.join(card).join("device");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), value).unwrap();
    }

    #[test]
    fn test_parse_gpu_busy() {
        assert_eq!(parse_gpu_busy("42\n").unwrap(), 42.0);
        assert!(parse_gpu_busy("").is_err());
        assert!(parse_gpu_busy("busy").is_err());
    }

    #[test]
    fn test_parse_byte_count() {
        assert_eq!(parse_byte_count("8589934592\n").unwrap(), 8_589_934_592);
        assert!(parse_byte_count("-1").is_err());
    }

    #[test]
    fn test_missing_root_discovers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("drm");
        assert_eq!(detect_gpu_busy(&missing), None);
        assert_eq!(find_vram_files(&missing), None);
    }

    #[test]
    fn test_first_card_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_attr(dir.path(), "card1", GPU_BUSY_FILE, "10");
        write_attr(dir.path(), "card0", GPU_BUSY_FILE, "20");
        fs::create_dir_all(dir.path().join("renderD128")).unwrap();

        assert_eq!(
            detect_gpu_busy(dir.path()),
            Some(dir.path().join("card0/device").join(GPU_BUSY_FILE))
        );
    }

    #[test]
    fn test_cards_without_attribute_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("card0/device")).unwrap();
        write_attr(dir.path(), "card1", GPU_BUSY_FILE, "10");

        assert_eq!(
            detect_gpu_busy(dir.path()),
            Some(dir.path().join("card1/device").join(GPU_BUSY_FILE))
        );
    }

    #[test]
    fn test_vram_requires_both_files_on_one_card() {
        let dir = tempfile::tempdir().unwrap();
        write_attr(dir.path(), "card0", VRAM_USED_FILE, "1");
        assert_eq!(find_vram_files(dir.path()), None);

        write_attr(dir.path(), "card1", VRAM_USED_FILE, "1");
        write_attr(dir.path(), "card1", VRAM_TOTAL_FILE, "2");
        let (used, total) = find_vram_files(dir.path()).unwrap();
        assert_eq!(used, dir.path().join("card1/device").join(VRAM_USED_FILE));
        assert_eq!(total, dir.path().join("card1/device").join(VRAM_TOTAL_FILE));
    }

    #[tokio::test]
    async fn test_vram_probe_reads_both_files() {
        let dir = tempfile::tempdir().unwrap();
        write_attr(dir.path(), "card0", VRAM_USED_FILE, "2147483648\n");
        write_attr(dir.path(), "card0", VRAM_TOTAL_FILE, "8589934592\n");

        let (used, total) = find_vram_files(dir.path()).unwrap();
        let mut probe = GpuVramProbe::new(used, total);
        let vram = probe.sample().await.unwrap().unwrap();
        assert_eq!(vram.used_gb, 2.0);
        assert_eq!(vram.total_gb, 8.0);
        assert_eq!(vram.used_pct, 25.0);
    }
}
