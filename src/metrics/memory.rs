//! System RAM usage from the kernel memory information file.

use crate::error::{Result, SensorError};
use crate::metrics::data::RamUsage;
use crate::metrics::sampler::Sampler;
use crate::metrics::traits::Probe;
use std::path::PathBuf;

/// Sampler publishing [`RamUsage`].
pub type RamSampler = Sampler<RamUsage>;

/// `MemTotal` and `MemAvailable`, in kB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemInfoKb {
    pub total_kb: u64,
    pub available_kb: u64,
}

/// Extract `MemTotal` and `MemAvailable` from `/proc/meminfo`, stopping at
/// the first line after both have been seen.
pub fn parse_meminfo(content: &str) -> Result<MemInfoKb> {
    let mut total_kb = None;
    let mut available_kb = None;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let slot = match key.trim() {
            "MemTotal" => &mut total_kb,
            "MemAvailable" => &mut available_kb,
            _ => continue,
        };

        let value = rest
            .split_whitespace()
            .next()
            .ok_or_else(|| SensorError::parse_error(format!("{} has no value", key)))?;
        *slot = Some(
            value
                .parse::<u64>()
                .map_err(|e| SensorError::parse_error(format!("{} {:?}: {}", key, value, e)))?,
        );

        if total_kb.is_some() && available_kb.is_some() {
            break;
        }
    }

    match (total_kb, available_kb) {
        (Some(total_kb), Some(available_kb)) => Ok(MemInfoKb {
            total_kb,
            available_kb,
        }),
        (None, _) => Err(SensorError::parse_error("MemTotal not found")),
        (_, None) => Err(SensorError::parse_error("MemAvailable not found")),
    }
}

/// Reads the memory information file every tick.
pub struct MemInfoProbe {
    path: PathBuf,
}

impl MemInfoProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Probe for MemInfoProbe {
    type Output = RamUsage;

    fn name(&self) -> &'static str {
        "system_ram"
    }

    async fn sample(&mut self) -> Result<Option<RamUsage>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let info = parse_meminfo(&content)?;
        Ok(Some(RamUsage::from_kb(info.total_kb, info.available_kb)))
    }
}
