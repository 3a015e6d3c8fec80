//! CPU busy percentage from the kernel's aggregate time accounting.

use crate::error::{Result, SensorError};
use crate::metrics::data::CpuUtilization;
use crate::metrics::sampler::Sampler;
use crate::metrics::traits::Probe;
use std::path::PathBuf;

/// Sampler publishing [`CpuUtilization`].
pub type CpuUtilSampler = Sampler<CpuUtilization>;

impl Sampler<CpuUtilization> {
    /// Most recent CPU busy percentage.
    pub fn utilization(&self) -> f64 {
        self.snapshot().pct
    }
}

/// Idle and total jiffies from the aggregate `cpu` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

/// Parse the first line of `/proc/stat`.
///
/// `total` is the sum of user, nice, system, idle, iowait, irq and softirq;
/// `idle` is the fourth bucket.
pub fn parse_proc_stat(content: &str) -> Result<CpuTimes> {
    let line = content
        .lines()
        .next()
        .ok_or_else(|| SensorError::parse_error("empty CPU statistics"))?;

    let mut fields = line.split_whitespace();
    match fields.next() {
        Some("cpu") => {}
        other => {
            return Err(SensorError::parse_error(format!(
                "expected aggregate cpu line, found {:?}",
                other
            )))
        }
    }

    let mut buckets = [0u64; 7];
    for (i, bucket) in buckets.iter_mut().enumerate() {
        let raw = fields.next().ok_or_else(|| {
            SensorError::parse_error(format!("cpu line has only {} counters", i))
        })?;
        *bucket = raw
            .parse()
            .map_err(|e| SensorError::parse_error(format!("cpu counter {:?}: {}", raw, e)))?;
    }

    let total = buckets
        .iter()
        .try_fold(0u64, |sum, &bucket| sum.checked_add(bucket))
        .ok_or_else(|| SensorError::parse_error("cpu counters overflow when summed"))?;

    Ok(CpuTimes {
        idle: buckets[3],
        total,
    })
}

/// Turns successive [`CpuTimes`] readings into a busy percentage.
#[derive(Debug, Default)]
pub struct CpuBusyTracker {
    last: Option<CpuTimes>,
}

impl CpuBusyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reading. Returns a value only when total time advanced
    /// since the previous reading.
    pub fn update(&mut self, times: CpuTimes) -> Option<CpuUtilization> {
        let previous = self.last.replace(times)?;

        // A regression means the counters were reset; treat it as no progress.
        let total_delta = times.total.checked_sub(previous.total).unwrap_or(0);
        if total_delta == 0 {
            return None;
        }
        let idle_delta = times.idle.saturating_sub(previous.idle).min(total_delta);

        Some(CpuUtilization {
            pct: 100.0 * (total_delta - idle_delta) as f64 / total_delta as f64,
        })
    }
}

/// Reads the aggregate CPU line every tick.
pub struct CpuBusyProbe {
    path: PathBuf,
    tracker: CpuBusyTracker,
}

impl CpuBusyProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tracker: CpuBusyTracker::new(),
        }
    }
}

impl Probe for CpuBusyProbe {
    type Output = CpuUtilization;

    fn name(&self) -> &'static str {
        "cpu_busy"
    }

    async fn sample(&mut self) -> Result<Option<CpuUtilization>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let times = parse_proc_stat(&content)?;
        Ok(self.tracker.update(times))
    }
}
