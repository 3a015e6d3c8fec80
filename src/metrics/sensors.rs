//! Chip temperatures and GPU power from a hardware-monitoring command.
//!
//! The command (by default `sensors -j`) prints a JSON object keyed by chip
//! identifier, each chip mapping sub-feature labels to field/value maps:
//!
//! ```text
//! { "k10temp-pci-00c3": { "Adapter": "PCI adapter",
//!                         "Tctl": { "temp1_input": 45.25 } },
//!   "amdgpu-pci-0300":  { "edge": { "temp1_input": 51.0 }, ... } }
//! ```
//!
//! The layout differs between vendors and drivers, so the report is decoded
//! into a schema-less [`SensorNode`] tree and searched by chip prefix and
//! candidate label.

use crate::error::{Result, SensorError};
use crate::metrics::data::SensorReadings;
use crate::metrics::sampler::Sampler;
use crate::metrics::traits::Probe;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Sampler publishing [`SensorReadings`].
pub type SensorsSampler = Sampler<SensorReadings>;

/// A decoded report: chip identifier to chip contents.
pub type SensorReport = BTreeMap<String, SensorNode>;

/// One node of the command's JSON output.
///
/// Numbers stay as [`serde_json::Number`] until a field is read, so large
/// integer counters are not squeezed through `f64` at decode time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SensorNode {
    Number(serde_json::Number),
    Text(String),
    Group(BTreeMap<String, SensorNode>),
    Other(serde_json::Value),
}

impl SensorNode {
    /// Numeric value of a leaf. Numeric strings are accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SensorNode::Number(n) => n.as_f64(),
            SensorNode::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&BTreeMap<String, SensorNode>> {
        match self {
            SensorNode::Group(group) => Some(group),
            _ => None,
        }
    }
}

struct ChipLookup {
    prefix: &'static str,
    sections: &'static [&'static str],
}

// CPU chips in order of preference. The field is always temp1_input,
// whichever section matches.
static CPU_CHIPS: [ChipLookup; 2] = [
    ChipLookup {
        prefix: "k10temp",
        sections: &["Tctl", "Tdie"],
    },
    ChipLookup {
        prefix: "coretemp",
        sections: &["Package id 0", "Core 0"],
    },
];
const CPU_TEMP_FIELD: &str = "temp1_input";

const GPU_CHIP: &str = "amdgpu";

/// Decode the command's stdout.
pub fn parse_sensors_output(output: &[u8]) -> Result<SensorReport> {
    Ok(serde_json::from_slice(output)?)
}

/// First chip whose identifier starts with `prefix`.
pub fn find_chip<'a>(
    report: &'a SensorReport,
    prefix: &str,
) -> Option<&'a BTreeMap<String, SensorNode>> {
    report
        .iter()
        .filter(|(id, _)| id.starts_with(prefix))
        .find_map(|(_, node)| node.as_group())
}

/// Value of `field` in the first of `sections` that has it, or 0.
pub fn first_value(chip: &BTreeMap<String, SensorNode>, sections: &[&str], field: &str) -> f64 {
    sections
        .iter()
        .filter_map(|section| chip.get(*section)?.as_group())
        .find_map(|section| section.get(field)?.as_f64())
        .unwrap_or(0.0)
}

/// Extract the readings this crate reports. Anything absent is 0.
pub fn readings_from_report(report: &SensorReport) -> SensorReadings {
    let mut readings = SensorReadings::default();

    // Only the first CPU chip family present is consulted.
    if let Some((chip, lookup)) = CPU_CHIPS
        .iter()
        .find_map(|lookup| find_chip(report, lookup.prefix).map(|chip| (chip, lookup)))
    {
        readings.cpu_temp_c = first_value(chip, lookup.sections, CPU_TEMP_FIELD);
    }

    if let Some(chip) = find_chip(report, GPU_CHIP) {
        readings.gpu_edge_c = first_value(chip, &["edge"], "temp1_input");
        readings.gpu_hotspot_c = first_value(chip, &["junction"], "temp2_input");
        readings.gpu_vram_temp_c = first_value(chip, &["mem"], "temp3_input");
        readings.gpu_power_w = first_value(chip, &["PPT"], "power1_average");
    }

    readings
}

/// Runs the hardware-monitoring command every tick.
pub struct LmSensorsProbe {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl LmSensorsProbe {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    async fn run_command(&self) -> Result<Vec<u8>> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                SensorError::command_error(format!(
                    "{} timed out after {:?}",
                    self.program, self.timeout
                ))
            })??;

        if !output.status.success() {
            return Err(SensorError::command_error(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(SensorError::command_error(format!(
                "{} produced no output",
                self.program
            )));
        }

        Ok(output.stdout)
    }
}

impl Probe for LmSensorsProbe {
    type Output = SensorReadings;

    fn name(&self) -> &'static str {
        "lm_sensors"
    }

    async fn sample(&mut self) -> Result<Option<SensorReadings>> {
        let stdout = self.run_command().await?;
        let report = parse_sensors_output(&stdout)?;
        Ok(Some(readings_from_report(&report)))
    }
}
