//! Host CPU topology discovery
//!
//! Reads `/proc/cpuinfo` for the logical CPU count, the number of distinct
//! physical cores and the processor model. Logical CPUs sharing a core are
//! assumed to be numbered contiguously in blocks of `logical / cores`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Core and logical CPU counts of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTopology {
    pub core_count: usize,
    pub logical_count: usize,
}

impl CpuTopology {
    /// Build a topology, rejecting counts the planner cannot work with
    pub fn new(core_count: usize, logical_count: usize) -> Option<Self> {
        if core_count == 0 || logical_count < core_count {
            return None;
        }
        Some(Self {
            core_count,
            logical_count,
        })
    }

    /// One core, one logical CPU
    pub fn single() -> Self {
        Self {
            core_count: 1,
            logical_count: 1,
        }
    }

    /// Discover the host topology, degrading instead of failing
    ///
    /// Falls back to the available parallelism with one logical CPU per core
    /// when `/proc/cpuinfo` is missing or unusable, and to a single CPU when
    /// even that is unknown.
    pub fn discover() -> Self {
        match Self::from_cpuinfo_file(Path::new(CPUINFO_PATH)) {
            Some(topology) => {
                tracing::debug!(
                    cores = topology.core_count,
                    logical = topology.logical_count,
                    "Discovered CPU topology"
                );
                topology
            }
            None => {
                let logical = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);
                tracing::warn!(
                    "Could not determine physical core layout; assuming {} CPU(s) without hyperthreading",
                    logical
                );
                Self::new(logical, logical).unwrap_or_else(Self::single)
            }
        }
    }

    fn from_cpuinfo_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        parse_cpuinfo(&contents)
    }

    /// Logical CPUs per physical core (the interleaving block size)
    pub fn logical_per_core(&self) -> usize {
        (self.logical_count / self.core_count).max(1)
    }

    pub fn hyperthreading(&self) -> bool {
        self.logical_count != self.core_count
    }
}

/// Parse `/proc/cpuinfo` contents into a topology
///
/// Cores are distinct `(physical id, core id)` pairs. When the file carries
/// no core ids (some VMs and non-x86 kernels) every logical CPU counts as a
/// core.
pub fn parse_cpuinfo(contents: &str) -> Option<CpuTopology> {
    let mut logical = 0usize;
    let mut cores = HashSet::new();
    let mut physical_id: Option<&str> = None;

    for line in contents.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "processor" => {
                logical += 1;
                physical_id = None;
            }
            "physical id" => physical_id = Some(value.trim()),
            "core id" => {
                cores.insert((physical_id.unwrap_or("0"), value.trim()));
            }
            _ => {}
        }
    }

    let core_count = if cores.is_empty() { logical } else { cores.len() };
    CpuTopology::new(core_count, logical)
}

/// Human-readable processor model, `"unknown"` when unavailable
pub fn processor_model() -> String {
    std::fs::read_to_string(CPUINFO_PATH)
        .ok()
        .and_then(|contents| parse_model_name(&contents))
        .unwrap_or_else(|| "unknown".to_string())
}

/// First non-empty `model name` entry of `/proc/cpuinfo` contents
pub fn parse_model_name(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        let value = value.trim();
        (key.trim() == "model name" && !value.is_empty()).then(|| value.to_string())
    })
}
