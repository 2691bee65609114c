//! CPU placement planning for paired trials
//!
//! Logical CPUs are split into two sets at the granularity of whole physical
//! cores (blocks of `logical_per_core` contiguous indices): even blocks go to
//! set A, odd blocks to set B. Two processes pinned to different sets never
//! share a core, so hyperthread contention cannot favour either side.
//!
//! The sets swap owners every trial, cancelling any static difference
//! between the cores each side would otherwise always run on.

use crate::topology::CpuTopology;
use serde::{Deserialize, Serialize};

/// Two CPU sets covering the host's logical CPUs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSetPair {
    sets: [Vec<usize>; 2],
}

impl CpuSetPair {
    /// Partition the topology's logical CPUs
    ///
    /// With a single physical core there is nothing to interleave, so its
    /// logical CPUs alternate one by one. A single logical CPU produces the
    /// degenerate pair `{0}` / `{0}`.
    ///
    /// # Example
    /// ```
    /// use pairbench::placement::CpuSetPair;
    /// use pairbench::topology::CpuTopology;
    ///
    /// let pair = CpuSetPair::plan(&CpuTopology::new(4, 8).unwrap());
    /// assert_eq!(pair.set(0), &[0, 4, 1, 5]);
    /// assert_eq!(pair.set(1), &[2, 6, 3, 7]);
    /// ```
    pub fn plan(topology: &CpuTopology) -> Self {
        let logical = topology.logical_count;
        if logical <= 1 {
            return Self {
                sets: [vec![0], vec![0]],
            };
        }

        let step = if topology.core_count <= 1 {
            1
        } else {
            topology.logical_per_core()
        };

        let mut sets = [Vec::new(), Vec::new()];
        for offset in 0..step {
            sets[0].extend((offset..logical).step_by(2 * step));
            sets[1].extend((offset + step..logical).step_by(2 * step));
        }

        Self { sets }
    }

    /// Set `0` or `1`
    pub fn set(&self, index: usize) -> &[usize] {
        &self.sets[index % 2]
    }

    /// `(baseline, candidate)` CPU sets for a 0-based trial index
    ///
    /// Baseline gets set `i % 2`, candidate set `(i + 1) % 2`.
    pub fn for_trial(&self, trial: usize) -> (&[usize], &[usize]) {
        (self.set(trial % 2), self.set((trial + 1) % 2))
    }

    /// True when both sides share the same CPUs
    pub fn is_degenerate(&self) -> bool {
        self.sets[0] == self.sets[1]
    }
}
