//! Pairbench - paired A/B throughput comparison of engine builds
//!
//! This library runs a baseline and a candidate executable concurrently on
//! disjoint CPU sets, collects one throughput figure from each per trial and
//! reports the mean difference with a confidence interval and the probability
//! that the candidate is faster.

pub mod accumulator;
pub mod cli;
pub mod config;
pub mod gaussian;
pub mod placement;
pub mod report;
pub mod runner;
pub mod session;
pub mod topology;
