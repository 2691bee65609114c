//! CPU pinning of child processes

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AffinityError {
    #[error("CPU affinity is not supported on this platform")]
    Unsupported,

    #[error("CPU {cpu} is outside the supported affinity mask")]
    CpuOutOfRange { cpu: usize },

    #[error("sched_setaffinity failed for pid {pid}: {source}")]
    Rejected {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Restrict a running process to the given logical CPUs
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn pin_process(pid: u32, cpus: &[usize]) -> Result<(), AffinityError> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut set = CpuSet::new();
    for &cpu in cpus {
        set.set(cpu)
            .map_err(|_| AffinityError::CpuOutOfRange { cpu })?;
    }

    sched_setaffinity(Pid::from_raw(pid as i32), &set).map_err(|errno| AffinityError::Rejected {
        pid,
        source: std::io::Error::from(errno),
    })
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn pin_process(_pid: u32, _cpus: &[usize]) -> Result<(), AffinityError> {
    Err(AffinityError::Unsupported)
}

#[cfg(all(test, any(target_os = "linux", target_os = "android")))]
mod tests {
    use super::*;
    use std::process::{Command, Stdio};

    fn first_allowed_cpu() -> usize {
        use nix::sched::{sched_getaffinity, CpuSet};
        use nix::unistd::Pid;

        let allowed = sched_getaffinity(Pid::from_raw(0)).unwrap();
        (0..CpuSet::count())
            .find(|&cpu| allowed.is_set(cpu).unwrap_or(false))
            .unwrap()
    }

    #[test]
    fn test_pin_child_to_allowed_cpu() {
        let cpu = first_allowed_cpu();
        let mut child = Command::new("sleep")
            .arg("1")
            .stdout(Stdio::null())
            .spawn()
            .unwrap();

        let result = pin_process(child.id(), &[cpu]);
        child.kill().ok();
        child.wait().unwrap();

        assert!(result.is_ok(), "{:?}", result);
    }

    #[test]
    fn test_cpu_out_of_range() {
        let result = pin_process(std::process::id(), &[1 << 20]);
        assert!(matches!(result, Err(AffinityError::CpuOutOfRange { .. })));
    }

    #[test]
    fn test_rejected_for_missing_process() {
        // pid_max is at most 2^22 on Linux
        let result = pin_process(u32::MAX >> 1, &[0]);
        assert!(matches!(result, Err(AffinityError::Rejected { .. })));
    }
}
