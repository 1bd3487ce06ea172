//! Start the subject command suspended until tracing is armed
//!
//! The child is forked right away so its pid is known for the trace
//! filters, but it only execs the command once the parent sends `r` over
//! a pipe. Anything else, including the pipe being closed, makes the child
//! exit without running the command.

use anyhow::{bail, Context, Result};
use nix::sched::{sched_setaffinity, CpuSet};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, pipe, ForkResult, Pid};
use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::process::CommandExt;
use std::process::Command;

const READY: u8 = b'r';

/// A forked child blocked before exec
#[derive(Debug)]
pub struct SuspendedChild {
    pid: Pid,
    ready: Option<File>,
    waited: bool,
}

impl SuspendedChild {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Let the child exec its command
    pub fn release(&mut self) -> Result<()> {
        let Some(mut ready) = self.ready.take() else {
            bail!("child {} was already released", self.pid);
        };
        ready
            .write_all(&[READY])
            .with_context(|| format!("Failed to release child {}", self.pid))?;
        tracing::debug!(pid = self.pid.as_raw(), "released child");
        Ok(())
    }

    /// Reap the child and return its exit code
    ///
    /// A child killed by a signal reports `128 + signal` like a shell does.
    pub fn wait(&mut self) -> Result<i32> {
        loop {
            let status = waitpid(self.pid, None)
                .with_context(|| format!("Failed to wait for child {}", self.pid))?;
            match status {
                WaitStatus::Exited(_, code) => {
                    self.waited = true;
                    tracing::debug!(pid = self.pid.as_raw(), code, "child exited");
                    return Ok(code);
                }
                WaitStatus::Signaled(_, signal, _) => {
                    self.waited = true;
                    tracing::debug!(pid = self.pid.as_raw(), ?signal, "child killed");
                    return Ok(128 + signal as i32);
                }
                _ => continue,
            }
        }
    }
}

impl Drop for SuspendedChild {
    fn drop(&mut self) {
        // Closing the pipe without a byte makes the child exit.
        self.ready.take();
        if !self.waited {
            if let Err(err) = waitpid(self.pid, None) {
                tracing::warn!(pid = self.pid.as_raw(), "failed to reap child: {}", err);
            }
        }
    }
}

/// Fork `command` and hold it before exec, pinned to `cpu`
pub fn spawn_suspended(command: &[String], cpu: usize) -> Result<SuspendedChild> {
    let Some((program, args)) = command.split_first() else {
        bail!("Command array is empty");
    };

    let (reader, writer) = pipe().context("Failed to create pipe")?;

    match unsafe { fork() }.context("Failed to fork")? {
        ForkResult::Parent { child } => {
            drop(reader);
            tracing::debug!(pid = child.as_raw(), program = %program, cpu, "forked child");
            Ok(SuspendedChild {
                pid: child,
                ready: Some(File::from(writer)),
                waited: false,
            })
        }
        ForkResult::Child => {
            drop(writer);
            let mut reader = File::from(reader);
            let mut byte = [0u8; 1];
            // read_exact retries on EINTR and fails on EOF.
            if reader.read_exact(&mut byte).is_err() || byte[0] != READY {
                std::process::exit(1);
            }
            drop(reader);

            if pin_to_cpu(cpu).is_err() {
                std::process::exit(1);
            }

            let err = Command::new(program).args(args).exec();

            // If we get here, exec failed
            eprintln!("Failed to exec {}: {}", program, err);
            std::process::exit(1);
        }
    }
}

fn pin_to_cpu(cpu: usize) -> nix::Result<()> {
    let mut set = CpuSet::new();
    set.set(cpu)?;
    sched_setaffinity(Pid::from_raw(0), &set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    /// A CPU this test process may run on
    fn allowed_cpu() -> usize {
        let set = nix::sched::sched_getaffinity(Pid::from_raw(0)).unwrap();
        (0..CpuSet::count())
            .find(|&cpu| set.is_set(cpu).unwrap_or(false))
            .unwrap()
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let err = spawn_suspended(&[], 0).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_released_child_runs_command() {
        let mut child = spawn_suspended(&command(&["sh", "-c", "exit 3"]), allowed_cpu()).unwrap();
        child.release().unwrap();
        assert_eq!(child.wait().unwrap(), 3);
    }

    #[test]
    fn test_release_twice_fails() {
        let mut child = spawn_suspended(&command(&["true"]), allowed_cpu()).unwrap();
        child.release().unwrap();
        assert!(child.release().is_err());
        assert_eq!(child.wait().unwrap(), 0);
    }

    #[test]
    fn test_unreleased_child_exits_without_running() {
        let tmp = tempfile::TempDir::new().unwrap();
        let marker = tmp.path().join("ran");
        let script = format!("touch {}", marker.display());
        {
            let _child = spawn_suspended(&command(&["sh", "-c", &script]), allowed_cpu()).unwrap();
        }
        assert!(!marker.exists());
    }
}
