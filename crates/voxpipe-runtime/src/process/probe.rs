//! Liveness and activity probes for the synthesizer process.
//!
//! Neither probe blocks and neither reaps the child. Activity is a hint used
//! to shortcut the end-of-utterance wait: a process sleeping in `read(2)`
//! has nothing more to say until it is sent another command.

use std::fmt;

#[cfg(target_os = "linux")]
use std::fs;

#[cfg(unix)]
use nix::sys::signal;
#[cfg(unix)]
use nix::unistd::Pid;

/// Scheduler state of a process as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessActivity {
    /// `R`: on a CPU or runnable.
    Running,
    /// `S`: interruptible sleep, usually blocked on a pipe.
    Sleeping,
    /// `D`: uninterruptible sleep, usually disk I/O.
    DiskWait,
    /// `T`/`t`: stopped or traced.
    Stopped,
    /// `Z`: exited but not yet reaped.
    Zombie,
    /// `X`/`x`: being torn down.
    Dead,
    /// `W`: paging (pre-2.6 kernels).
    Paging,
    /// State could not be determined.
    Unknown,
}

impl ProcessActivity {
    /// Map a `/proc/<pid>/stat` state character.
    pub const fn from_state_char(c: char) -> Self {
        match c {
            'R' => Self::Running,
            'S' | 'I' => Self::Sleeping,
            'D' => Self::DiskWait,
            'T' | 't' => Self::Stopped,
            'Z' => Self::Zombie,
            'X' | 'x' => Self::Dead,
            'W' => Self::Paging,
            _ => Self::Unknown,
        }
    }

    /// Whether the process is waiting for input rather than computing.
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Sleeping)
    }

    /// Whether the process has finished executing.
    pub const fn is_exited(self) -> bool {
        matches!(self, Self::Zombie | Self::Dead)
    }
}

/// Source of [`ProcessActivity`] for a pid.
pub trait ActivityProbe: Send + Sync + fmt::Debug {
    fn activity(&self, pid: u32) -> ProcessActivity;
}

/// Reads `/proc/<pid>/stat` on Linux; reports `Unknown` elsewhere, which
/// disables the idle fast path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcStatProbe;

impl ActivityProbe for ProcStatProbe {
    fn activity(&self, pid: u32) -> ProcessActivity {
        #[cfg(target_os = "linux")]
        {
            fs::read_to_string(format!("/proc/{pid}/stat"))
                .map_or(ProcessActivity::Unknown, |stat| parse_stat(&stat))
        }

        #[cfg(not(target_os = "linux"))]
        {
            let _ = pid;
            ProcessActivity::Unknown
        }
    }
}

/// Extract the state field from a `/proc/<pid>/stat` line.
///
/// The command name is parenthesised and may itself contain `)` or spaces,
/// so the state is located after the *last* closing parenthesis.
pub fn parse_stat(stat: &str) -> ProcessActivity {
    let Some(close) = stat.rfind(')') else {
        return ProcessActivity::Unknown;
    };
    let mut rest = stat[close + 1..].chars();
    match (rest.next(), rest.next()) {
        (Some(' '), Some(state)) => ProcessActivity::from_state_char(state),
        _ => ProcessActivity::Unknown,
    }
}

/// Whether `pid` names a live (not yet exited) process.
///
/// Uses a null signal, so it never blocks and never reaps. A zombie counts
/// as dead.
pub fn is_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        if signal::kill(Pid::from_raw(raw), None).is_err() {
            return false;
        }
        !ProcStatProbe.activity(pid).is_exited()
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}
