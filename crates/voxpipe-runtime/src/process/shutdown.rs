//! Graceful shutdown for the synthesizer child with SIGTERM → SIGKILL escalation.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, warn};

#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Terminate `child` and reap it.
///
/// # Strategy
/// 1. If it has already exited, just collect the status
/// 2. Send SIGTERM and wait up to `grace` for it to exit
/// 3. If still running, send SIGKILL
/// 4. Wait for reaping (required to avoid zombies)
///
/// Safe to call on a child that has already been reaped by `try_wait`.
pub async fn terminate(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }

    #[cfg(unix)]
    {
        terminate_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn terminate_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return child.wait().await;
    };

    if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        // Already gone; collect the status.
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        debug!(pid, "Synthesizer exited after SIGTERM");
        return result;
    }

    warn!(pid, grace_ms = grace.as_millis(), "Synthesizer ignored SIGTERM, sending SIGKILL");
    child.kill().await?;
    child.wait().await
}
