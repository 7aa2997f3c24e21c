//! Synthesizer process supervision.
//!
//! - `pipes`: spawn the child with three pipes, reap, terminate
//! - `probe`: non-blocking liveness and scheduler-activity probes
//! - `shutdown`: SIGTERM → SIGKILL escalation

mod pipes;
mod probe;
mod shutdown;

pub use pipes::{PipeSet, resolve_program};
pub use probe::{ActivityProbe, ProcStatProbe, ProcessActivity, is_alive, parse_stat};
pub use shutdown::terminate;
