//! Local execution transport: subprocesses and filesystem side effects.

pub mod local;

use std::process::ExitStatus;

/// Exit code reported for a finished subprocess.
///
/// A process killed by a signal has no exit code; it reports `128 + signal`
/// the way POSIX shells do.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
