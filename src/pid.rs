//! PID file: written as decimal text on startup, checked for a stale
//! live process before overwriting, removed on clean shutdown.

use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::io;
use std::path::{Path, PathBuf};

/// Returns `true` if `pid` names a process that is still alive, probed
/// with `kill(pid, None)` rather than sending any real signal.
fn is_alive(pid: i32) -> bool {
    kill(Pid::from_raw(pid), None).is_ok()
}

/// Read an existing PID file at `path` and report whether the process
/// it names is still running. A missing or unparsable file is treated
/// as "not running" rather than an error.
pub fn stale_owner(path: &Path) -> Option<i32> {
    let content = std::fs::read_to_string(path).ok()?;
    let pid: i32 = content.trim().parse().ok()?;
    is_alive(pid).then_some(pid)
}

/// Write the current process id to `path` as decimal text.
pub fn write(path: &Path) -> io::Result<()> {
    std::fs::write(path, std::process::id().to_string())
}

/// Remove the PID file, ignoring a missing file.
pub fn remove(path: &Path) {
    let _ = std::fs::remove_file(path);
}

/// A RAII guard that removes the PID file when dropped.
pub struct PidGuard(PathBuf);

impl PidGuard {
    pub fn acquire(path: &Path) -> io::Result<Self> {
        write(path)?;
        Ok(Self(path.to_path_buf()))
    }
}

impl Drop for PidGuard {
    fn drop(&mut self) {
        remove(&self.0);
    }
}
