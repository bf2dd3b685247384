//! Fault injection.

#[cfg(unix)]
fn kill_self() {
    // SAFETY: `getpid` has no preconditions, and signalling our own process is always valid.
    unsafe {
        libc::kill(libc::getpid(), libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_self() {}

/// Kills the current process immediately.
///
/// On Unix platforms, the process sends itself `SIGKILL`, which cannot be caught or handled: no destructors run, no
/// buffers are flushed, and the host receives no notification. Elsewhere, the process is aborted.
///
/// This is only meant for exercising the failure handling of whatever is driving the relay.
pub fn simulate_fatal_fault() -> ! {
    kill_self();
    std::process::abort()
}
