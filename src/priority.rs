//! Best-effort process priority boost
//!
//! Camera, pose and hit threads all live in this process; a lower nice value
//! keeps them ahead of background work. Failing to raise it (no
//! CAP_SYS_NICE, not root) is normal and only logged.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityResult {
    Success,
    Failed,
    Unsupported,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Unix Implementation
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(unix)]
pub fn raise_process_priority(nice: i32) -> PriorityResult {
    // who = 0: the calling process
    let result = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, nice) };

    if result == 0 {
        PriorityResult::Success
    } else {
        log::debug!(
            "setpriority({}) failed: {}",
            nice,
            std::io::Error::last_os_error()
        );
        PriorityResult::Failed
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Unsupported Platforms
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(not(unix))]
pub fn raise_process_priority(_nice: i32) -> PriorityResult {
    PriorityResult::Unsupported
}
