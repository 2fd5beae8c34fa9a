//! Synchronization with in-flight device work.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam::utils::Backoff;

use crate::error::{GpuError, Result};

/// Something that can wait for every outstanding dispatch touching the node buffer.
pub trait DeviceFence {
    /// Block until no dispatch is in flight, or fail after `timeout`.
    fn wait_idle(&self, timeout: Duration) -> Result<()>;
}

/// Fence for dispatches emulated on the host.
///
/// Each dispatch holds a [`DispatchGuard`] for as long as it runs.
#[derive(Debug, Default)]
pub struct HostFence {
    in_flight: AtomicUsize,
}

impl HostFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a dispatch as started. It ends when the guard is dropped.
    pub fn begin_dispatch(&self) -> DispatchGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        DispatchGuard { fence: self }
    }

    /// Number of dispatches currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl DeviceFence for HostFence {
    fn wait_idle(&self, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        let backoff = Backoff::new();
        while self.in_flight() > 0 {
            if start.elapsed() >= timeout {
                return Err(GpuError::FenceTimeout(timeout));
            }
            if backoff.is_completed() {
                std::thread::yield_now();
            } else {
                backoff.snooze();
            }
        }
        Ok(())
    }
}

/// An emulated dispatch in progress.
#[must_use = "the dispatch ends as soon as the guard is dropped"]
pub struct DispatchGuard<'a> {
    fence: &'a HostFence,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.fence.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
