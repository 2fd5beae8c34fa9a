//! Node buffer shared between host maintenance and device dispatches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use terrasvo_core::GpuBuffer;
use terrasvo_octree::{CheckReport, Octree};
use tracing::{info, warn};

use crate::error::{GpuError, Result};
use crate::sync::DeviceFence;

/// Default time to wait for in-flight dispatches before maintenance gives up.
pub const DEFAULT_FENCE_TIMEOUT: Duration = Duration::from_secs(1);

/// Outcome of one [`SharedNodeBuffer::maintain`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Node count read back from the device.
    pub downloaded: usize,
    /// Node count after compaction, now resident on the device.
    pub compacted: usize,
    /// Verification of the downloaded tree, if requested.
    pub check: Option<CheckReport>,
}

impl MaintenanceReport {
    /// Slots given back by compaction.
    pub fn reclaimed(&self) -> usize {
        self.downloaded.saturating_sub(self.compacted)
    }
}

/// A device node buffer guarded for exclusive access.
///
/// Dispatches reach the buffer through [`with_device`](Self::with_device);
/// maintenance holds the same lock for its whole read-modify-write, so the
/// device can never append into a buffer that is about to be replaced.
pub struct SharedNodeBuffer<B: GpuBuffer> {
    buffer: Mutex<B>,
    published: AtomicBool,
    fence_timeout: Duration,
}

impl<B: GpuBuffer> SharedNodeBuffer<B> {
    pub fn new(buffer: B) -> Self {
        Self {
            buffer: Mutex::new(buffer),
            published: AtomicBool::new(false),
            fence_timeout: DEFAULT_FENCE_TIMEOUT,
        }
    }

    /// Set how long maintenance waits for the device to go idle.
    pub fn with_fence_timeout(mut self, timeout: Duration) -> Self {
        self.fence_timeout = timeout;
        self
    }

    /// Upload `tree` as the buffer's new contents.
    pub fn publish(&self, tree: &Octree) -> Result<()> {
        let mut buffer = self.buffer.lock();
        tree.upload(&mut *buffer)?;
        self.published.store(true, Ordering::Release);
        Ok(())
    }

    /// Run `dispatch` with exclusive access to the buffer.
    pub fn with_device<R>(&self, dispatch: impl FnOnce(&mut B) -> R) -> R {
        let mut buffer = self.buffer.lock();
        dispatch(&mut *buffer)
    }

    /// Reclaim space the device has used since the last upload.
    ///
    /// Under the buffer lock: wait for in-flight dispatches, download the
    /// node array into `tree`, optionally verify it, compact it and upload
    /// the result. On success `tree` is the compacted tree and matches the
    /// buffer. Fails with `InvalidState` if no tree was ever published.
    /// If the fence times out nothing has been touched; if
    /// compaction fails `tree` holds the downloaded array and the buffer is
    /// left as the device wrote it.
    ///
    /// A dispatch must not wait for the buffer lock while it is counted by
    /// `fence`, or this waits out the full timeout.
    pub fn maintain<F>(
        &self,
        tree: &mut Octree,
        fence: &F,
        check: bool,
    ) -> Result<MaintenanceReport>
    where
        F: DeviceFence + ?Sized,
    {
        let mut buffer = self.buffer.lock();
        if !self.published.load(Ordering::Acquire) {
            return Err(GpuError::InvalidState(
                "maintenance before any tree was published".to_string(),
            ));
        }
        fence.wait_idle(self.fence_timeout)?;

        tree.download(&*buffer)?;
        let downloaded = tree.node_count();

        let check = check.then(|| tree.check());
        if let Some(report) = check.filter(|report| report.dangling > 0) {
            warn!("Downloaded octree has broken pointers: {}", report);
        }

        let compact = tree.gc()?;
        compact.upload(&mut *buffer)?;
        *tree = compact;

        let report = MaintenanceReport {
            downloaded,
            compacted: tree.node_count(),
            check,
        };
        info!(
            "Maintenance reclaimed {} of {} nodes",
            report.reclaimed(),
            report.downloaded
        );
        Ok(report)
    }

    pub fn into_inner(self) -> B {
        self.buffer.into_inner()
    }
}
