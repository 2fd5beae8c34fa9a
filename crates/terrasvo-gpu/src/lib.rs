//! Host side of the node buffer shared with the device.
//!
//! This crate provides:
//! - A host-memory buffer that emulates the device's atomic append cursor
//! - Fences for draining in-flight device work
//! - The download → check → gc → upload maintenance critical section

pub mod error;
pub mod memory;
pub mod shared;
pub mod sync;

pub use error::{GpuError, Result};
pub use memory::HostBuffer;
pub use shared::{MaintenanceReport, SharedNodeBuffer};
pub use sync::{DeviceFence, DispatchGuard, HostFence};
