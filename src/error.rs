use std::time::Duration;

use thiserror::Error;

use crate::graphics::types::{BufferUsage, ResourceId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(
        "upload ring out of space: requested {requested} bytes, {in_use}/{capacity} bytes in flight"
    )]
    OutOfSpace {
        requested: usize,
        in_use: usize,
        capacity: usize,
    },

    #[error("allocation of {requested} bytes exceeds ring capacity of {capacity} bytes")]
    ExceedsCapacity { requested: usize, capacity: usize },

    #[error("alignment {alignment} is not a power of two")]
    BadAlignment { alignment: usize },

    #[error(
        "copy of {size} bytes at offset {dst_offset} overruns destination buffer of {dst_size} bytes"
    )]
    CopyOutOfBounds {
        dst_offset: usize,
        size: usize,
        dst_size: usize,
    },

    #[error("destination buffer {id:?} is not writable by copies (usage {usage:?})")]
    InvalidDestination { id: ResourceId, usage: BufferUsage },

    #[error("fence wait for value {value} timed out after {timeout:?}; device presumed hung")]
    DeviceHung { value: u64, timeout: Duration },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: &'static str },
}
