use std::collections::VecDeque;

use bytemuck::Pod;
use tracing::{error, trace, warn};

use crate::{
    config::StagingConfig,
    error::{Error, Result},
    graphics::{
        commands::{Command, CommandBatch},
        fence::Fence,
        types::BufferUsage,
        utils::align_up,
    },
};

use super::buffer::DeviceBuffer;

/// One staged range still owned by an in-flight (or not yet submitted)
/// batch. Entries are queued in allocation order, which coincides with
/// fence-value order because values only grow.
#[derive(Debug)]
struct PendingUpload {
    offset: usize,
    size: usize,
    fence_value: u64,
}

/// Fixed-capacity ring the producer stages bytes into before the device
/// copies them to their resident destination. A range is reused only after
/// the fence value of the batch that read it has retired; reclamation polls
/// the fence and never blocks.
#[derive(Debug)]
pub struct UploadRing {
    buffer: Box<[u8]>,
    // live region is head..tail, wrapping through the buffer end; emptiness
    // is tracked by `pending`, not by cursor equality, so a placement flush
    // against head stays unambiguous
    head: usize,
    tail: usize,
    pending: VecDeque<PendingUpload>,
    fence: Fence,
    copy_alignment: usize,
    constant_alignment: usize,
}

#[derive(Debug)]
pub struct UploadSlice<'a> {
    pub offset: usize,
    pub bytes: &'a mut [u8],
}

impl UploadRing {
    pub fn new(config: &StagingConfig, fence: Fence) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            buffer: vec![0; config.upload_capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            pending: VecDeque::new(),
            fence,
            copy_alignment: config.copy_alignment,
            constant_alignment: config.constant_alignment,
        })
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes not currently available for placement, abandoned wrap gaps
    /// included.
    pub fn in_use_bytes(&self) -> usize {
        if self.pending.is_empty() {
            0
        } else if self.head < self.tail {
            self.tail - self.head
        } else {
            self.buffer.len() - self.head + self.tail
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Reserves `size` bytes aligned to `alignment` and hands back the
    /// writable range. The range belongs to the batch currently being
    /// recorded: it is stamped with the fence value the next submission will
    /// receive, so a recorded batch must be submitted before the next one
    /// starts staging.
    pub fn allocate(&mut self, size: usize, alignment: usize) -> Result<UploadSlice<'_>> {
        if !alignment.is_power_of_two() {
            return Err(Error::BadAlignment { alignment });
        }
        let alignment = alignment.max(self.copy_alignment);

        if size == 0 {
            return Ok(UploadSlice {
                offset: self.tail,
                bytes: &mut [],
            });
        }

        if size > self.buffer.len() {
            error!(
                size,
                capacity = self.buffer.len(),
                "allocation exceeds ring capacity"
            );
            return Err(Error::ExceedsCapacity {
                requested: size,
                capacity: self.buffer.len(),
            });
        }

        let offset = match self.find_offset(size, alignment) {
            Some(offset) => offset,
            None => {
                // out of room: claim whatever the device has finished with,
                // then retry the placement once
                warn!(
                    size,
                    in_use = self.in_use_bytes(),
                    "upload ring full, reclaiming"
                );
                self.reclaim_completed();

                match self.find_offset(size, alignment) {
                    Some(offset) => offset,
                    None => {
                        let in_use = self.in_use_bytes();
                        error!(
                            size,
                            in_use,
                            capacity = self.buffer.len(),
                            "upload ring exhausted"
                        );
                        return Err(Error::OutOfSpace {
                            requested: size,
                            in_use,
                            capacity: self.buffer.len(),
                        });
                    }
                }
            }
        };

        self.tail = offset + size;
        self.pending.push_back(PendingUpload {
            offset,
            size,
            fence_value: self.fence.current_value() + 1,
        });
        trace!(offset, size, alignment, "staged range");

        Ok(UploadSlice {
            offset,
            bytes: &mut self.buffer[offset..offset + size],
        })
    }

    // Placement policy: grow in place past the tail, else wrap to the buffer
    // start (abandoning the tail gap until head passes it), else fail.
    fn find_offset(&self, size: usize, alignment: usize) -> Option<usize> {
        let capacity = self.buffer.len();

        if self.pending.is_empty() {
            debug_assert_eq!((self.head, self.tail), (0, 0));
            return (size <= capacity).then_some(0);
        }

        if self.head < self.tail {
            // live region is contiguous; free space is the tail gap plus the
            // region before head
            let offset = align_up(self.tail, alignment);
            if offset + size <= capacity {
                Some(offset)
            } else if size <= self.head {
                Some(0)
            } else {
                None
            }
        } else {
            // live region wraps; only tail..head is free
            let offset = align_up(self.tail, alignment);
            if offset + size <= self.head {
                Some(offset)
            } else {
                None
            }
        }
    }

    /// Frees exactly the ranges whose fence value has retired, in submission
    /// order. Non-blocking; the hot allocation path only ever polls.
    pub fn reclaim_completed(&mut self) -> usize {
        let completed = self.fence.completed_value();
        let mut freed = 0;

        while self
            .pending
            .front()
            .is_some_and(|front| front.fence_value <= completed)
        {
            if let Some(front) = self.pending.pop_front() {
                // advancing past the entry also releases alignment padding
                // before it and, on wrap, the abandoned bytes at the end
                self.head = front.offset + front.size;
                if self.head == self.buffer.len() {
                    self.head = 0;
                }
                freed += front.size;
            }
        }

        if self.pending.is_empty() {
            // nothing outstanding: collapse wrap fragmentation
            self.head = 0;
            self.tail = 0;
        }

        if freed > 0 {
            trace!(
                freed,
                completed,
                remaining = self.pending.len(),
                "reclaimed staged ranges"
            );
        }

        freed
    }

    /// Stages `data` and records the copy to its destination into `batch`.
    /// Returns the staging offset.
    pub fn upload_and_copy(
        &mut self,
        batch: &mut CommandBatch,
        dst: &DeviceBuffer,
        dst_offset: usize,
        data: &[u8],
        alignment: usize,
    ) -> Result<usize> {
        if !dst.usage().contains(BufferUsage::COPY_DST) {
            return Err(Error::InvalidDestination {
                id: dst.id(),
                usage: dst.usage(),
            });
        }

        let end = dst_offset.checked_add(data.len());
        if end.map_or(true, |end| end > dst.size()) {
            return Err(Error::CopyOutOfBounds {
                dst_offset,
                size: data.len(),
                dst_size: dst.size(),
            });
        }

        let slice = self.allocate(data.len(), alignment)?;
        slice.bytes.copy_from_slice(data);
        let offset = slice.offset;

        if !data.is_empty() {
            batch.push(Command::CopyBuffer {
                dst: dst.id(),
                dst_offset,
                src_offset: offset,
                size: data.len(),
            });
        }

        Ok(offset)
    }

    /// Stages one shader-constant block at the device's constant alignment.
    /// `index` addresses the destination as an array of aligned blocks.
    pub fn upload_constants<T: Pod>(
        &mut self,
        batch: &mut CommandBatch,
        dst: &DeviceBuffer,
        index: usize,
        value: &T,
    ) -> Result<usize> {
        let stride = align_up(size_of::<T>(), self.constant_alignment);
        let dst_offset = index.saturating_mul(stride);

        self.upload_and_copy(
            batch,
            dst,
            dst_offset,
            bytemuck::bytes_of(value),
            self.constant_alignment,
        )
    }

    /// Blocks until every submitted staged range has retired, then reclaims.
    /// Ranges staged for a batch that was never submitted are left pending.
    pub fn drain(&mut self) -> Result<()> {
        if let Some(last) = self.pending.back().map(|p| p.fence_value) {
            self.fence.wait_on_cpu(last.min(self.fence.current_value()))?;
        }
        self.reclaim_completed();

        Ok(())
    }
}
