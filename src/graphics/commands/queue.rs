use std::{marker::PhantomData, ops::Deref, sync::Arc};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    error::Result,
    graphics::{backend::Backend, fence::Fence},
};

use super::{batch::CommandBatch, kind::QueueKind};

#[derive(Debug)]
pub struct SubmitQueue<T: QueueKind, B: Backend>(Arc<SubmitQueueInner<T, B>>);

#[derive(Debug)]
pub struct SubmitQueueInner<T: QueueKind, B: Backend> {
    backend: B,
    fence: Fence,
    submit: Mutex<()>,

    _marker: PhantomData<T>,
}

impl<T: QueueKind, B: Backend> SubmitQueue<T, B> {
    pub fn new(backend: B, fence: Fence) -> Self {
        Self(Arc::new(SubmitQueueInner {
            backend,
            fence,
            submit: Mutex::new(()),
            _marker: PhantomData,
        }))
    }
}

impl<T: QueueKind, B: Backend> SubmitQueueInner<T, B> {
    /// Forwards the batch to the device and stamps it with the next fence
    /// value. One lock spans both steps so concurrent submitters cannot
    /// interleave batches and values out of order.
    pub fn submit(&self, batch: CommandBatch) -> u64 {
        let _guard = self.submit.lock();

        let commands = batch.len();
        self.backend.execute(batch);
        let value = self.fence.advance();
        self.backend.signal(&self.fence, value);

        debug!(queue = T::LABEL, value, commands, "submitted batch");

        value
    }

    /// Last issued fence value, not necessarily completed.
    pub fn latest_token(&self) -> u64 {
        self.fence.current_value()
    }

    pub fn is_complete(&self, value: u64) -> bool {
        self.fence.is_complete(value)
    }

    /// Full drain. Call before tearing down anything the device may still
    /// be reading.
    pub fn wait_for_latest(&self) -> Result<()> {
        self.fence.wait_on_cpu(self.latest_token())
    }

    pub fn fence(&self) -> &Fence {
        &self.fence
    }
}

impl<T: QueueKind, B: Backend> Clone for SubmitQueue<T, B> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: QueueKind, B: Backend> Deref for SubmitQueue<T, B> {
    type Target = SubmitQueueInner<T, B>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
