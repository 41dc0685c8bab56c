use std::{collections::VecDeque, ops::Deref, sync::Arc};

use parking_lot::Mutex;
use tracing::trace;

use super::{
    commands::{Command, CommandBatch},
    fence::Fence,
};

/// The asynchronous consumer boundary. A real binding forwards batches to a
/// device queue and turns [`signal`](Backend::signal) into a queue-side fence
/// signal that fires once everything handed over before it has executed.
pub trait Backend: Send + Sync + 'static {
    fn execute(&self, batch: CommandBatch);

    fn signal(&self, fence: &Fence, value: u64);
}

/// Headless device: retains executed batches and holds signals back until
/// driven with [`complete_one`](SimDevice::complete_one), or reports them
/// immediately in [`immediate`](SimDevice::immediate) mode. Batches complete
/// strictly in submission order, matching a single hardware queue.
#[derive(Clone, Debug, Default)]
pub struct SimDevice(Arc<SimDeviceInner>);

#[derive(Debug, Default)]
pub struct SimDeviceInner {
    immediate: bool,
    executed: Mutex<Vec<CommandBatch>>,
    pending_signals: Mutex<VecDeque<(Fence, u64)>>,
}

impl SimDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn immediate() -> Self {
        Self(Arc::new(SimDeviceInner {
            immediate: true,
            ..Default::default()
        }))
    }

    /// Retires the oldest outstanding submission. Returns false when the
    /// device is idle.
    pub fn complete_one(&self) -> bool {
        let next = self.pending_signals.lock().pop_front();

        match next {
            Some((fence, value)) => {
                trace!(value, "device completed submission");
                fence.signal(value);
                true
            }
            None => false,
        }
    }

    pub fn complete_all(&self) {
        while self.complete_one() {}
    }

    pub fn executed_batches(&self) -> usize {
        self.executed.lock().len()
    }

    pub fn executed_commands(&self) -> Vec<Command> {
        self.executed
            .lock()
            .iter()
            .flat_map(|batch| batch.commands().iter().copied())
            .collect()
    }
}

impl Deref for SimDevice {
    type Target = SimDeviceInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Backend for SimDevice {
    fn execute(&self, batch: CommandBatch) {
        self.executed.lock().push(batch);
    }

    fn signal(&self, fence: &Fence, value: u64) {
        if self.immediate {
            fence.signal(value);
        } else {
            self.pending_signals.lock().push_back((fence.clone(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::graphics::{commands::CommandBatch, fence::Fence};

    use super::{Backend, SimDevice};

    const fn is_send_sync<T: Send + Sync>() {}

    const _: () = is_send_sync::<SimDevice>();

    #[test]
    fn immediate_mode_signals_at_once() {
        let device = SimDevice::immediate();
        let fence = Fence::new(Duration::from_millis(10));

        device.execute(CommandBatch::new());
        device.signal(&fence, 1);

        assert_eq!(fence.completed_value(), 1);
        assert_eq!(device.executed_batches(), 1);
    }

    #[test]
    fn deferred_mode_completes_in_order() {
        let device = SimDevice::new();
        let fence = Fence::new(Duration::from_millis(10));

        device.signal(&fence, 1);
        device.signal(&fence, 2);
        assert_eq!(fence.completed_value(), 0);

        assert!(device.complete_one());
        assert_eq!(fence.completed_value(), 1);

        assert!(device.complete_one());
        assert_eq!(fence.completed_value(), 2);

        assert!(!device.complete_one());
    }
}
