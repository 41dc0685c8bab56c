use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::{Condvar, Mutex};
use tracing::error;

use crate::error::{Error, Result};

/// Timeline fence shared between the producer and the device. The producer
/// side issues strictly increasing values with [`advance`](Fence::advance);
/// the device side reports progress with [`signal`](Fence::signal). Value 0
/// is complete from the start, so nothing waits before the first submission.
#[derive(Clone, Debug)]
pub struct Fence(Arc<FenceInner>);

#[derive(Debug)]
struct FenceInner {
    value: AtomicU64,
    completed: AtomicU64,
    sleep: Mutex<()>,
    wakeup: Condvar,
    wait_timeout: Duration,
}

impl Fence {
    pub fn new(wait_timeout: Duration) -> Self {
        Self(Arc::new(FenceInner {
            value: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            sleep: Mutex::new(()),
            wakeup: Condvar::new(),
            wait_timeout,
        }))
    }

    pub fn advance(&self) -> u64 {
        self.0.value.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Last issued value, not necessarily completed.
    pub fn current_value(&self) -> u64 {
        self.0.value.load(Ordering::Relaxed)
    }

    /// Highest device-confirmed value. Monotonically non-decreasing.
    pub fn completed_value(&self) -> u64 {
        self.0.completed.load(Ordering::Acquire)
    }

    pub fn is_complete(&self, value: u64) -> bool {
        self.completed_value() >= value
    }

    /// Device-side progress report. A stale or duplicate report never moves
    /// the completed value backwards.
    pub fn signal(&self, value: u64) {
        {
            let _guard = self.0.sleep.lock();
            self.0.completed.fetch_max(value, Ordering::AcqRel);
        }
        self.0.wakeup.notify_all();
    }

    /// Blocks until `value` completes. Already-complete values return without
    /// touching the lock. A wait that sees no progress for the configured
    /// timeout fails with [`Error::DeviceHung`] instead of freezing.
    pub fn wait_on_cpu(&self, value: u64) -> Result<()> {
        if self.is_complete(value) {
            return Ok(());
        }

        let mut guard = self.0.sleep.lock();
        while !self.is_complete(value) {
            let timed_out = self
                .0
                .wakeup
                .wait_for(&mut guard, self.0.wait_timeout)
                .timed_out();

            if timed_out && !self.is_complete(value) {
                drop(guard);
                error!(
                    value,
                    completed = self.completed_value(),
                    timeout = ?self.0.wait_timeout,
                    "fence wait timed out"
                );
                return Err(Error::DeviceHung {
                    value,
                    timeout: self.0.wait_timeout,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::error::Error;

    use super::Fence;

    const fn is_send_sync<T: Send + Sync>() {}

    const _: () = is_send_sync::<Fence>();

    #[test]
    fn starts_complete() {
        let fence = Fence::new(Duration::from_millis(10));

        assert_eq!(fence.current_value(), 0);
        assert_eq!(fence.completed_value(), 0);
        assert!(fence.wait_on_cpu(0).is_ok());
    }

    #[test]
    fn advance_is_strictly_increasing() {
        let fence = Fence::new(Duration::from_millis(10));

        assert_eq!(fence.advance(), 1);
        assert_eq!(fence.advance(), 2);
        assert_eq!(fence.advance(), 3);
        assert_eq!(fence.current_value(), 3);
        assert_eq!(fence.completed_value(), 0);
    }

    #[test]
    fn signal_never_regresses() {
        let fence = Fence::new(Duration::from_millis(10));

        fence.signal(2);
        fence.signal(1);

        assert_eq!(fence.completed_value(), 2);
        assert!(fence.is_complete(1));
        assert!(!fence.is_complete(3));
    }

    #[test]
    fn completed_wait_returns_without_blocking() {
        // nothing will ever signal this fence again: an actual block would
        // surface as DeviceHung once the short timeout fires
        let fence = Fence::new(Duration::from_millis(5));
        fence.signal(4);

        assert!(fence.wait_on_cpu(3).is_ok());
        assert!(fence.wait_on_cpu(4).is_ok());
    }

    #[test]
    fn wait_wakes_on_signal() {
        let fence = Fence::new(Duration::from_secs(5));
        let signaler = fence.clone();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            signaler.signal(1);
        });

        let start = Instant::now();
        assert!(fence.wait_on_cpu(1).is_ok());
        assert!(start.elapsed() >= Duration::from_millis(25));

        handle.join().unwrap();
    }

    #[test]
    fn wait_times_out_when_device_hangs() {
        let fence = Fence::new(Duration::from_millis(10));

        match fence.wait_on_cpu(5) {
            Err(Error::DeviceHung { value, .. }) => assert_eq!(value, 5),
            other => panic!("expected DeviceHung, got {other:?}"),
        }
    }
}
