use std::time::Duration;

use crate::error::{Error, Result};

/// Initialization-time tuning for the staging core. All values are fixed for
/// the lifetime of the system; there is no runtime resize.
#[derive(Clone, Debug)]
pub struct StagingConfig {
    /// Total byte capacity of the upload ring.
    pub upload_capacity: usize,
    /// Number of frame recording contexts rotated by the frame ring.
    pub frames_in_flight: usize,
    /// Minimum placement alignment for staged copies.
    pub copy_alignment: usize,
    /// Placement alignment for shader-constant blocks.
    pub constant_alignment: usize,
    /// Diagnostic ceiling on any single fence wait before the device is
    /// presumed hung.
    pub wait_timeout: Duration,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            upload_capacity: 16 * 1024 * 1024,
            frames_in_flight: 3,
            copy_alignment: 4,
            constant_alignment: 256,
            wait_timeout: Duration::from_secs(5),
        }
    }
}

impl StagingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.upload_capacity == 0 {
            return Err(Error::InvalidConfig {
                reason: "upload_capacity must be non-zero",
            });
        }

        if !(2..=4).contains(&self.frames_in_flight) {
            return Err(Error::InvalidConfig {
                reason: "frames_in_flight must be between 2 and 4",
            });
        }

        if !self.copy_alignment.is_power_of_two() {
            return Err(Error::InvalidConfig {
                reason: "copy_alignment must be a power of two",
            });
        }

        if !self.constant_alignment.is_power_of_two() {
            return Err(Error::InvalidConfig {
                reason: "constant_alignment must be a power of two",
            });
        }

        Ok(())
    }
}
