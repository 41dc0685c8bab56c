use crate::graphics::types::{BufferUsage, ResourceId};

/// Handle to a device-resident buffer used as a copy destination. The
/// resource itself lives behind the backend; this carries just enough for
/// copy-range validation.
#[derive(Clone, Copy, Debug)]
pub struct DeviceBuffer {
    id: ResourceId,
    size: usize,
    usage: BufferUsage,
}

impl DeviceBuffer {
    pub fn new(id: ResourceId, size: usize, usage: BufferUsage) -> Self {
        Self { id, size, usage }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}
