use bitflags::bitflags;

/// Opaque handle to a device-resident resource. Minted by whatever layer owns
/// the device; this crate only routes it through copy commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceId(u64);

impl ResourceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const COPY_DST = 1 << 0;
        const VERTEX = 1 << 1;
        const INDEX = 1 << 2;
        const CONSTANT = 1 << 3;
    }
}
