mod batch;
mod frame_ring;
mod kind;
mod queue;

pub use batch::*;
pub use frame_ring::*;
pub use kind::*;
pub use queue::*;
