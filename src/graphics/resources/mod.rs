mod buffer;
mod staging;

pub use buffer::*;
pub use staging::*;
