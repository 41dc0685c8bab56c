#![allow(private_bounds)]

use crate::graphics::Sealed;

pub trait QueueKind: Sealed {
    const LABEL: &'static str;
}

#[derive(Clone, Copy, Debug)]
pub struct Graphics;
impl Sealed for Graphics {}
impl QueueKind for Graphics {
    const LABEL: &'static str = "graphics";
}

#[derive(Clone, Copy, Debug)]
pub struct Compute;
impl Sealed for Compute {}
impl QueueKind for Compute {
    const LABEL: &'static str = "compute";
}

#[derive(Clone, Copy, Debug)]
pub struct Transfer;
impl Sealed for Transfer {}
impl QueueKind for Transfer {
    const LABEL: &'static str = "transfer";
}
