//! Montgomery arithmetic modulo odd moduli of run-time size.

mod element;
mod ring;
mod ring_ref;
mod uint_mont;

pub use self::{
    element::{ModRingElement, ModRingElementRef},
    ring::ModRing,
    ring_ref::{RingRef, RingRefExt},
    uint_mont::{UintExp, UintMont},
};
