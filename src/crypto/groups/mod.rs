//! Elliptic curve groups for ECDSA verification.

mod elliptic_curve;
pub mod named;

pub use self::elliptic_curve::{EllipticCurve, EllipticCurvePoint};
