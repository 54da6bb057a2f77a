//! Signature verification primitives.
//!
//! All arithmetic runs on the Montgomery [`mod_ring`], with the integer
//! width chosen per key from a few fixed sizes.

pub mod ecdsa;
pub mod groups;
pub mod mod_ring;
pub mod rsa;
pub mod signature;

pub use self::groups::{EllipticCurve, EllipticCurvePoint};
use {
    self::mod_ring::UintMont,
    crate::{Error, Result},
    num_bigint::BigUint,
};

/// Converts to a fixed width integer, failing if it does not fit.
pub(crate) fn uint_from_biguint<U: UintMont>(value: &BigUint) -> Result<U> {
    U::try_from_be_slice(&value.to_bytes_be()).ok_or(Error::Overflow {
        bits: U::from_u64(0).bit_len(),
    })
}

pub(crate) fn biguint_from_uint<U: UintMont>(value: U) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_vec())
}

#[cfg(test)]
mod tests {
    use {super::*, ruint::aliases::U256};

    #[test]
    fn test_biguint_conversion() {
        let value = BigUint::from(0xdead_beef_u64) << 200_u32;
        let uint = uint_from_biguint::<U256>(&value).expect("fits");
        assert_eq!(biguint_from_uint(uint), value);
        assert!(matches!(
            uint_from_biguint::<U256>(&(BigUint::from(1_u8) << 256_u32)),
            Err(Error::Overflow { bits: 256 })
        ));
    }
}
