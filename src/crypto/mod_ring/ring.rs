use {
    super::UintMont,
    crate::{Error, Result},
};

/// Integers modulo an odd modulus, in Montgomery representation.
///
/// Moduli come from certificates (RSA moduli, curve primes and orders), so
/// construction is fallible.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ModRing<Uint: UintMont> {
    modulus: Uint,

    montgomery_r:  Uint, // 2^BITS mod modulus, the Montgomery form of one
    montgomery_r2: Uint, // R^2, converts into Montgomery form
    montgomery_r3: Uint, // R^3, corrects the factor after inversion
    mod_inv:       u64,  // -1 / modulus mod 2^64
}

impl<Uint: UintMont> ModRing<Uint> {
    pub fn new(modulus: Uint) -> Result<Self> {
        let (montgomery_r2, mod_inv) = Uint::montgomery_parameters(modulus).ok_or_else(|| {
            Error::parse(format!(
                "modulus of {} bits is not odd",
                modulus.significant_bits()
            ))
        })?;
        Ok(Self {
            modulus,
            montgomery_r: montgomery_r2.mul_redc(Uint::from_u64(1), modulus, mod_inv),
            montgomery_r2,
            montgomery_r3: montgomery_r2.square_redc(modulus, mod_inv),
            mod_inv,
        })
    }

    #[inline]
    #[must_use]
    pub const fn modulus(&self) -> Uint {
        self.modulus
    }

    #[inline]
    #[must_use]
    pub const fn montgomery_r(&self) -> Uint {
        self.montgomery_r
    }

    #[inline]
    #[must_use]
    pub const fn montgomery_r2(&self) -> Uint {
        self.montgomery_r2
    }

    #[inline]
    #[must_use]
    pub const fn montgomery_r3(&self) -> Uint {
        self.montgomery_r3
    }

    #[inline]
    #[must_use]
    pub(super) fn mont_mul(&self, a: Uint, b: Uint) -> Uint {
        a.mul_redc(b, self.modulus, self.mod_inv)
    }

    #[inline]
    #[must_use]
    pub(super) fn mont_square(&self, a: Uint) -> Uint {
        a.square_redc(self.modulus, self.mod_inv)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        ruint::{uint, Uint},
    };

    #[test]
    fn test_m31() -> Result<()> {
        type U32 = Uint<32, 1>;
        let ring = ModRing::new(uint!(2147483647_U32))?;
        assert_eq!(ring.mod_inv, 4611686020574871553_u64);
        assert_eq!(ring.montgomery_r(), uint!(4_U32));
        assert_eq!(ring.montgomery_r2(), uint!(16_U32));
        assert_eq!(ring.montgomery_r3(), uint!(64_U32));
        Ok(())
    }

    #[test]
    fn test_goldilocks() -> Result<()> {
        let ring = ModRing::new(uint!(18446744069414584321_U64))?;
        assert_eq!(ring.mod_inv, 18446744069414584319_u64);
        assert_eq!(ring.montgomery_r(), uint!(4294967295_U64));
        assert_eq!(ring.montgomery_r2(), uint!(18446744065119617025_U64));
        assert_eq!(ring.montgomery_r3(), uint!(1_U64));
        Ok(())
    }

    #[test]
    fn test_p256_order() -> Result<()> {
        let ring = ModRing::new(uint!(
            0xffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551_U256
        ))?;
        assert_eq!(ring.mod_inv, 14758798090332847183_u64);
        assert_eq!(
            ring.montgomery_r(),
            uint!(0xffffffff00000000000000004319055258e8617b0c46353d039cdaaf_U256)
        );
        assert_eq!(
            ring.montgomery_r2(),
            uint!(0x66e12d94f3d956202845b2392b6bec594699799c49bd6fa683244c95be79eea2_U256)
        );
        assert_eq!(
            ring.montgomery_r3(),
            uint!(0x503a54e76407be652543b9246ba5e93f111f28ae0c0555c9ac8ebec90b65a624_U256)
        );
        Ok(())
    }

    #[test]
    fn test_even_modulus() {
        assert!(matches!(
            ModRing::new(uint!(0x10000_U256)),
            Err(Error::Parse(_))
        ));
        assert!(ModRing::new(uint!(0_U256)).is_err());
    }
}
