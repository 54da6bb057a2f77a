use {
    num_traits::{PrimInt, Unsigned},
    rand::Rng,
    ruint::{aliases::U64, Uint},
    std::fmt::Debug,
    subtle::{Choice, ConditionallySelectable, ConstantTimeEq},
};

/// Exponents for constant time exponentiation and scalar multiplication.
pub trait UintExp {
    /// Upper bound on the position of the highest set bit.
    fn bit_len(&self) -> usize;

    /// Whether bit `index` is set.
    fn bit_ct(&self, index: usize) -> Choice;
}

impl<T> UintExp for T
where
    T: PrimInt + Unsigned + ConstantTimeEq,
{
    fn bit_len(&self) -> usize {
        T::zero().count_zeros() as usize
    }

    fn bit_ct(&self, index: usize) -> Choice {
        let bit = T::one() << index;
        (*self & bit).ct_eq(&bit)
    }
}

/// Trait for Uint backends supporting Montgomery multiplication.
///
/// Implemented for every Ruint size, so key sizes are picked at run time by
/// dispatching on a handful of widths instead of threading const generics
/// through the verifiers.
pub trait UintMont:
    Sized
    + Copy
    + PartialEq
    + Eq
    + PartialOrd
    + Debug
    + ConstantTimeEq
    + ConditionallySelectable
    + UintExp
{
    /// Montgomery `R^2 mod modulus` and `-1 / modulus mod 2^64`, `None` for
    /// even moduli.
    fn montgomery_parameters(modulus: Self) -> Option<(Self, u64)>;
    fn from_u64(value: u64) -> Self;
    fn random<R: Rng + ?Sized>(rng: &mut R, max: Self) -> Self;
    fn add_mod(self, other: Self, modulus: Self) -> Self;
    fn sub_mod(self, other: Self, modulus: Self) -> Self;
    fn mul_redc(self, other: Self, modulus: Self, mod_inv: u64) -> Self;
    fn square_redc(self, modulus: Self, mod_inv: u64) -> Self;
    fn inv_mod(self, modulus: Self) -> Option<Self>;

    /// Big-endian bytes, `None` if the value does not fit.
    fn try_from_be_slice(bytes: &[u8]) -> Option<Self>;

    /// Big-endian bytes at full width.
    fn to_be_vec(self) -> Vec<u8>;

    /// Position of the highest set bit plus one, zero for zero.
    fn significant_bits(self) -> usize;

    fn reduce_mod(self, modulus: Self) -> Self;
}

impl<const BITS: usize, const LIMBS: usize> UintMont for Uint<BITS, LIMBS> {
    fn montgomery_parameters(modulus: Self) -> Option<(Self, u64)> {
        let mod_inv = U64::wrapping_from(modulus).inv_ring()?.wrapping_neg().to();

        // Squaring 2^(32 * LIMBS) twice gives 2^(128 * LIMBS) = R^2.
        let mut r2 = Self::ZERO;
        if Self::BITS > 32 {
            r2.set_bit(32 * Self::LIMBS, true);
        } else {
            r2 = Self::from((1_u64 << 32) % modulus.to::<u64>());
        }
        r2 = r2.mul_mod(r2, modulus);
        Some((r2.mul_mod(r2, modulus), mod_inv))
    }

    #[inline]
    fn from_u64(value: u64) -> Self {
        Self::from(value)
    }

    fn random<R: Rng + ?Sized>(rng: &mut R, max: Self) -> Self {
        let leading_zeros = max.leading_zeros();
        loop {
            let mut value = rng.gen::<Self>();
            value >>= leading_zeros;
            if value <= max {
                return value;
            }
        }
    }

    #[inline]
    fn add_mod(self, other: Self, modulus: Self) -> Self {
        let (sum, carry) = self.overflowing_add(other);
        let (reduced, borrow) = sum.overflowing_sub(modulus);
        if carry | !borrow {
            reduced
        } else {
            sum
        }
    }

    #[inline]
    fn sub_mod(self, other: Self, modulus: Self) -> Self {
        let (result, borrow) = self.overflowing_sub(other);
        if borrow {
            result.wrapping_add(modulus)
        } else {
            result
        }
    }

    #[inline]
    fn mul_redc(self, other: Self, modulus: Self, mod_inv: u64) -> Self {
        Self::mul_redc(self, other, modulus, mod_inv)
    }

    #[inline]
    fn square_redc(self, modulus: Self, mod_inv: u64) -> Self {
        Self::square_redc(self, modulus, mod_inv)
    }

    #[inline]
    fn inv_mod(self, modulus: Self) -> Option<Self> {
        Self::inv_mod(self, modulus)
    }

    fn try_from_be_slice(bytes: &[u8]) -> Option<Self> {
        Self::try_from_be_slice(bytes)
    }

    fn to_be_vec(self) -> Vec<u8> {
        self.to_be_bytes_vec()
    }

    #[inline]
    fn significant_bits(self) -> usize {
        self.bit_len()
    }

    #[inline]
    fn reduce_mod(self, modulus: Self) -> Self {
        Self::reduce_mod(self, modulus)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        hex_literal::hex,
        ruint::{aliases::U256, uint},
    };

    #[test]
    fn test_bytes() {
        type U2048 = Uint<2048, 32>;
        let bytes = hex!("010001");
        let value = U2048::try_from_be_slice(&bytes).expect("fits");
        assert_eq!(value, U2048::from(65537_u64));
        assert_eq!(value.significant_bits(), 17);
        let full = UintMont::to_be_vec(value);
        assert_eq!(full.len(), 256);
        assert_eq!(&full[253..], &bytes);
        assert!(U256::try_from_be_slice(&[1; 33]).is_none());
        assert_eq!(UintMont::reduce_mod(uint!(1000_U256), uint!(7_U256)), uint!(6_U256));
    }

    #[test]
    fn test_exponent_bits() {
        let exponent = 65537_u32;
        assert_eq!(exponent.bit_len(), 32);
        let set = (0..32)
            .filter(|&i| bool::from(exponent.bit_ct(i)))
            .collect::<Vec<_>>();
        assert_eq!(set, [0, 16]);
        assert_eq!(uint!(65537_U256).bit_len(), 17);
        assert!(bool::from(uint!(65537_U256).bit_ct(16)));
    }

    #[test]
    fn test_even_modulus() {
        assert!(U256::montgomery_parameters(uint!(65536_U256)).is_none());
        assert!(U256::montgomery_parameters(uint!(65537_U256)).is_some());
    }
}
