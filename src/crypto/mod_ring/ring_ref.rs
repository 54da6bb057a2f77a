use {
    super::{ModRing, ModRingElement, UintMont},
    rand::Rng,
    std::ops::Deref,
};

/// Trait for ModRing parameter references.
///
/// Rings are only known at run time (they come from certificates), so the
/// `Uint` width is picked large enough at compile time and the parameters are
/// carried by reference.
pub trait RingRef: Copy + Deref<Target = ModRing<Self::Uint>> {
    type Uint: UintMont;
}

#[allow(clippy::wrong_self_convention)]
pub trait RingRefExt: RingRef {
    fn from_montgomery(self, value: Self::Uint) -> ModRingElement<Self>;
    fn zero(self) -> ModRingElement<Self>;
    fn one(self) -> ModRingElement<Self>;
    fn from_u64(self, value: u64) -> ModRingElement<Self>;
    fn from<T: Into<Self::Uint>>(self, value: T) -> ModRingElement<Self>;
    /// Like [`RingRefExt::from`], but `None` when `value` is not reduced.
    fn checked_from(self, value: Self::Uint) -> Option<ModRingElement<Self>>;
    /// Reads a reduced element from big-endian bytes.
    fn from_be_bytes(self, bytes: &[u8]) -> Option<ModRingElement<Self>>;
    fn random<R: Rng + ?Sized>(self, rng: &mut R) -> ModRingElement<Self>;
}

impl<Uint: UintMont> RingRef for &ModRing<Uint> {
    type Uint = Uint;
}

impl<Ring: RingRef> RingRefExt for Ring {
    #[inline(always)]
    fn from_montgomery(self, value: Ring::Uint) -> ModRingElement<Self> {
        debug_assert!(value < self.modulus());
        ModRingElement::from_montgomery(self, value)
    }

    #[inline(always)]
    fn from_u64(self, value: u64) -> ModRingElement<Self> {
        self.from(Ring::Uint::from_u64(value))
    }

    fn from<T: Into<Self::Uint>>(self, value: T) -> ModRingElement<Self> {
        let value = value.into();
        assert!(value < self.modulus());
        let value = self.mont_mul(value, self.montgomery_r2());
        self.from_montgomery(value)
    }

    fn checked_from(self, value: Ring::Uint) -> Option<ModRingElement<Self>> {
        (value < self.modulus()).then(|| self.from(value))
    }

    fn from_be_bytes(self, bytes: &[u8]) -> Option<ModRingElement<Self>> {
        self.checked_from(Ring::Uint::try_from_be_slice(bytes)?)
    }

    #[inline(always)]
    fn zero(self) -> ModRingElement<Self> {
        self.from_montgomery(Ring::Uint::from_u64(0))
    }

    #[inline(always)]
    fn one(self) -> ModRingElement<Self> {
        self.from_montgomery(self.montgomery_r())
    }

    fn random<R: Rng + ?Sized>(self, rng: &mut R) -> ModRingElement<Self> {
        self.from_montgomery(Ring::Uint::random(rng, self.modulus()))
    }
}
