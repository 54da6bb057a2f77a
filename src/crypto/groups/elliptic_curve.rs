use {
    super::super::mod_ring::{ModRing, ModRingElementRef, RingRefExt, UintExp, UintMont},
    crate::{ensure_err, Error, Result},
    num_traits::Inv,
    std::{
        fmt::{self, Formatter},
        ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign},
    },
    subtle::{Choice, ConditionallySelectable, ConstantTimeEq},
};

/// Short Weierstrass curve `y^2 = x^3 + a x + b` over a prime field, with a
/// generator of prime order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct EllipticCurve<U: UintMont> {
    base_field:      ModRing<U>,
    scalar_field:    ModRing<U>,
    a_monty:         U,
    b_monty:         U,
    cofactor:        U,
    generator_monty: (U, U),
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EllipticCurvePoint<'a, U: UintMont> {
    curve:       &'a EllipticCurve<U>,
    coordinates: Coordinates<'a, U>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Coordinates<'a, U: UintMont> {
    Infinity,
    Affine(ModRingElementRef<'a, U>, ModRingElementRef<'a, U>),
}

fn invalid(message: &str) -> Error {
    Error::parse(format!("invalid curve: {message}"))
}

impl<U: UintMont> EllipticCurve<U> {
    pub fn new(modulus: U, a: U, b: U, x: U, y: U, order: U, cofactor: U) -> Result<Self> {
        ensure_err!(a < modulus, invalid("a not in field"));
        ensure_err!(b < modulus, invalid("b not in field"));
        ensure_err!(x < modulus, invalid("x not in field"));
        ensure_err!(y < modulus, invalid("y not in field"));
        ensure_err!(modulus != order, invalid("anomalous curve"));

        let base_field = ModRing::new(modulus).map_err(|_| invalid("even modulus"))?;
        let scalar_field = ModRing::new(order).map_err(|_| invalid("even order"))?;
        let a = (&base_field).from(a);
        let b = (&base_field).from(b);
        let x = (&base_field).from(x);
        let y = (&base_field).from(y);

        let c4 = (&base_field).from_u64(4);
        let c27 = (&base_field).from_u64(27);
        ensure_err!(
            !(c4 * a.pow(3) + c27 * b.pow(2)).is_zero(),
            invalid("singular curve")
        );
        ensure_err!(
            y.pow(2) == x.pow(3) + a * x + b,
            invalid("generator not on curve")
        );

        let curve = Self {
            a_monty: a.as_montgomery(),
            b_monty: b.as_montgomery(),
            cofactor,
            generator_monty: (x.as_montgomery(), y.as_montgomery()),
            base_field,
            scalar_field,
        };
        ensure_err!(
            curve.generator().mul_uint(order) == curve.infinity(),
            invalid("generator order mismatch")
        );
        Ok(curve)
    }

    /// Builds a curve from unsigned big-endian domain parameters.
    pub fn from_be_bytes(
        modulus: &[u8],
        a: &[u8],
        b: &[u8],
        generator: (&[u8], &[u8]),
        order: &[u8],
        cofactor: &[u8],
    ) -> Result<Self> {
        let uint = |bytes: &[u8]| {
            U::try_from_be_slice(bytes).ok_or(Error::Overflow {
                bits: U::from_u64(0).bit_len(),
            })
        };
        Self::new(
            uint(modulus)?,
            uint(a)?,
            uint(b)?,
            uint(generator.0)?,
            uint(generator.1)?,
            uint(order)?,
            uint(cofactor)?,
        )
    }

    pub const fn base_field(&self) -> &ModRing<U> {
        &self.base_field
    }

    pub const fn scalar_field(&self) -> &ModRing<U> {
        &self.scalar_field
    }

    pub fn a(&self) -> ModRingElementRef<'_, U> {
        self.base_field.from_montgomery(self.a_monty)
    }

    pub fn b(&self) -> ModRingElementRef<'_, U> {
        self.base_field.from_montgomery(self.b_monty)
    }

    pub const fn cofactor(&self) -> U {
        self.cofactor
    }

    pub fn generator(&self) -> EllipticCurvePoint<'_, U> {
        EllipticCurvePoint {
            curve:       self,
            coordinates: Coordinates::Affine(
                self.base_field.from_montgomery(self.generator_monty.0),
                self.base_field.from_montgomery(self.generator_monty.1),
            ),
        }
    }

    /// Point at infinity
    pub const fn infinity(&self) -> EllipticCurvePoint<'_, U> {
        EllipticCurvePoint {
            curve:       self,
            coordinates: Coordinates::Infinity,
        }
    }

    /// Validated affine point.
    pub fn from_affine<'a>(
        &'a self,
        x: ModRingElementRef<'a, U>,
        y: ModRingElementRef<'a, U>,
    ) -> Result<EllipticCurvePoint<'a, U>> {
        self.ensure_valid(x, y)?;
        Ok(EllipticCurvePoint {
            curve:       self,
            coordinates: Coordinates::Affine(x, y),
        })
    }

    /// Validated affine point from big-endian coordinates.
    pub fn point_from_be_bytes(&self, x: &[u8], y: &[u8]) -> Result<EllipticCurvePoint<'_, U>> {
        let coordinate = |bytes: &[u8]| {
            (&self.base_field)
                .from_be_bytes(bytes)
                .ok_or_else(|| Error::parse("point coordinate not in field"))
        };
        self.from_affine(coordinate(x)?, coordinate(y)?)
    }

    fn ensure_valid<'a>(
        &'a self,
        x: ModRingElementRef<'a, U>,
        y: ModRingElementRef<'a, U>,
    ) -> Result<()> {
        ensure_err!(
            x.ring() == &self.base_field && y.ring() == &self.base_field,
            Error::parse("point coordinates from another field")
        );
        ensure_err!(
            y.pow(2) == x.pow(3) + self.a() * x + self.b(),
            Error::parse("point not on curve")
        );
        if self.cofactor() != U::from_u64(1) {
            let point = EllipticCurvePoint {
                curve:       self,
                coordinates: Coordinates::Affine(x, y),
            };
            ensure_err!(
                point.mul_uint(self.scalar_field().modulus()) == self.infinity(),
                Error::parse("point not in subgroup")
            );
        }
        Ok(())
    }
}

impl<'a, U: UintMont> EllipticCurvePoint<'a, U> {
    pub const fn curve(&self) -> &'a EllipticCurve<U> {
        self.curve
    }

    pub const fn is_infinity(&self) -> bool {
        matches!(self.coordinates, Coordinates::Infinity)
    }

    pub const fn x(&self) -> Option<ModRingElementRef<'a, U>> {
        match self.coordinates {
            Coordinates::Infinity => None,
            Coordinates::Affine(x, _) => Some(x),
        }
    }

    pub const fn y(&self) -> Option<ModRingElementRef<'a, U>> {
        match self.coordinates {
            Coordinates::Infinity => None,
            Coordinates::Affine(_, y) => Some(y),
        }
    }

    fn mul_uint<W: UintExp>(mut self, scalar: W) -> Self {
        let mut result = self.curve.infinity();
        for i in 0..scalar.bit_len() {
            result.conditional_assign(&(result + self), scalar.bit_ct(i));
            self += self;
        }
        result
    }

    fn double(self) -> Self {
        let Coordinates::Affine(x, y) = self.coordinates else {
            return self;
        };
        let field = &self.curve.base_field;
        // Vertical tangent.
        let Some(lambda) = (field.from_u64(3) * x.pow(2) + self.curve.a()) / (field.from_u64(2) * y)
        else {
            return self.curve.infinity();
        };
        let x3 = lambda.pow(2) - field.from_u64(2) * x;
        let y3 = lambda * (x - x3) - y;
        Self {
            curve:       self.curve,
            coordinates: Coordinates::Affine(x3, y3),
        }
    }
}

macro_rules! forward_fmt {
    ($($trait:path),+) => {
        $(
            impl<'a, U: UintMont + $trait> $trait for EllipticCurvePoint<'a, U> {
                fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                    match self.coordinates {
                        Coordinates::Infinity => write!(f, "Infinity"),
                        Coordinates::Affine(x, y) => {
                            write!(f, "(")?;
                            <ModRingElementRef<'_, U> as $trait>::fmt(&x, f)?;
                            write!(f, ", ")?;
                            <ModRingElementRef<'_, U> as $trait>::fmt(&y, f)?;
                            write!(f, ")")
                        }
                    }
                }
            }
        )+
    };
}

forward_fmt!(fmt::Debug, fmt::Display, fmt::LowerHex);

impl<U: UintMont> Add for EllipticCurvePoint<'_, U> {
    type Output = Self;

    /// Affine addition, https://hyperelliptic.org/EFD/g1p/auto-shortw.html
    fn add(self, other: Self) -> Self::Output {
        assert_eq!(self.curve, other.curve);
        match (self.coordinates, other.coordinates) {
            (Coordinates::Infinity, _) => other,
            (_, Coordinates::Infinity) => self,
            (Coordinates::Affine(x1, y1), Coordinates::Affine(x2, y2)) => {
                if x1 == x2 {
                    if y1 == y2 {
                        self.double()
                    } else {
                        self.curve.infinity()
                    }
                } else {
                    // x1 != x2, so the difference is invertible in a prime field.
                    let Some(lambda) = (y2 - y1) / (x2 - x1) else {
                        return self.curve.infinity();
                    };
                    let x3 = lambda.pow(2) - x1 - x2;
                    let y3 = lambda * (x1 - x3) - y1;
                    Self {
                        curve:       self.curve,
                        coordinates: Coordinates::Affine(x3, y3),
                    }
                }
            }
        }
    }
}

impl<U: UintMont> AddAssign for EllipticCurvePoint<'_, U> {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl<U: UintMont> Neg for EllipticCurvePoint<'_, U> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self.coordinates {
            Coordinates::Infinity => self,
            Coordinates::Affine(x, y) => EllipticCurvePoint {
                curve:       self.curve,
                coordinates: Coordinates::Affine(x, -y),
            },
        }
    }
}

impl<U: UintMont> Sub for EllipticCurvePoint<'_, U> {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn sub(self, other: Self) -> Self::Output {
        self + other.neg()
    }
}

impl<U: UintMont> SubAssign for EllipticCurvePoint<'_, U> {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl<'a, U: UintMont> Mul<ModRingElementRef<'a, U>> for EllipticCurvePoint<'a, U> {
    type Output = Self;

    fn mul(self, scalar: ModRingElementRef<'a, U>) -> Self::Output {
        assert_eq!(scalar.ring(), self.curve.scalar_field());
        self.mul_uint(scalar.to_uint())
    }
}

impl<'a, U: UintMont> MulAssign<ModRingElementRef<'a, U>> for EllipticCurvePoint<'a, U> {
    fn mul_assign(&mut self, scalar: ModRingElementRef<'a, U>) {
        *self = *self * scalar;
    }
}

impl<'a, U: UintMont> Div<ModRingElementRef<'a, U>> for EllipticCurvePoint<'a, U> {
    type Output = Option<Self>;

    fn div(self, scalar: ModRingElementRef<'a, U>) -> Self::Output {
        scalar.inv().map(|inv| self * inv)
    }
}

impl<'a, U: UintMont> DivAssign<ModRingElementRef<'a, U>> for EllipticCurvePoint<'a, U> {
    /// # Panics
    ///
    /// Panics if the scalar is zero.
    fn div_assign(&mut self, scalar: ModRingElementRef<'a, U>) {
        *self = self.div(scalar).expect("Element is not invertible");
    }
}

/// Conditionally select an Elliptic Curve Point
///
/// Note: Points must have identical representation (Infinity / Affine) for
/// constant-time.
///
/// # Panics
///
/// Panics if the points are not on the same curve
impl<'a, U: UintMont> ConditionallySelectable for EllipticCurvePoint<'a, U> {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        assert_eq!(a.curve, b.curve);
        use Coordinates::*;
        let coordinates = match (&a.coordinates, &b.coordinates) {
            (Infinity, Infinity) => Infinity,
            (Affine(ax, ay), Affine(bx, by)) => Affine(
                ModRingElementRef::<'a, U>::conditional_select(ax, bx, choice),
                ModRingElementRef::<'a, U>::conditional_select(ay, by, choice),
            ),
            (a, b) => {
                if bool::from(choice) {
                    *b
                } else {
                    *a
                }
            }
        };
        Self {
            curve: a.curve,
            coordinates,
        }
    }
}

/// Constant time coordinate equality check.
///
/// Warning: Only constant time in coordinates, not in Infinity / Affine cases
/// distinction.
///
/// # Panics
///
/// Panics if the points are not on the same curve
impl<U: UintMont> ConstantTimeEq for EllipticCurvePoint<'_, U> {
    fn ct_eq(&self, other: &Self) -> Choice {
        use Coordinates::*;
        assert_eq!(self.curve, other.curve);
        match (&self.coordinates, &other.coordinates) {
            (Infinity, Infinity) => Choice::from(1),
            (Affine(ax, ay), Affine(bx, by)) => ax.ct_eq(bx) & ay.ct_eq(by),
            _ => Choice::from(0),
        }
    }
}
