//! ECDSA signature verification, SEC 1 4.1.4.

use {
    super::{
        biguint_from_uint,
        groups::{EllipticCurve, EllipticCurvePoint},
        mod_ring::{RingRefExt, UintMont},
        uint_from_biguint,
    },
    crate::{
        asn1::tlv::{self, TlvRef},
        certificate::{CurveParameters, EcPoint},
        ensure_err, Error, Result,
    },
    num_bigint::BigUint,
    num_traits::{Inv, Zero},
    ruint::Uint,
    tracing::debug,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EcdsaSignature {
    pub r: BigUint,
    pub s: BigUint,
}

#[derive(Clone, Copy, Debug)]
pub struct EcdsaPublicKey<'c, U: UintMont> {
    point: EllipticCurvePoint<'c, U>,
}

impl EcdsaSignature {
    /// Decodes an X9.62 `ECDSA-Sig-Value` or a plain `r || s` concatenation
    /// (BSI TR-03111 format).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if let Ok(signature) = Self::from_der(bytes) {
            return Ok(signature);
        }
        ensure_err!(
            !bytes.is_empty() && bytes.len() % 2 == 0,
            Error::parse(format!("ECDSA signature of odd length {}", bytes.len()))
        );
        let (r, s) = bytes.split_at(bytes.len() / 2);
        Ok(Self {
            r: BigUint::from_bytes_be(r),
            s: BigUint::from_bytes_be(s),
        })
    }

    fn from_der(bytes: &[u8]) -> Result<Self> {
        let sequence = TlvRef::parse_exact(bytes)?;
        ensure_err!(
            sequence.tag == tlv::SEQUENCE,
            Error::parse("ECDSA signature is not a SEQUENCE")
        );
        let children = sequence.children()?;
        let [r, s] = children.as_slice() else {
            return Err(Error::parse("ECDSA signature needs exactly two INTEGERs"));
        };
        let integer = |element: &TlvRef<'_>| {
            ensure_err!(
                element.tag == tlv::INTEGER
                    && element.value.first().is_some_and(|&b| b & 0x80 == 0),
                Error::parse("ECDSA signature component is not a positive INTEGER")
            );
            Ok(BigUint::from_bytes_be(element.value))
        };
        Ok(Self {
            r: integer(r)?,
            s: integer(s)?,
        })
    }
}

impl<'c, U: UintMont> EcdsaPublicKey<'c, U> {
    pub const fn new(point: EllipticCurvePoint<'c, U>) -> Self {
        Self { point }
    }

    /// Verifies a signature over a message digest.
    ///
    /// Digests longer than the group order are truncated to its bit length.
    pub fn verify(&self, digest: &[u8], signature: &EcdsaSignature) -> Result<()> {
        let curve = self.point.curve();
        let scalars = curve.scalar_field();
        let order = biguint_from_uint(scalars.modulus());
        let EcdsaSignature { r, s } = signature;
        ensure_err!(
            !r.is_zero() && !s.is_zero() && *r < order && *s < order,
            Error::SignatureInvalid
        );

        let mut e = BigUint::from_bytes_be(digest);
        let digest_bits = 8 * digest.len() as u64;
        if digest_bits > order.bits() {
            e >>= digest_bits - order.bits();
        }
        e %= &order;

        let scalar = |value: &BigUint| uint_from_biguint::<U>(value).map(|uint| scalars.from(uint));
        let r_uint = uint_from_biguint::<U>(r)?;
        let w = scalar(s)?.inv().ok_or(Error::SignatureInvalid)?;
        let u1 = scalar(&e)? * w;
        let u2 = scalars.from(r_uint) * w;

        let point = curve.generator() * u1 + self.point * u2;
        let x = point.x().ok_or(Error::SignatureInvalid)?;
        let v = x.to_uint().reduce_mod(scalars.modulus());
        ensure_err!(bool::from(v.ct_eq(&r_uint)), Error::SignatureInvalid);
        Ok(())
    }
}

/// Verifies `signature` over `digest` with the public key `point`.
///
/// The integer width is picked from the larger of the field and the order.
pub fn verify(
    curve: &CurveParameters,
    point: &EcPoint,
    digest: &[u8],
    signature: &[u8],
) -> Result<()> {
    let signature = EcdsaSignature::from_bytes(signature).map_err(|error| {
        debug!(%error, "malformed ECDSA signature");
        Error::SignatureInvalid
    })?;
    match curve.prime.bits().max(curve.order.bits()) {
        0..=256 => verify_with::<Uint<256, 4>>(curve, point, digest, &signature),
        257..=384 => verify_with::<Uint<384, 6>>(curve, point, digest, &signature),
        385..=576 => verify_with::<Uint<576, 9>>(curve, point, digest, &signature),
        bits => Err(Error::UnsupportedAlgorithm(format!("{bits} bit curve"))),
    }
}

fn verify_with<U: UintMont>(
    curve: &CurveParameters,
    point: &EcPoint,
    digest: &[u8],
    signature: &EcdsaSignature,
) -> Result<()> {
    let group = EllipticCurve::<U>::from_be_bytes(
        &curve.prime.to_bytes_be(),
        &curve.a.to_bytes_be(),
        &curve.b.to_bytes_be(),
        (
            &curve.generator.x.to_bytes_be(),
            &curve.generator.y.to_bytes_be(),
        ),
        &curve.order.to_bytes_be(),
        &curve.cofactor.to_bytes_be(),
    )?;
    let point = group.point_from_be_bytes(&point.x.to_bytes_be(), &point.y.to_bytes_be())?;
    EcdsaPublicKey::new(point).verify(digest, signature)
}
