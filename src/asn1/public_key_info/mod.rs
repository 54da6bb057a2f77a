//! RFC 5280 `SubjectPublicKeyInfo` with the key types used by document
//! signers.

mod field_id;

pub use self::field_id::FieldId;
use {
    super::{AnyAlgorithmIdentifier, RsaSsaPssParameters},
    cms::cert::x509::spki::SubjectPublicKeyInfoOwned,
    const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, ID_RSASSA_PSS, RSA_ENCRYPTION},
    der::{
        asn1::{BitString, Int, Null, ObjectIdentifier as Oid, OctetString},
        Choice, Decode, Encode, Error, ErrorKind, Result, Sequence, Tag, ValueOrd,
    },
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubjectPublicKeyInfo {
    Rsa(RsaPublicKeyInfo),

    /// RFC 4055 `id-RSASSA-PSS` key, optionally restricted to parameters.
    RsaPss {
        key:        RsaPublicKeyInfo,
        parameters: Option<RsaSsaPssParameters>,
    },

    Ec {
        parameters: ECAlgoParameters,
        point:      ECPoint,
    },

    Unknown(AnySubjectPublicKeyInfo),
}

#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Sequence, ValueOrd)]
pub struct AnySubjectPublicKeyInfo {
    pub algorithm:          AnyAlgorithmIdentifier,
    pub subject_public_key: BitString,
}

/// PKCS #1 `RSAPublicKey`.
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Sequence, ValueOrd)]
pub struct RsaPublicKeyInfo {
    pub modulus:         Int,
    pub public_exponent: Int,
}

/// Elliptic Curve Algorithm Parameters.
///
/// **Note**: This deviates from RFC 5480 by allowing for explicit
/// parameters using `EcParameters` in addition to named curves. This
/// is used by many document signers, for example German and Dutch ones.
///
/// [TR-03111] `Parameters`
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Choice, ValueOrd)]
pub enum ECAlgoParameters {
    EcParameters(EcParameters),
    NamedCurve(Oid),
    ImplicitlyCA(Null),
}

#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Sequence, ValueOrd)]
pub struct EcParameters {
    pub version:  u64,
    pub field_id: FieldId,
    pub curve:    Curve,
    pub base:     ECPoint,
    pub order:    Int,
    pub cofactor: Option<Int>,
}

#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Sequence, ValueOrd)]
pub struct Curve {
    pub a:    FieldElement,
    pub b:    FieldElement,
    pub seed: Option<BitString>,
}

pub type FieldElement = OctetString;

pub type ECPoint = OctetString;

impl SubjectPublicKeyInfo {
    #[must_use]
    pub fn algorithm(&self) -> Oid {
        match self {
            Self::Rsa(_) => RSA_ENCRYPTION,
            Self::RsaPss { .. } => ID_RSASSA_PSS,
            Self::Ec { .. } => ID_EC_PUBLIC_KEY,
            Self::Unknown(any) => any.algorithm.algorithm,
        }
    }
}

impl TryFrom<&SubjectPublicKeyInfoOwned> for SubjectPublicKeyInfo {
    type Error = Error;

    fn try_from(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let key_bytes = || {
            spki.subject_public_key
                .as_bytes()
                .ok_or_else(|| Error::from(ErrorKind::Value { tag: Tag::BitString }))
        };
        Ok(match spki.algorithm.oid {
            RSA_ENCRYPTION => Self::Rsa(RsaPublicKeyInfo::from_der(key_bytes()?)?),
            ID_RSASSA_PSS => Self::RsaPss {
                key:        RsaPublicKeyInfo::from_der(key_bytes()?)?,
                parameters: spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .map(|any| RsaSsaPssParameters::from_der(&any.to_der()?))
                    .transpose()?,
            },
            ID_EC_PUBLIC_KEY => {
                let parameters = spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .ok_or_else(|| Error::from(ErrorKind::Failed))?;
                Self::Ec {
                    parameters: ECAlgoParameters::from_der(&parameters.to_der()?)?,
                    point:      OctetString::new(key_bytes()?)?,
                }
            }
            oid => Self::Unknown(AnySubjectPublicKeyInfo {
                algorithm:          AnyAlgorithmIdentifier {
                    algorithm:  oid,
                    parameters: spki.algorithm.parameters.clone(),
                },
                subject_public_key: spki.subject_public_key.clone(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, anyhow::Result, hex_literal::hex, num_bigint::BigUint};

    #[test]
    fn test_explicit_prime_curve() -> Result<()> {
        // brainpoolP160r1 with explicit parameters.
        let der = hex!(
            "3081 9802 0101 3020 0607 2a8648ce3d0101 0215 00e95e4a5f737059dc60dfc7ad95b3d8139515620f"
            "302c 0414 340e7be2a280eb74e2be61bada745d97e8f7c300"
            "     0414 1e589a8595423412134faa2dbdec95c8d8675e58"
            "0429 04 bed5af16ea3f6a4f62938c4631eb5af7bdbcdbc3"
            "        1667cb477a1a8ec338f94741669c976316da6321"
            "0215 00e95e4a5f737059dc60df5991d45029409e60fc09"
            "0201 01"
        );
        let ECAlgoParameters::EcParameters(params) = ECAlgoParameters::from_der(&der)? else {
            panic!("expected explicit parameters");
        };
        assert_eq!(params.version, 1);
        let prime = params.field_id.prime()?.expect("prime field");
        assert_eq!(
            BigUint::from_bytes_be(prime.as_bytes()),
            BigUint::from_bytes_be(&hex!("e95e4a5f737059dc60dfc7ad95b3d8139515620f"))
        );
        assert_eq!(params.base.as_bytes().len(), 41);
        let cofactor = params.cofactor.expect("cofactor");
        assert_eq!(BigUint::from_bytes_be(cofactor.as_bytes()), BigUint::from(1_u8));
        Ok(())
    }

    #[test]
    fn test_named_curve() -> Result<()> {
        let der = hex!("06082a8648ce3d030107");
        assert_eq!(
            ECAlgoParameters::from_der(&der)?,
            ECAlgoParameters::NamedCurve(Oid::new_unwrap("1.2.840.10045.3.1.7"))
        );
        let implicit = hex!("0500");
        assert!(matches!(
            ECAlgoParameters::from_der(&implicit)?,
            ECAlgoParameters::ImplicitlyCA(_)
        ));
        Ok(())
    }
}
