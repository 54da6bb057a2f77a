//! Pure ASN1 types, no application logic.
//!
//! Two layers live here. The `der` derived types decode what the chip and the
//! certificate authority produced (public key info, curve parameters, PSS
//! parameters, the LDS security object). The [`tlv`] module encodes the
//! structures that have to be reproduced byte for byte, where we need full
//! control over every length prefix.
//!
//! Real world data is not always DER compliant. Where the standard allows two
//! encodings (for example absent or NULL digest parameters) the decoded types
//! keep the detail so that the input can be reconstructed exactly.

pub mod emrtd;
pub mod public_key_info;
mod signature_algorithm_identifier;
pub mod tlv;

pub use self::{
    signature_algorithm_identifier::{RsaSsaPssParameters, SignatureAlgorithmIdentifier},
    tlv::{Tlv, TlvRef},
};
use der::{asn1::ObjectIdentifier as Oid, Any, Sequence, ValueOrd};

/// ICAO 9303-10 4.6.2.2: `id-icao-mrtd-security-ldsSecurityObject`.
pub const ID_LDS_SECURITY_OBJECT: Oid = Oid::new_unwrap("2.23.136.1.1.1");

/// ANSI X9.62 `ecdsa-with-SHA1`.
pub const ID_ECDSA_WITH_SHA1: Oid = Oid::new_unwrap("1.2.840.10045.4.1");

/// ANSI X9.62 `prime-field`.
pub const ID_PRIME_FIELD: Oid = Oid::new_unwrap("1.2.840.10045.1.1");

/// PKCS #1 `md4WithRSAEncryption`.
pub const ID_MD4_WITH_RSA: Oid = Oid::new_unwrap("1.2.840.113549.1.1.3");

#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Sequence, ValueOrd)]
pub struct AnyAlgorithmIdentifier {
    pub algorithm:  Oid,
    pub parameters: Option<Any>,
}

impl AnyAlgorithmIdentifier {
    #[must_use]
    pub const fn new(algorithm: Oid) -> Self {
        Self {
            algorithm,
            parameters: None,
        }
    }
}
