//! Digest and signature algorithm identification.
//!
//! Passport reading stacks report algorithms under many spellings: JMRTD
//! returns `SHA256withRSA`, iOS readers return `rsaEncryption` for what is
//! really `sha256WithRSAEncryption`, certificates carry OIDs. Everything is
//! normalized to [`Algorithm`] here, unknown spellings are kept verbatim in
//! [`AlgorithmName::NotFound`].

use {
    crate::asn1::{ID_ECDSA_WITH_SHA1, ID_MD4_WITH_RSA},
    const_oid::db::rfc5912::{
        ECDSA_WITH_SHA_224, ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, ECDSA_WITH_SHA_512,
        ID_RSASSA_PSS, ID_SHA_1, ID_SHA_224, ID_SHA_256, ID_SHA_384, ID_SHA_512,
        MD_2_WITH_RSA_ENCRYPTION, MD_5_WITH_RSA_ENCRYPTION, RSA_ENCRYPTION,
        SHA_1_WITH_RSA_ENCRYPTION, SHA_224_WITH_RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION,
        SHA_384_WITH_RSA_ENCRYPTION, SHA_512_WITH_RSA_ENCRYPTION,
    },
    der::asn1::ObjectIdentifier as Oid,
    serde::{Serialize, Serializer},
    sha1::Sha1,
    sha2::{Digest, Sha224, Sha256, Sha384, Sha512},
    std::fmt::{self, Display, Formatter},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// How the digest is bound to the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureScheme {
    /// RSASSA-PKCS1-v1_5, RFC 8017 8.2.
    Pkcs1v15,

    /// RSASSA-PSS with MGF1 over the message digest, RFC 8017 8.1.
    ///
    /// A `salt_length` of `None` accepts any salt length.
    Pss { salt_length: Option<usize> },

    Ecdsa,
}

/// Canonical names of the supported digest and signature algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    RsaEncryption,
    Md2WithRsa,
    Md4WithRsa,
    Md5WithRsa,
    Sha1WithRsa,
    Sha224WithRsa,
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
    RsassaPss,
    EcdsaWithSha1,
    EcdsaWithSha224,
    EcdsaWithSha256,
    EcdsaWithSha384,
    EcdsaWithSha512,
}

/// Result of name normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlgorithmName {
    Known(Algorithm),
    NotFound(String),
}

/// Vendor spellings. Looked up before the canonical names, so `rsaEncryption`
/// as reported by iOS readers resolves to `sha256WithRSAEncryption`.
static ALIASES: &[(&str, Algorithm)] = &[
    ("SHA-1", Algorithm::Sha1),
    ("SHA1", Algorithm::Sha1),
    ("SHA-224", Algorithm::Sha224),
    ("SHA224", Algorithm::Sha224),
    ("SHA-256", Algorithm::Sha256),
    ("SHA256", Algorithm::Sha256),
    ("SHA-384", Algorithm::Sha384),
    ("SHA384", Algorithm::Sha384),
    ("SHA-512", Algorithm::Sha512),
    ("SHA512", Algorithm::Sha512),
    ("SHA1withECDSA", Algorithm::EcdsaWithSha1),
    ("SHA224withECDSA", Algorithm::EcdsaWithSha224),
    ("SHA256withECDSA", Algorithm::EcdsaWithSha256),
    ("SHA384withECDSA", Algorithm::EcdsaWithSha384),
    ("SHA512withECDSA", Algorithm::EcdsaWithSha512),
    ("RSA", Algorithm::RsaEncryption),
    ("MD2withRSA", Algorithm::Md2WithRsa),
    ("MD4withRSA", Algorithm::Md4WithRsa),
    ("MD5withRSA", Algorithm::Md5WithRsa),
    ("SHA1withRSA", Algorithm::Sha1WithRsa),
    ("SHA224withRSA", Algorithm::Sha224WithRsa),
    ("SHA256withRSA", Algorithm::Sha256WithRsa),
    ("SHA384withRSA", Algorithm::Sha384WithRsa),
    ("SHA512withRSA", Algorithm::Sha512WithRsa),
    ("SAwithRSA/PSS", Algorithm::RsassaPss),
    ("SSAwithRSA/PSS", Algorithm::RsassaPss),
    ("RSASSA-PSS", Algorithm::RsassaPss),
    ("rsassa-pss", Algorithm::RsassaPss),
    ("SHA256withRSAandMGF1", Algorithm::RsassaPss),
    ("id-mgf1", Algorithm::RsassaPss),
    ("rsaEncryption", Algorithm::Sha256WithRsa),
    ("SHA256WITHRSA", Algorithm::Sha256WithRsa),
    ("sha256withRSA", Algorithm::Sha256WithRsa),
    ("sha256withrsa", Algorithm::Sha256WithRsa),
    ("SHA256WITHRSAENCRYPTION", Algorithm::Sha256WithRsa),
];

/// Normalizes an algorithm name as reported by a passport reader.
#[must_use]
pub fn to_standard_name(name: &str) -> AlgorithmName {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|&(_, algorithm)| algorithm)
        .or_else(|| Algorithm::ALL.into_iter().find(|a| a.name() == name))
        .map_or_else(|| AlgorithmName::NotFound(name.to_owned()), AlgorithmName::Known)
}

impl HashAlgorithm {
    pub const ALL: [Self; 5] = [
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
    ];

    #[must_use]
    pub fn hash_bytes(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha224 => Sha224::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Digest size in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    #[must_use]
    pub const fn oid(self) -> Oid {
        match self {
            Self::Sha1 => ID_SHA_1,
            Self::Sha224 => ID_SHA_224,
            Self::Sha256 => ID_SHA_256,
            Self::Sha384 => ID_SHA_384,
            Self::Sha512 => ID_SHA_512,
        }
    }

    #[must_use]
    pub fn from_oid(oid: &Oid) -> Option<Self> {
        Self::ALL.into_iter().find(|hash| hash.oid() == *oid)
    }

    /// Parses any known spelling of a digest algorithm.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match to_standard_name(name) {
            AlgorithmName::Known(algorithm) => algorithm.as_hash(),
            AlgorithmName::NotFound(_) => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.algorithm().name()
    }

    #[must_use]
    pub const fn algorithm(self) -> Algorithm {
        match self {
            Self::Sha1 => Algorithm::Sha1,
            Self::Sha224 => Algorithm::Sha224,
            Self::Sha256 => Algorithm::Sha256,
            Self::Sha384 => Algorithm::Sha384,
            Self::Sha512 => Algorithm::Sha512,
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for HashAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl Algorithm {
    pub const ALL: [Self; 20] = [
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::RsaEncryption,
        Self::Md2WithRsa,
        Self::Md4WithRsa,
        Self::Md5WithRsa,
        Self::Sha1WithRsa,
        Self::Sha224WithRsa,
        Self::Sha256WithRsa,
        Self::Sha384WithRsa,
        Self::Sha512WithRsa,
        Self::RsassaPss,
        Self::EcdsaWithSha1,
        Self::EcdsaWithSha224,
        Self::EcdsaWithSha256,
        Self::EcdsaWithSha384,
        Self::EcdsaWithSha512,
    ];

    /// Name as registered in the OID repository.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::RsaEncryption => "rsaEncryption",
            Self::Md2WithRsa => "md2WithRSAEncryption",
            Self::Md4WithRsa => "md4WithRSAEncryption",
            Self::Md5WithRsa => "md5WithRSAEncryption",
            Self::Sha1WithRsa => "sha1WithRSAEncryption",
            Self::Sha224WithRsa => "sha224WithRSAEncryption",
            Self::Sha256WithRsa => "sha256WithRSAEncryption",
            Self::Sha384WithRsa => "sha384WithRSAEncryption",
            Self::Sha512WithRsa => "sha512WithRSAEncryption",
            Self::RsassaPss => "rsassaPss",
            Self::EcdsaWithSha1 => "ecdsa-with-SHA1",
            Self::EcdsaWithSha224 => "ecdsa-with-SHA224",
            Self::EcdsaWithSha256 => "ecdsa-with-SHA256",
            Self::EcdsaWithSha384 => "ecdsa-with-SHA384",
            Self::EcdsaWithSha512 => "ecdsa-with-SHA512",
        }
    }

    #[must_use]
    pub const fn oid(self) -> Oid {
        match self {
            Self::Sha1 => ID_SHA_1,
            Self::Sha224 => ID_SHA_224,
            Self::Sha256 => ID_SHA_256,
            Self::Sha384 => ID_SHA_384,
            Self::Sha512 => ID_SHA_512,
            Self::RsaEncryption => RSA_ENCRYPTION,
            Self::Md2WithRsa => MD_2_WITH_RSA_ENCRYPTION,
            Self::Md4WithRsa => ID_MD4_WITH_RSA,
            Self::Md5WithRsa => MD_5_WITH_RSA_ENCRYPTION,
            Self::Sha1WithRsa => SHA_1_WITH_RSA_ENCRYPTION,
            Self::Sha224WithRsa => SHA_224_WITH_RSA_ENCRYPTION,
            Self::Sha256WithRsa => SHA_256_WITH_RSA_ENCRYPTION,
            Self::Sha384WithRsa => SHA_384_WITH_RSA_ENCRYPTION,
            Self::Sha512WithRsa => SHA_512_WITH_RSA_ENCRYPTION,
            Self::RsassaPss => ID_RSASSA_PSS,
            Self::EcdsaWithSha1 => ID_ECDSA_WITH_SHA1,
            Self::EcdsaWithSha224 => ECDSA_WITH_SHA_224,
            Self::EcdsaWithSha256 => ECDSA_WITH_SHA_256,
            Self::EcdsaWithSha384 => ECDSA_WITH_SHA_384,
            Self::EcdsaWithSha512 => ECDSA_WITH_SHA_512,
        }
    }

    #[must_use]
    pub fn from_oid(oid: &Oid) -> Option<Self> {
        Self::ALL.into_iter().find(|algorithm| algorithm.oid() == *oid)
    }

    /// The algorithm as a plain digest, `None` for signature algorithms.
    #[must_use]
    pub const fn as_hash(self) -> Option<HashAlgorithm> {
        match self {
            Self::Sha1 => Some(HashAlgorithm::Sha1),
            Self::Sha224 => Some(HashAlgorithm::Sha224),
            Self::Sha256 => Some(HashAlgorithm::Sha256),
            Self::Sha384 => Some(HashAlgorithm::Sha384),
            Self::Sha512 => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    /// Digest bound into a signature algorithm.
    ///
    /// `None` when the name does not fix it (`rsaEncryption`, `rsassaPss`)
    /// or when the digest is not supported (MD2, MD4, MD5).
    #[must_use]
    pub const fn signature_hash(self) -> Option<HashAlgorithm> {
        match self {
            Self::Sha1WithRsa | Self::EcdsaWithSha1 => Some(HashAlgorithm::Sha1),
            Self::Sha224WithRsa | Self::EcdsaWithSha224 => Some(HashAlgorithm::Sha224),
            Self::Sha256WithRsa | Self::EcdsaWithSha256 => Some(HashAlgorithm::Sha256),
            Self::Sha384WithRsa | Self::EcdsaWithSha384 => Some(HashAlgorithm::Sha384),
            Self::Sha512WithRsa | Self::EcdsaWithSha512 => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    /// Signature scheme, `None` for digests.
    #[must_use]
    pub const fn scheme(self) -> Option<SignatureScheme> {
        match self {
            Self::RsaEncryption
            | Self::Md2WithRsa
            | Self::Md4WithRsa
            | Self::Md5WithRsa
            | Self::Sha1WithRsa
            | Self::Sha224WithRsa
            | Self::Sha256WithRsa
            | Self::Sha384WithRsa
            | Self::Sha512WithRsa => Some(SignatureScheme::Pkcs1v15),
            Self::RsassaPss => Some(SignatureScheme::Pss { salt_length: None }),
            Self::EcdsaWithSha1
            | Self::EcdsaWithSha224
            | Self::EcdsaWithSha256
            | Self::EcdsaWithSha384
            | Self::EcdsaWithSha512 => Some(SignatureScheme::Ecdsa),
            Self::Sha1 | Self::Sha224 | Self::Sha256 | Self::Sha384 | Self::Sha512 => None,
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Display for AlgorithmName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(algorithm) => algorithm.fmt(f),
            Self::NotFound(name) => f.write_str(name),
        }
    }
}

impl Display for SignatureScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pkcs1v15 => f.write_str("PKCS#1 v1.5"),
            Self::Pss {
                salt_length: Some(salt),
            } => write!(f, "PSS (salt {salt})"),
            Self::Pss { salt_length: None } => f.write_str("PSS"),
            Self::Ecdsa => f.write_str("ECDSA"),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, hex_literal::hex};

    #[test]
    fn test_vendor_names() {
        for (name, expected) in [
            ("SHA-256", "sha256"),
            ("SHA1", "sha1"),
            ("SHA256withRSA", "sha256WithRSAEncryption"),
            ("SHA256WITHRSAENCRYPTION", "sha256WithRSAEncryption"),
            ("rsaEncryption", "sha256WithRSAEncryption"),
            ("RSA", "rsaEncryption"),
            ("RSASSA-PSS", "rsassaPss"),
            ("SHA256withRSAandMGF1", "rsassaPss"),
            ("SHA1withECDSA", "ecdsa-with-SHA1"),
            ("MD4withRSA", "md4WithRSAEncryption"),
            ("ecdsa-with-SHA384", "ecdsa-with-SHA384"),
            ("sha512WithRSAEncryption", "sha512WithRSAEncryption"),
        ] {
            assert_eq!(to_standard_name(name).to_string(), expected, "{name}");
        }
    }

    #[test]
    fn test_not_found() {
        assert_eq!(
            to_standard_name("GOST3411withGOST3410"),
            AlgorithmName::NotFound("GOST3411withGOST3410".to_owned())
        );
        assert_eq!(to_standard_name("GOST3411withGOST3410").to_string(), "GOST3411withGOST3410");
        // Case matters outside the listed spellings.
        assert!(matches!(to_standard_name("sha-256"), AlgorithmName::NotFound(_)));
    }

    #[test]
    fn test_oid_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(Algorithm::from_oid(&algorithm.oid()), Some(algorithm));
        }
        assert_eq!(
            Algorithm::from_oid(&Oid::new_unwrap("1.2.840.113549.1.1.11")),
            Some(Algorithm::Sha256WithRsa)
        );
        assert_eq!(
            HashAlgorithm::from_oid(&Oid::new_unwrap("2.16.840.1.101.3.4.2.2")),
            Some(HashAlgorithm::Sha384)
        );
    }

    #[test]
    fn test_hash_bytes() {
        let data = [1, 2, 3, 4, 5];
        assert_eq!(
            HashAlgorithm::Sha1.hash_bytes(&data),
            hex!("11966ab9c099f8fabefac54c08d5be2bd8c903af")
        );
        assert_eq!(
            HashAlgorithm::Sha256.hash_bytes(&data),
            hex!("74f81fe167d99b4cb41d6d0ccda82278caee9f3e2f25d5e5a3936ff3dcec60d0")
        );
        for hash in HashAlgorithm::ALL {
            assert_eq!(hash.hash_bytes(&[]).len(), hash.output_len());
        }
    }

    #[test]
    fn test_signature_hash() {
        assert_eq!(
            Algorithm::EcdsaWithSha384.signature_hash(),
            Some(HashAlgorithm::Sha384)
        );
        assert_eq!(Algorithm::RsassaPss.signature_hash(), None);
        assert_eq!(Algorithm::Md5WithRsa.signature_hash(), None);
        assert_eq!(Algorithm::Sha256.scheme(), None);
        assert_eq!(HashAlgorithm::from_name("SHA-512"), Some(HashAlgorithm::Sha512));
        assert_eq!(HashAlgorithm::from_name("SHA256withRSA"), None);
    }
}
