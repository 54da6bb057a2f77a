use {
    super::AnyAlgorithmIdentifier,
    cms::cert::x509::spki::AlgorithmIdentifierOwned,
    const_oid::db::rfc5912::{ID_MGF_1, ID_RSASSA_PSS, ID_SHA_1},
    der::{
        asn1::ObjectIdentifier as Oid, Any, Decode, DecodeValue, Encode, EncodeValue, Length,
        Reader, Result, Sequence, Writer,
    },
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SignatureAlgorithmIdentifier {
    RsaPss(RsaSsaPssParameters),
    Unknown(AnyAlgorithmIdentifier),
}

/// RFC 4055 3.1:
///
/// ```asn1
/// RSASSA-PSS-params  ::=  SEQUENCE  {
///     hashAlgorithm      [0] HashAlgorithm DEFAULT sha1Identifier,
///     maskGenAlgorithm   [1] MaskGenAlgorithm DEFAULT mgf1SHA1Identifier,
///     saltLength         [2] INTEGER DEFAULT 20,
///     trailerField       [3] INTEGER DEFAULT 1
/// }
/// ```
///
/// Absent fields are kept as `None` so the encoding round-trips, use the
/// accessors to get the effective values.
#[derive(Clone, Debug, Default, Eq, PartialEq, Sequence)]
pub struct RsaSsaPssParameters {
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT", optional = "true")]
    pub hash_algorithm:     Option<AnyAlgorithmIdentifier>,
    #[asn1(context_specific = "1", tag_mode = "EXPLICIT", optional = "true")]
    pub mask_gen_algorithm: Option<AnyAlgorithmIdentifier>,
    #[asn1(context_specific = "2", tag_mode = "EXPLICIT", optional = "true")]
    pub salt_length:        Option<u64>,
    #[asn1(context_specific = "3", tag_mode = "EXPLICIT", optional = "true")]
    pub trailer_field:      Option<u64>,
}

impl RsaSsaPssParameters {
    /// Message digest, `sha1` when absent.
    #[must_use]
    pub fn hash_oid(&self) -> Oid {
        self.hash_algorithm
            .as_ref()
            .map_or(ID_SHA_1, |alg| alg.algorithm)
    }

    /// Digest used by MGF1, `sha1` when absent.
    ///
    /// Returns `None` for mask generation functions other than MGF1.
    pub fn mgf1_hash_oid(&self) -> Result<Option<Oid>> {
        let Some(mgf) = &self.mask_gen_algorithm else {
            return Ok(Some(ID_SHA_1));
        };
        if mgf.algorithm != ID_MGF_1 {
            return Ok(None);
        }
        match &mgf.parameters {
            Some(params) => {
                let hash = AnyAlgorithmIdentifier::from_der(&params.to_der()?)?;
                Ok(Some(hash.algorithm))
            }
            None => Ok(Some(ID_SHA_1)),
        }
    }

    #[must_use]
    pub fn salt_length(&self) -> u64 {
        self.salt_length.unwrap_or(20)
    }

    #[must_use]
    pub fn trailer_field(&self) -> u64 {
        self.trailer_field.unwrap_or(1)
    }
}

impl SignatureAlgorithmIdentifier {
    #[must_use]
    pub const fn oid(&self) -> Oid {
        match self {
            Self::RsaPss(_) => ID_RSASSA_PSS,
            Self::Unknown(any) => any.algorithm,
        }
    }
}

impl TryFrom<&AlgorithmIdentifierOwned> for SignatureAlgorithmIdentifier {
    type Error = der::Error;

    fn try_from(value: &AlgorithmIdentifierOwned) -> Result<Self> {
        if value.oid == ID_RSASSA_PSS {
            let params = match &value.parameters {
                Some(any) => RsaSsaPssParameters::from_der(&any.to_der()?)?,
                None => RsaSsaPssParameters::default(),
            };
            Ok(Self::RsaPss(params))
        } else {
            Ok(Self::Unknown(AnyAlgorithmIdentifier {
                algorithm:  value.oid,
                parameters: value.parameters.clone(),
            }))
        }
    }
}

impl Sequence<'_> for SignatureAlgorithmIdentifier {}

impl EncodeValue for SignatureAlgorithmIdentifier {
    fn value_len(&self) -> Result<Length> {
        match self {
            Self::RsaPss(params) => ID_RSASSA_PSS.encoded_len()? + params.encoded_len()?,
            Self::Unknown(any) => any.value_len(),
        }
    }

    fn encode_value(&self, writer: &mut impl Writer) -> Result<()> {
        match self {
            Self::RsaPss(params) => {
                ID_RSASSA_PSS.encode(writer)?;
                params.encode(writer)
            }
            Self::Unknown(any) => any.encode_value(writer),
        }
    }
}

impl<'a> DecodeValue<'a> for SignatureAlgorithmIdentifier {
    fn decode_value<R: Reader<'a>>(reader: &mut R, _header: der::Header) -> Result<Self> {
        let oid = Oid::decode(reader)?;
        Ok(match oid {
            ID_RSASSA_PSS => Self::RsaPss(
                Option::<RsaSsaPssParameters>::decode(reader)?.unwrap_or_default(),
            ),
            _ => Self::Unknown(AnyAlgorithmIdentifier {
                algorithm:  oid,
                parameters: Option::<Any>::decode(reader)?,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        anyhow::Result,
        const_oid::db::rfc5912::{ID_SHA_256, SHA_256_WITH_RSA_ENCRYPTION},
        hex_literal::hex,
    };

    #[test]
    fn test_pss_sha256_salt_32() -> Result<()> {
        // AlgorithmIdentifier as written by OpenSSL for `-sigopt rsa_padding_mode:pss`.
        let der = hex!(
            "3041 06092a864886f70d01010a 3034"
            "a00f 300d 0609608648016503040201 0500"
            "a11c 301a 06092a864886f70d010108 300d 0609608648016503040201 0500"
            "a203 020120"
        );
        let alg = SignatureAlgorithmIdentifier::from_der(&der)?;
        let SignatureAlgorithmIdentifier::RsaPss(params) = &alg else {
            panic!("expected PSS parameters, got {alg:?}");
        };
        assert_eq!(params.hash_oid(), ID_SHA_256);
        assert_eq!(params.mgf1_hash_oid()?, Some(ID_SHA_256));
        assert_eq!(params.salt_length(), 32);
        assert_eq!(params.trailer_field(), 1);
        assert_eq!(alg.to_der()?, der);
        Ok(())
    }

    #[test]
    fn test_pss_defaults() -> Result<()> {
        let der = hex!("300d 06092a864886f70d01010a 3000");
        let SignatureAlgorithmIdentifier::RsaPss(params) =
            SignatureAlgorithmIdentifier::from_der(&der)?
        else {
            panic!("expected PSS parameters");
        };
        assert_eq!(params.hash_oid(), ID_SHA_1);
        assert_eq!(params.mgf1_hash_oid()?, Some(ID_SHA_1));
        assert_eq!(params.salt_length(), 20);
        Ok(())
    }

    #[test]
    fn test_unknown() -> Result<()> {
        let der = hex!("300d 06092a864886f70d01010b 0500");
        let alg = SignatureAlgorithmIdentifier::from_der(&der)?;
        assert_eq!(alg.oid(), SHA_256_WITH_RSA_ENCRYPTION);
        assert_eq!(alg.to_der()?, der);
        Ok(())
    }
}
