//! Document Signer certificate decoding.
//!
//! The structured path decodes the X.509 certificate and its
//! `SubjectPublicKeyInfo`. Certificates found in the wild do not always
//! decode, so when it fails and the configuration allows it, the DER is
//! scanned for an RSA key instead (see [`fallback`]).

mod fallback;

use {
    crate::{
        algorithms::{Algorithm, AlgorithmName, HashAlgorithm},
        asn1::{
            public_key_info::{
                ECAlgoParameters, EcParameters, RsaPublicKeyInfo, SubjectPublicKeyInfo,
            },
            RsaSsaPssParameters, SignatureAlgorithmIdentifier,
        },
        crypto::groups::named::{self, CurveDomain},
        ensure_err, Error, Result, VerifierConfig,
    },
    base64::{engine::general_purpose::STANDARD, Engine},
    cms::cert::x509::Certificate,
    der::{
        asn1::{Int, ObjectIdentifier as Oid},
        Decode,
    },
    num_bigint::BigUint,
    num_traits::{One, Zero},
    tracing::{debug, warn},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKeyInfo {
    Rsa {
        modulus:  BigUint,
        exponent: BigUint,
    },
    Ec {
        curve: CurveParameters,
        point: EcPoint,
    },
}

/// Prime field curve domain parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurveParameters {
    /// Name of the matching named curve, if any.
    pub name:      Option<&'static str>,
    pub prime:     BigUint,
    pub a:         BigUint,
    pub b:         BigUint,
    pub generator: EcPoint,
    pub order:     BigUint,
    pub cofactor:  BigUint,
}

/// Affine point, never the point at infinity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EcPoint {
    pub x: BigUint,
    pub y: BigUint,
}

/// RFC 4055 RSASSA-PSS parameters with defaults applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PssParameters {
    pub hash:        HashAlgorithm,
    pub mgf_hash:    HashAlgorithm,
    pub salt_length: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extraction {
    Structured,
    Fallback,
}

/// What a certificate tells about its key and its own signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateInfo {
    pub public_key:          PublicKeyInfo,
    /// The issuer's signature algorithm. Unknown after fallback extraction.
    pub signature_algorithm: Option<AlgorithmName>,
    pub signature_hash:      Option<HashAlgorithm>,
    /// Parameters of an RSASSA-PSS issuer signature.
    pub signature_pss:       Option<PssParameters>,
    /// Restrictions of an `id-RSASSA-PSS` subject key.
    pub key_pss:             Option<PssParameters>,
    pub extraction:          Extraction,
}

impl PublicKeyInfo {
    /// Key size in bits: the modulus for RSA, the prime for EC.
    #[must_use]
    pub fn bits(&self) -> u64 {
        match self {
            Self::Rsa { modulus, .. } => modulus.bits(),
            Self::Ec { curve, .. } => curve.prime.bits(),
        }
    }
}

impl CurveParameters {
    /// Is `point` a solution of `y^2 = x^3 + a x + b`?
    #[must_use]
    pub fn contains(&self, point: &EcPoint) -> bool {
        let p = &self.prime;
        point.x < *p
            && point.y < *p
            && (&point.y * &point.y) % p
                == (&point.x * &point.x * &point.x + &self.a * &point.x + &self.b) % p
    }

    /// SEC 1 2.3.4 octet string to point conversion, compressed or not.
    pub fn decode_point(&self, bytes: &[u8]) -> Result<EcPoint> {
        let p = &self.prime;
        let field_len = usize::try_from(p.bits().div_ceil(8))
            .map_err(|_| Error::parse("field too large"))?;
        let (&prefix, rest) = bytes
            .split_first()
            .ok_or_else(|| Error::parse("empty EC point"))?;
        let point = match prefix {
            0x04 => {
                ensure_err!(
                    rest.len() == 2 * field_len,
                    Error::parse(format!(
                        "uncompressed EC point of {} bytes for a {field_len} byte field",
                        bytes.len()
                    ))
                );
                let (x, y) = rest.split_at(field_len);
                EcPoint {
                    x: BigUint::from_bytes_be(x),
                    y: BigUint::from_bytes_be(y),
                }
            }
            0x02 | 0x03 => {
                ensure_err!(
                    rest.len() == field_len,
                    Error::parse("compressed EC point has the wrong length")
                );
                let x = BigUint::from_bytes_be(rest);
                ensure_err!(x < *p, Error::parse("EC point x not in field"));
                let rhs = (&x * &x * &x + &self.a * &x + &self.b) % p;
                let mut y = sqrt_mod(&rhs, p)
                    .ok_or_else(|| Error::parse("compressed EC point not on curve"))?;
                if y.bit(0) != (prefix == 0x03) && !y.is_zero() {
                    y = p - y;
                }
                EcPoint { x, y }
            }
            0x00 => return Err(Error::parse("EC point at infinity")),
            other => return Err(Error::parse(format!("unknown EC point format {other:#04x}"))),
        };
        ensure_err!(self.contains(&point), Error::parse("EC point not on curve"));
        Ok(point)
    }
}

impl From<&CurveDomain> for CurveParameters {
    fn from(domain: &CurveDomain) -> Self {
        Self {
            name:      Some(domain.name),
            prime:     BigUint::from_bytes_be(domain.modulus),
            a:         BigUint::from_bytes_be(domain.a),
            b:         BigUint::from_bytes_be(domain.b),
            generator: EcPoint {
                x: BigUint::from_bytes_be(domain.gx),
                y: BigUint::from_bytes_be(domain.gy),
            },
            order:     BigUint::from_bytes_be(domain.order),
            cofactor:  BigUint::from(domain.cofactor),
        }
    }
}

impl TryFrom<&EcParameters> for CurveParameters {
    type Error = Error;

    fn try_from(parameters: &EcParameters) -> Result<Self> {
        let prime = parameters
            .field_id
            .prime()?
            .ok_or_else(|| {
                Error::UnsupportedAlgorithm(format!(
                    "curve over field type {}",
                    parameters.field_id.field_type
                ))
            })?;
        let prime = unsigned(&prime, "prime")?;
        ensure_err!(
            prime.bit(0) && prime > BigUint::from(3_u8),
            Error::parse(format!("curve field modulus {prime} is not an odd prime"))
        );
        let a = BigUint::from_bytes_be(parameters.curve.a.as_bytes());
        let b = BigUint::from_bytes_be(parameters.curve.b.as_bytes());
        let name = named::by_parameters(&prime.to_bytes_be(), &a.to_bytes_be(), &b.to_bytes_be())
            .map(|domain| domain.name);
        let mut curve = Self {
            name,
            prime,
            a,
            b,
            generator: EcPoint {
                x: BigUint::zero(),
                y: BigUint::zero(),
            },
            order: unsigned(&parameters.order, "order")?,
            cofactor: parameters
                .cofactor
                .as_ref()
                .map(|cofactor| unsigned(cofactor, "cofactor"))
                .transpose()?
                .unwrap_or_else(BigUint::one),
        };
        curve.generator = curve.decode_point(parameters.base.as_bytes())?;
        Ok(curve)
    }
}

impl TryFrom<&RsaPublicKeyInfo> for PublicKeyInfo {
    type Error = Error;

    fn try_from(key: &RsaPublicKeyInfo) -> Result<Self> {
        let modulus = unsigned(&key.modulus, "modulus")?;
        let exponent = unsigned(&key.public_exponent, "public exponent")?;
        ensure_err!(!modulus.is_zero(), Error::parse("RSA modulus is zero"));
        Ok(Self::Rsa { modulus, exponent })
    }
}

impl TryFrom<&SubjectPublicKeyInfo> for PublicKeyInfo {
    type Error = Error;

    fn try_from(spki: &SubjectPublicKeyInfo) -> Result<Self> {
        match spki {
            SubjectPublicKeyInfo::Rsa(key) | SubjectPublicKeyInfo::RsaPss { key, .. } => {
                Self::try_from(key)
            }
            SubjectPublicKeyInfo::Ec { parameters, point } => {
                let curve = match parameters {
                    ECAlgoParameters::NamedCurve(oid) => named::by_oid(oid)
                        .map(CurveParameters::from)
                        .ok_or_else(|| {
                            Error::UnsupportedAlgorithm(format!("named curve {oid}"))
                        })?,
                    ECAlgoParameters::EcParameters(parameters) => {
                        CurveParameters::try_from(parameters)?
                    }
                    ECAlgoParameters::ImplicitlyCA(_) => {
                        return Err(Error::UnsupportedAlgorithm(
                            "implicitlyCA curve parameters".to_owned(),
                        ))
                    }
                };
                let point = curve.decode_point(point.as_bytes())?;
                Ok(Self::Ec { curve, point })
            }
            SubjectPublicKeyInfo::Unknown(any) => Err(Error::UnsupportedAlgorithm(format!(
                "public key algorithm {}",
                any.algorithm.algorithm
            ))),
        }
    }
}

impl TryFrom<&RsaSsaPssParameters> for PssParameters {
    type Error = Error;

    fn try_from(parameters: &RsaSsaPssParameters) -> Result<Self> {
        let hash = |oid: Oid| {
            HashAlgorithm::from_oid(&oid)
                .ok_or_else(|| Error::UnsupportedAlgorithm(format!("PSS digest {oid}")))
        };
        let mgf_hash = parameters
            .mgf1_hash_oid()?
            .ok_or_else(|| Error::UnsupportedAlgorithm("PSS mask generation".to_owned()))?;
        ensure_err!(
            parameters.trailer_field() == 1,
            Error::UnsupportedAlgorithm(format!(
                "PSS trailer field {}",
                parameters.trailer_field()
            ))
        );
        Ok(Self {
            hash:        hash(parameters.hash_oid())?,
            mgf_hash:    hash(mgf_hash)?,
            salt_length: usize::try_from(parameters.salt_length())
                .map_err(|_| Error::parse("PSS salt length out of range"))?,
        })
    }
}

/// Accepts PEM, bare base64 or DER and returns the DER bytes.
pub fn certificate_der(input: &[u8]) -> Result<Vec<u8>> {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .ok_or_else(|| Error::key_extraction("empty certificate", input))?;
    let trimmed = &input[start..];
    if trimmed.starts_with(b"-----") {
        let (label, der) = der::pem::decode_vec(trimmed)
            .map_err(|e| Error::key_extraction(format!("invalid PEM: {e}"), input))?;
        if label != "CERTIFICATE" {
            warn!(label, "unexpected PEM label");
        }
        return Ok(der);
    }
    if trimmed[0] == 0x30 {
        return Ok(trimmed.to_vec());
    }
    let base64 = trimmed
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect::<Vec<_>>();
    STANDARD
        .decode(base64)
        .map_err(|e| Error::key_extraction(format!("neither DER, PEM nor base64: {e}"), input))
}

/// Extracts the public key and signature details from a certificate.
///
/// Fails with [`Error::KeyExtractionFailed`], carrying the certificate bytes,
/// when no key can be recovered.
pub fn parse(input: &[u8], config: &VerifierConfig) -> Result<CertificateInfo> {
    let der = certificate_der(input)?;
    let error = match structured(&der) {
        Ok(info) => return Ok(info),
        Err(error) => error,
    };
    debug!(%error, "structured certificate decoding failed");
    config.key_fallback.check(
        "certificate did not decode, scanning it for an RSA key",
        || Error::key_extraction(error.to_string(), &der),
    )?;
    let public_key = fallback::scan_rsa_key(&der).map_err(|fallback| {
        Error::key_extraction(format!("{error}; fallback scan: {fallback}"), &der)
    })?;
    Ok(CertificateInfo {
        public_key,
        signature_algorithm: None,
        signature_hash: None,
        signature_pss: None,
        key_pss: None,
        extraction: Extraction::Fallback,
    })
}

/// Shorthand for [`parse`] when only the key matters.
pub fn extract_public_key(input: &[u8], config: &VerifierConfig) -> Result<PublicKeyInfo> {
    parse(input, config).map(|info| info.public_key)
}

fn structured(der: &[u8]) -> Result<CertificateInfo> {
    let certificate = Certificate::from_der(der)?;
    let spki = SubjectPublicKeyInfo::try_from(&certificate.tbs_certificate.subject_public_key_info)?;
    let public_key = PublicKeyInfo::try_from(&spki)?;
    let key_pss = match &spki {
        SubjectPublicKeyInfo::RsaPss {
            parameters: Some(parameters),
            ..
        } => PssParameters::try_from(parameters)
            .map_err(|error| debug!(%error, "ignoring key PSS restrictions"))
            .ok(),
        _ => None,
    };

    // An undecodable issuer algorithm leaves the signature fields empty.
    let (signature_algorithm, signature_hash, signature_pss) =
        match signature_details(&certificate) {
            Ok((algorithm, hash, pss)) => (Some(algorithm), hash, pss),
            Err(error) => {
                debug!(%error, "undecodable certificate signature algorithm");
                (None, None, None)
            }
        };
    debug!(
        key_bits = public_key.bits(),
        signature_algorithm = ?signature_algorithm,
        "decoded certificate"
    );
    Ok(CertificateInfo {
        public_key,
        signature_algorithm,
        signature_hash,
        signature_pss,
        key_pss,
        extraction: Extraction::Structured,
    })
}

fn signature_details(
    certificate: &Certificate,
) -> Result<(AlgorithmName, Option<HashAlgorithm>, Option<PssParameters>)> {
    let signature = SignatureAlgorithmIdentifier::try_from(&certificate.signature_algorithm)?;
    let oid = signature.oid();
    let (hash, pss) = match &signature {
        SignatureAlgorithmIdentifier::RsaPss(parameters) => {
            let pss = PssParameters::try_from(parameters)?;
            (Some(pss.hash), Some(pss))
        }
        SignatureAlgorithmIdentifier::Unknown(_) => {
            (Algorithm::from_oid(&oid).and_then(Algorithm::signature_hash), None)
        }
    };
    let name = Algorithm::from_oid(&oid)
        .map_or_else(|| AlgorithmName::NotFound(oid.to_string()), AlgorithmName::Known);
    Ok((name, hash, pss))
}

/// DER INTEGER as an unsigned value, rejecting negatives.
fn unsigned(int: &Int, what: &str) -> Result<BigUint> {
    let bytes = int.as_bytes();
    ensure_err!(
        bytes.first().map_or(true, |&b| b & 0x80 == 0),
        Error::parse(format!("negative {what}"))
    );
    Ok(BigUint::from_bytes_be(bytes))
}

/// Square root modulo an odd prime, `None` for non-residues.
///
/// Terminates with `None` on other moduli, the result is then meaningless.
fn sqrt_mod(value: &BigUint, p: &BigUint) -> Option<BigUint> {
    let one = BigUint::one();
    if !p.bit(0) || p.bits() < 2 {
        return None;
    }
    let value = value % p;
    if value.is_zero() {
        return Some(BigUint::zero());
    }
    let euler = (p - 1_u8) >> 1;
    if value.modpow(&euler, p) != one {
        return None;
    }
    if p.bit(1) {
        // p = 3 mod 4
        return Some(value.modpow(&((p + 1_u8) >> 2), p));
    }

    // Tonelli-Shanks
    let s = (p - 1_u8).trailing_zeros()?;
    let q = (p - 1_u8) >> s;
    let z = (2_u16..1024)
        .map(BigUint::from)
        .take_while(|z| z < p)
        .find(|z| z.modpow(&euler, p) != one)?;
    let mut m = s;
    let mut c = z.modpow(&q, p);
    let mut t = value.modpow(&q, p);
    let mut r = value.modpow(&((&q + 1_u8) >> 1), p);
    while t != one {
        let mut i = 0;
        let mut t2 = t.clone();
        while t2 != one {
            t2 = &t2 * &t2 % p;
            i += 1;
            if i >= m {
                return None;
            }
        }
        let b = c.modpow(&(BigUint::one() << (m - i - 1)), p);
        m = i;
        c = &b * &b % p;
        t = t * &c % p;
        r = r * &b % p;
    }
    Some(r)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            asn1::{
                public_key_info::{Curve, FieldId},
                ID_PRIME_FIELD,
            },
            crypto::groups::named::{BRAINPOOL_P256R1, SECP224R1, SECP256R1},
        },
        anyhow::Result,
        der::{asn1::OctetString, Any},
        hex_literal::hex,
    };

    #[test]
    fn test_decompress() -> Result<()> {
        for domain in [SECP256R1, SECP224R1, BRAINPOOL_P256R1] {
            let curve = CurveParameters::from(&domain);
            let prefix = if domain.gy[domain.gy.len() - 1] & 1 == 1 {
                0x03
            } else {
                0x02
            };
            let mut compressed = vec![prefix];
            compressed.extend_from_slice(domain.gx);
            assert_eq!(curve.decode_point(&compressed)?, curve.generator, "{}", domain.name);

            // The other root is the negated point.
            compressed[0] ^= 1;
            let negated = curve.decode_point(&compressed)?;
            assert_eq!(negated.y, &curve.prime - &curve.generator.y);
        }
        Ok(())
    }

    #[test]
    fn test_decode_point() -> Result<()> {
        let curve = CurveParameters::from(&SECP256R1);
        let uncompressed = hex!(
            "04"
            "2e2a6ba7b39594378ccad9fb9f00f36f0cce688d91831a604e02e2f3d95fc9f0"
            "77d6576144366be7a4feaf918709034de7dda4400fa4daf20c6afbb662d88d63"
        );
        let point = curve.decode_point(&uncompressed)?;
        assert_eq!(point.x.to_bytes_be(), uncompressed[1..33]);

        let mut off_curve = uncompressed;
        off_curve[64] ^= 1;
        assert!(curve.decode_point(&off_curve).is_err());
        assert!(curve.decode_point(&uncompressed[..64]).is_err());
        assert!(curve.decode_point(&[0x00]).is_err());
        assert!(curve.decode_point(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_sqrt_mod() {
        let sqrt = |value: u32, p: u32| {
            sqrt_mod(&BigUint::from(value), &BigUint::from(p))
                .and_then(|root| u32::try_from(root).ok())
        };
        // 17 = 1 mod 16 goes through Tonelli-Shanks.
        assert!(matches!(sqrt(2, 17), Some(6 | 11)));
        assert_eq!(sqrt(3, 17), None);
        assert!(matches!(sqrt(2, 7), Some(3 | 4)));
        assert_eq!(sqrt(0, 17), Some(0));

        // Not odd primes: no hang, no root.
        for p in [0, 1, 2, 56, 9, 65] {
            let _ = sqrt(4, p);
        }
        assert_eq!(sqrt(9, 56), None);
    }

    #[test]
    fn test_explicit_curve_bad_prime() -> Result<()> {
        // y^2 = x^3 + 9 over Z/56 with base 02 00.
        for prime in [56_u8, 3, 1] {
            let parameters = EcParameters {
                version:  1,
                field_id: FieldId {
                    field_type: ID_PRIME_FIELD,
                    parameters: Any::encode_from(&Int::new(&[prime])?)?,
                },
                curve:    Curve {
                    a:    OctetString::new(vec![0])?,
                    b:    OctetString::new(vec![9])?,
                    seed: None,
                },
                base:     OctetString::new(hex!("0200").to_vec())?,
                order:    Int::new(&[7])?,
                cofactor: None,
            };
            assert!(
                matches!(CurveParameters::try_from(&parameters), Err(Error::Parse(_))),
                "prime {prime}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_certificate_der_forms() -> Result<()> {
        let der = hex!("3003020101");
        assert_eq!(certificate_der(&der)?, der);
        assert_eq!(certificate_der(b"MAMCAQE=")?, der);
        assert_eq!(certificate_der(b" MAMC\nAQE=\n")?, der);
        let pem = b"-----BEGIN CERTIFICATE-----\nMAMCAQE=\n-----END CERTIFICATE-----\n";
        assert_eq!(certificate_der(pem)?, der);
        assert!(matches!(
            certificate_der(b"not a certificate!"),
            Err(Error::KeyExtractionFailed { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_pss_parameters() -> Result<()> {
        let defaults = PssParameters::try_from(&RsaSsaPssParameters::default())?;
        assert_eq!(defaults, PssParameters {
            hash:        HashAlgorithm::Sha1,
            mgf_hash:    HashAlgorithm::Sha1,
            salt_length: 20,
        });
        let der = hex!(
            "3034"
            "a00f 300d 0609608648016503040201 0500"
            "a11c 301a 06092a864886f70d010108 300d 0609608648016503040201 0500"
            "a203 020120"
        );
        let parameters = PssParameters::try_from(&RsaSsaPssParameters::from_der(&der)?)?;
        assert_eq!(parameters, PssParameters {
            hash:        HashAlgorithm::Sha256,
            mgf_hash:    HashAlgorithm::Sha256,
            salt_length: 32,
        });
        Ok(())
    }
}
