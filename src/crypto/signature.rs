//! Document Signer signature over the signed attributes.
//!
//! The signature algorithm comes from a reader supplied name. When that name
//! is missing or unknown, [`detect`] tries every supported combination
//! against the key.

use {
    super::{ecdsa, rsa},
    crate::{
        algorithms::{to_standard_name, AlgorithmName, HashAlgorithm, SignatureScheme},
        certificate::PublicKeyInfo,
        Error, Result, VerifierConfig,
    },
    num_bigint::BigUint,
    tracing::debug,
};

/// PSS salt lengths tried by [`detect`] after the digest length.
const PSS_SALT_LENGTHS: [usize; 4] = [32, 48, 64, 20];

/// Verifies `signature` over `econtent`.
///
/// Returns [`Error::SignatureInvalid`] for a signature that does not match,
/// and other errors for keys or schemes that cannot be used together.
pub fn verify(
    econtent: &[u8],
    signature: &[u8],
    key: &PublicKeyInfo,
    hash: HashAlgorithm,
    scheme: SignatureScheme,
    config: &VerifierConfig,
) -> Result<()> {
    let digest = hash.hash_bytes(econtent);
    match (key, scheme) {
        (PublicKeyInfo::Rsa { modulus, exponent }, SignatureScheme::Pkcs1v15) => {
            let em = rsa::recover(modulus, exponent, signature)?;
            rsa::verify_pkcs1_v15(&em, hash, &digest, config.digest_info_parameters)
        }
        (PublicKeyInfo::Rsa { modulus, exponent }, SignatureScheme::Pss { salt_length }) => {
            let em = rsa::recover(modulus, exponent, signature)?;
            rsa::verify_pss(&em, modulus_bits(modulus)?, hash, hash, &digest, salt_length)
        }
        (PublicKeyInfo::Ec { curve, point }, SignatureScheme::Ecdsa) => {
            ecdsa::verify(curve, point, &digest, signature)
        }
        (key, scheme) => Err(Error::UnsupportedAlgorithm(format!(
            "{scheme} signature with {} key",
            match key {
                PublicKeyInfo::Rsa { .. } => "an RSA",
                PublicKeyInfo::Ec { .. } => "an EC",
            }
        ))),
    }
}

/// Finds the digest and scheme that make `signature` verify.
///
/// RSA keys are tried with PKCS#1 v1.5 for every digest, then with PSS for
/// every digest and the usual salt lengths. EC keys are tried with ECDSA for
/// every digest.
pub fn detect(
    econtent: &[u8],
    signature: &[u8],
    key: &PublicKeyInfo,
    config: &VerifierConfig,
) -> Result<(HashAlgorithm, SignatureScheme)> {
    let found = match key {
        PublicKeyInfo::Rsa { modulus, exponent } => {
            let em = rsa::recover(modulus, exponent, signature)?;
            let bits = modulus_bits(modulus)?;
            let pkcs1 = HashAlgorithm::ALL.into_iter().find(|&hash| {
                let digest = hash.hash_bytes(econtent);
                rsa::verify_pkcs1_v15(&em, hash, &digest, config.digest_info_parameters).is_ok()
            });
            pkcs1
                .map(|hash| (hash, SignatureScheme::Pkcs1v15))
                .or_else(|| {
                    HashAlgorithm::ALL.into_iter().find_map(|hash| {
                        let digest = hash.hash_bytes(econtent);
                        salt_lengths(hash)
                            .find(|&salt| {
                                rsa::verify_pss(&em, bits, hash, hash, &digest, Some(salt)).is_ok()
                            })
                            .map(|salt| {
                                (hash, SignatureScheme::Pss {
                                    salt_length: Some(salt),
                                })
                            })
                    })
                })
        }
        PublicKeyInfo::Ec { curve, point } => HashAlgorithm::ALL
            .into_iter()
            .find(|&hash| {
                ecdsa::verify(curve, point, &hash.hash_bytes(econtent), signature).is_ok()
            })
            .map(|hash| (hash, SignatureScheme::Ecdsa)),
    };
    let (hash, scheme) = found.ok_or(Error::SignatureInvalid)?;
    debug!(%hash, %scheme, "detected signature algorithm");
    Ok((hash, scheme))
}

/// Digest and scheme for a reader supplied signature algorithm name.
///
/// Names that do not fix the digest (`RSASSA-PSS`, `RSA`) take it from
/// `digest_name`. Returns `None` when the combination stays undetermined.
#[must_use]
pub fn resolve(
    algorithm_name: &str,
    digest_name: Option<&str>,
) -> Option<(HashAlgorithm, SignatureScheme)> {
    let AlgorithmName::Known(algorithm) = to_standard_name(algorithm_name) else {
        return None;
    };
    let scheme = algorithm.scheme()?;
    let hash = algorithm
        .signature_hash()
        .or_else(|| digest_name.and_then(HashAlgorithm::from_name))?;
    Some((hash, scheme))
}

fn salt_lengths(hash: HashAlgorithm) -> impl Iterator<Item = usize> {
    let first = hash.output_len();
    std::iter::once(first).chain(
        PSS_SALT_LENGTHS
            .into_iter()
            .filter(move |&salt| salt != first),
    )
}

fn modulus_bits(modulus: &BigUint) -> Result<usize> {
    usize::try_from(modulus.bits())
        .map_err(|_| Error::UnsupportedAlgorithm("oversized RSA modulus".to_owned()))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            certificate::{CurveParameters, EcPoint},
            crypto::groups::named::SECP256R1,
            econtent,
        },
        anyhow::Result,
        hex_literal::hex,
    };

    const N: [u8; 128] = hex!(
        "e4b26fa58b3b91d06b380a183e4c99082334a16254dba316201e5ee55649c14c"
        "4ac344d09d7538735ed8714696c21af405bdeba1f0e9ddb8353651168c5d7559"
        "73f7299283f485386d9f95ee6e12c991c77f540aaced629eee32f3b1cdc0725b"
        "0f50134f2647f02b6a4722873ffdd222be0d24a5ed96f670ff686cc9f8c05c81"
    );
    const PKCS1_SHA256: [u8; 128] = hex!(
        "1414a07c66d9e27bb9af3412064046c0161305807fe3762d7eaaff2b59778015"
        "14f09772df016fdab563a465d82c0ff51a6ba7cbd94118c3cb707c9fbaeaeb51"
        "a88ae3180404de237c678dc8e44bc902b06746660bd4ad877edd1643e77d0f26"
        "aca9471eb6e1f533a1c181d4a3e30acdcc05df3e0a9e041f40527859aed81ac7"
    );
    const PSS_SHA384: [u8; 128] = hex!(
        "ce31a28e70e49f633d9ee54639c3894adc15967832d48d03df32037e0950cd49"
        "13a282c80ae21cba729455599975715852b36decf90dd939f2ca7493a883d431"
        "b86092de35e35bc599809350d577d39408ba74806cf9c819533df776d3ae93d3"
        "ed7005f714c34db57a72df091092776c24b16b25bdcd90d831dcdd552023cb3f"
    );
    const ECDSA_SHA256: [u8; 64] = hex!(
        "a618582609b6ca2527048ca8f7075dcf1c5efa09336baf1c23991826f1130572"
        "aa625b2fd0340efe21b69d314412d041f362a020615fb049c5115628a7817b9c"
    );

    fn econtent() -> Vec<u8> {
        econtent::assemble(&[0x11; 32], None)
    }

    fn rsa_key() -> PublicKeyInfo {
        PublicKeyInfo::Rsa {
            modulus:  BigUint::from_bytes_be(&N),
            exponent: BigUint::from(65537_u32),
        }
    }

    fn ec_key() -> PublicKeyInfo {
        PublicKeyInfo::Ec {
            curve: CurveParameters::from(&SECP256R1),
            point: EcPoint {
                x: BigUint::from_bytes_be(&hex!(
                    "6163cc67e41d46ffebe14b3c47fab1fbb61320fe664addd0938001465c36233b"
                )),
                y: BigUint::from_bytes_be(&hex!(
                    "9677454ba2614863df19334e96d9f71e2c956a5469685dbdcafb07dabcf1d17e"
                )),
            },
        }
    }

    #[test]
    fn test_verify_declared() -> Result<()> {
        let config = VerifierConfig::strict();
        let econtent = econtent();
        verify(
            &econtent,
            &PKCS1_SHA256,
            &rsa_key(),
            HashAlgorithm::Sha256,
            SignatureScheme::Pkcs1v15,
            &config,
        )?;
        for salt_length in [Some(48), None] {
            verify(
                &econtent,
                &PSS_SHA384,
                &rsa_key(),
                HashAlgorithm::Sha384,
                SignatureScheme::Pss { salt_length },
                &config,
            )?;
        }
        verify(
            &econtent,
            &ECDSA_SHA256,
            &ec_key(),
            HashAlgorithm::Sha256,
            SignatureScheme::Ecdsa,
            &config,
        )?;
        Ok(())
    }

    #[test]
    fn test_wrong_parameters() {
        let config = VerifierConfig::default();
        let econtent = econtent();
        let invalid = |signature: &[u8], key, hash, scheme| {
            matches!(
                verify(&econtent, signature, &key, hash, scheme, &config),
                Err(Error::SignatureInvalid)
            )
        };
        assert!(invalid(
            &PKCS1_SHA256,
            rsa_key(),
            HashAlgorithm::Sha1,
            SignatureScheme::Pkcs1v15
        ));
        assert!(invalid(
            &PSS_SHA384,
            rsa_key(),
            HashAlgorithm::Sha384,
            SignatureScheme::Pss {
                salt_length: Some(32)
            }
        ));
        assert!(invalid(
            &PKCS1_SHA256,
            rsa_key(),
            HashAlgorithm::Sha256,
            SignatureScheme::Pss { salt_length: None }
        ));
        assert!(invalid(
            &ECDSA_SHA256,
            ec_key(),
            HashAlgorithm::Sha384,
            SignatureScheme::Ecdsa
        ));
        assert!(matches!(
            verify(
                &econtent,
                &ECDSA_SHA256,
                &ec_key(),
                HashAlgorithm::Sha256,
                SignatureScheme::Pkcs1v15,
                &config
            ),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_detect() -> Result<()> {
        let config = VerifierConfig::default();
        let econtent = econtent();
        assert_eq!(
            detect(&econtent, &PKCS1_SHA256, &rsa_key(), &config)?,
            (HashAlgorithm::Sha256, SignatureScheme::Pkcs1v15)
        );
        assert_eq!(
            detect(&econtent, &PSS_SHA384, &rsa_key(), &config)?,
            (HashAlgorithm::Sha384, SignatureScheme::Pss {
                salt_length: Some(48),
            })
        );
        assert_eq!(
            detect(&econtent, &ECDSA_SHA256, &ec_key(), &config)?,
            (HashAlgorithm::Sha256, SignatureScheme::Ecdsa)
        );

        let mut tampered = econtent.clone();
        tampered[10] ^= 0x01;
        assert!(matches!(
            detect(&tampered, &PKCS1_SHA256, &rsa_key(), &config),
            Err(Error::SignatureInvalid)
        ));
        Ok(())
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve("SHA256withRSA", Some("SHA-1")),
            Some((HashAlgorithm::Sha256, SignatureScheme::Pkcs1v15))
        );
        assert_eq!(
            resolve("RSASSA-PSS", Some("SHA-256")),
            Some((HashAlgorithm::Sha256, SignatureScheme::Pss {
                salt_length: None
            }))
        );
        assert_eq!(
            resolve("ecdsa-with-SHA384", None),
            Some((HashAlgorithm::Sha384, SignatureScheme::Ecdsa))
        );
        assert_eq!(resolve("RSASSA-PSS", None), None);
        assert_eq!(resolve("SHA256withDSA", Some("SHA-256")), None);
        assert_eq!(resolve("SHA-256", None), None);
    }

    #[test]
    fn test_salt_lengths() {
        assert_eq!(salt_lengths(HashAlgorithm::Sha256).collect::<Vec<_>>(), [
            32, 48, 64, 20
        ]);
        assert_eq!(salt_lengths(HashAlgorithm::Sha224).collect::<Vec<_>>(), [
            28, 32, 48, 64, 20
        ]);
    }
}
