mod fixture;

use {
    anyhow::Result,
    hex_literal::hex,
    icao_9303_proof::{
        algorithms::{Algorithm, AlgorithmName, HashAlgorithm},
        certificate::{self, Extraction, PssParameters, PublicKeyInfo},
        Error, Leniency, VerifierConfig,
    },
    num_bigint::BigUint,
};

const CSCA_MODULUS: [u8; 256] = hex!(
    "b1513f080ee739ba4700bcba9398320b95b0a118c74e6513308e96f6a97c4365"
    "0b388b07bd71b108aae8370714dafe14e6fc0ac68510886bb5ef6f35131247ff"
    "e4dff14b06f0d62f391f7e694017974c5f2e1c972a19798327e535708a69410b"
    "9e4959317f15894b4f9dafd544f1b634bb59d7613485067bd3ba0f17728369fe"
    "f6b98ff0fe38a987ea01ab64b9a826c4a92230769269a2ce83f4e4d92fba606e"
    "ef565e2172afdebe2eb56a4ca3d6b47ba8bfe7567a0c1bb865bc97dcf2cd801e"
    "4134bdab9c489c535654596c6acd53124d23cf6c95afcf3635c6ff78acb12a44"
    "43ca143edce637d5c8026d2a05be04625405a75ae564baa998efa169777d3499"
);

fn rsa(key: &PublicKeyInfo) -> (&BigUint, &BigUint) {
    match key {
        PublicKeyInfo::Rsa { modulus, exponent } => (modulus, exponent),
        PublicKeyInfo::Ec { .. } => panic!("expected an RSA key, got {key:?}"),
    }
}

#[test]
fn test_csca_key() -> Result<()> {
    let pem = fixture::certificate("sha256_rsa_2048/mock_csca.crt")?;
    let info = certificate::parse(&pem, &VerifierConfig::strict())?;
    let (modulus, exponent) = rsa(&info.public_key);
    assert_eq!(modulus.bits(), 2048);
    assert_eq!(exponent.to_string(), "65537");
    assert_eq!(modulus.to_bytes_be(), CSCA_MODULUS);
    assert_eq!(modulus.to_str_radix(16).len(), 512);
    assert_eq!(info.extraction, Extraction::Structured);
    assert_eq!(
        info.signature_algorithm,
        Some(AlgorithmName::Known(Algorithm::Sha256WithRsa))
    );
    assert_eq!(info.signature_hash, Some(HashAlgorithm::Sha256));
    Ok(())
}

#[test]
fn test_input_forms() -> Result<()> {
    let pem = fixture::certificate("sha256_rsa_2048/mock_dsc.crt")?;
    let expected = certificate::extract_public_key(&pem, &VerifierConfig::strict())?;
    let (modulus, _) = rsa(&expected);
    assert!(modulus.to_str_radix(16).starts_with("a871ddb1"));

    let base64 = String::from_utf8(pem)?
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect::<String>();
    let der = certificate::certificate_der(base64.as_bytes())?;
    assert_eq!(der[0], 0x30);
    assert_eq!(
        certificate::extract_public_key(base64.as_bytes(), &VerifierConfig::strict())?,
        expected
    );
    assert_eq!(
        certificate::extract_public_key(&der, &VerifierConfig::strict())?,
        expected
    );
    Ok(())
}

#[test]
fn test_truncated_certificate() -> Result<()> {
    let der = fixture::certificate("sha256_rsa_2048/mock_csca_truncated.der")?;
    for leniency in [Leniency::Allow, Leniency::Warn] {
        let config = VerifierConfig {
            key_fallback: leniency,
            ..VerifierConfig::default()
        };
        let info = certificate::parse(&der, &config)?;
        assert_eq!(info.extraction, Extraction::Fallback);
        assert_eq!(info.signature_algorithm, None);
        let (modulus, exponent) = rsa(&info.public_key);
        assert_eq!(modulus.to_bytes_be(), CSCA_MODULUS);
        assert_eq!(*exponent, BigUint::from(65537_u32));
    }

    match certificate::parse(&der, &VerifierConfig::strict()) {
        Err(Error::KeyExtractionFailed { certificate, .. }) => assert_eq!(certificate, der),
        other => panic!("expected KeyExtractionFailed, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_garbage() {
    let inputs: [&[u8]; 3] = [b"", b"hello world", &hex!("30030201")];
    for input in inputs {
        assert!(matches!(
            certificate::parse(input, &VerifierConfig::default()),
            Err(Error::KeyExtractionFailed { .. })
        ));
    }
}

#[test]
fn test_named_curve_key() -> Result<()> {
    let pem = fixture::certificate("sha256_ecdsa_secp256r1/mock_dsc.crt")?;
    let info = certificate::parse(&pem, &VerifierConfig::strict())?;
    let PublicKeyInfo::Ec { curve, point } = &info.public_key else {
        panic!("expected an EC key");
    };
    assert_eq!(curve.name, Some("secp256r1"));
    assert_eq!(
        point.x.to_bytes_be(),
        hex!("2e2a6ba7b39594378ccad9fb9f00f36f0cce688d91831a604e02e2f3d95fc9f0")
    );
    assert_eq!(
        point.y.to_bytes_be(),
        hex!("77d6576144366be7a4feaf918709034de7dda4400fa4daf20c6afbb662d88d63")
    );
    assert!(curve.contains(point));
    assert_eq!(info.public_key.bits(), 256);
    Ok(())
}

#[test]
fn test_explicit_curve_key() -> Result<()> {
    let pem = fixture::certificate("sha384_ecdsa_brainpoolP384r1/mock_dsc.crt")?;
    let info = certificate::parse(&pem, &VerifierConfig::strict())?;
    let PublicKeyInfo::Ec { curve, point } = &info.public_key else {
        panic!("expected an EC key");
    };
    assert_eq!(curve.name, Some("brainpoolP384r1"));
    assert_eq!(curve.prime.bits(), 384);
    assert_eq!(curve.cofactor, BigUint::from(1_u8));
    assert!(curve.contains(&curve.generator));
    assert!(curve.contains(point));
    assert_eq!(
        info.signature_algorithm,
        Some(AlgorithmName::Known(Algorithm::EcdsaWithSha384))
    );
    assert_eq!(info.signature_hash, Some(HashAlgorithm::Sha384));
    Ok(())
}

#[test]
fn test_pss_signed_certificate() -> Result<()> {
    let pem = fixture::certificate("sha256_rsapss_2048/mock_dsc.crt")?;
    let info = certificate::parse(&pem, &VerifierConfig::strict())?;
    assert_eq!(rsa(&info.public_key).0.bits(), 2048);
    assert_eq!(
        info.signature_algorithm,
        Some(AlgorithmName::Known(Algorithm::RsassaPss))
    );
    assert_eq!(info.signature_hash, Some(HashAlgorithm::Sha256));
    assert_eq!(
        info.signature_pss,
        Some(PssParameters {
            hash:        HashAlgorithm::Sha256,
            mgf_hash:    HashAlgorithm::Sha256,
            salt_length: 32,
        })
    );
    assert_eq!(info.key_pss, None);
    Ok(())
}

#[test]
fn test_unsupported_issuer_algorithm() -> Result<()> {
    let pem = fixture::certificate("sha256_rsapss_2048/mock_dsc.crt")?;
    let expected = certificate::parse(&pem, &VerifierConfig::strict())?;

    // Point the issuer's MGF1 digest at an unknown OID, 2.16.840.1.101.3.4.2.127.
    let mut der = certificate::certificate_der(&pem)?;
    let sha256 = hex!("0609608648016503040201");
    let position = der
        .windows(sha256.len())
        .rposition(|window| window == sha256)
        .ok_or_else(|| anyhow::anyhow!("no SHA-256 OID"))?;
    der[position + sha256.len() - 1] = 0x7f;

    let info = certificate::parse(&der, &VerifierConfig::strict())?;
    assert_eq!(info.extraction, Extraction::Structured);
    assert_eq!(info.public_key, expected.public_key);
    assert_eq!(info.signature_algorithm, None);
    assert_eq!(info.signature_pss, None);
    Ok(())
}
