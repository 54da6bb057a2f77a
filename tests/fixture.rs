//! Helper to load the mock passports and certificates under `tests/fixtures`.
//!
//! The certificates were generated with OpenSSL, the passports signed with
//! them. All passports carry the same French specimen MRZ.
#![allow(dead_code)]

use {
    anyhow::{Context, Result},
    icao_9303_proof::PassportData,
    std::fs,
};

pub const RSA_SHA256: &str = "rsa_sha256";
pub const RSA_PSS_SHA256: &str = "rsapss_sha256";
pub const ECDSA_P256: &str = "ecdsa_sha256_secp256r1";
pub const ECDSA_BRAINPOOL_P384: &str = "ecdsa_sha384_brainpoolP384r1";
/// v0 `LDSSecurityObject` with NULL digest parameters.
pub const RSA_LDS_NULL: &str = "rsa_sha256_lds_null";
/// v1 `LDSSecurityObject` with `LDSVersionInfo` 0108 / 040000.
pub const ECDSA_LDS_V1: &str = "ecdsa_sha256_lds_v1";

pub const PASSPORTS: [&str; 6] = [
    RSA_SHA256,
    RSA_PSS_SHA256,
    ECDSA_P256,
    ECDSA_BRAINPOOL_P384,
    RSA_LDS_NULL,
    ECDSA_LDS_V1,
];

pub fn passport(name: &str) -> Result<PassportData> {
    let path = format!("tests/fixtures/passports/{name}.json");
    let json = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    Ok(PassportData::from_json(&json)?)
}

/// Reads a file under `tests/fixtures/mock_certificates`.
pub fn certificate(path: &str) -> Result<Vec<u8>> {
    let path = format!("tests/fixtures/mock_certificates/{path}");
    fs::read(&path).with_context(|| format!("reading {path}"))
}
