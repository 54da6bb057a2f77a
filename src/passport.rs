//! Passive authentication of a passport read.
//!
//! [`verify`] runs the stages in order, each consuming the output of the
//! previous one:
//!
//! ```text
//! RawInput -> MrzFormatted -> HashTableAssembled -> EContentAssembled
//!          -> KeyExtracted -> SignatureVerified
//! ```
//!
//! The first failing stage ends the run. Verification outcomes (a mismatch,
//! an unusable certificate, a bad signature) produce an invalid
//! [`VerificationReport`], malformed input is an error.

use {
    crate::{
        algorithms::{HashAlgorithm, SignatureScheme},
        certificate::{self, CertificateInfo},
        codec::ByteArray,
        crypto::signature,
        econtent,
        lds::{DataGroupHashes, DeclaredLds, LdsLayout},
        mrz, ensure_err, Error, HashTarget, Result, VerifierConfig,
    },
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
};

/// Passport data as exported by a reader app.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassportData {
    pub mrz:                          String,
    /// `[data group number, digest]` pairs, DG1 as read from the chip.
    pub data_group_hashes:            Vec<(u8, ByteArray)>,
    /// The signed attributes of the Document Security Object.
    pub e_content:                    ByteArray,
    /// The signature over `e_content`.
    pub encrypted_digest:             ByteArray,
    /// Document Signer certificate, PEM.
    pub dsc:                          String,
    /// Digest of the data group hash table.
    pub digest_algorithm:             String,
    #[serde(default)]
    pub signer_info_digest_algorithm: Option<String>,
    #[serde(default)]
    pub digest_encryption_algorithm:  Option<String>,
    /// The encapsulated `LDSSecurityObject`, if the reader exported it.
    #[serde(default)]
    pub lds_security_object:          Option<ByteArray>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    #[default]
    RawInput,
    MrzFormatted,
    HashTableAssembled,
    EContentAssembled,
    KeyExtracted,
    SignatureVerified,
}

/// The check a passport failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureStage {
    HashMismatch,
    StructureMismatch,
    SignatureInvalid,
    KeyExtractionFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid:      bool,
    pub failure_stage: Option<FailureStage>,
}

/// Intermediate buffers, kept for auditing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffers {
    /// DG1 as rebuilt from the MRZ.
    pub dg1:          ByteArray,
    pub mrz_hash:     ByteArray,
    /// The DER `LDSSecurityObject` with the recomputed DG1 hash.
    pub hash_table:   ByteArray,
    pub table_digest: ByteArray,
    /// The assembled signed attributes.
    pub econtent:     ByteArray,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub result:              VerificationResult,
    /// Last stage completed.
    pub stage:               Stage,
    pub buffers:             Buffers,
    /// Signature algorithm the signature was checked with.
    pub signature_algorithm: Option<String>,
    /// Why verification failed.
    pub reason:              Option<String>,
}

impl PassportData {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::parse(format!("invalid passport JSON: {e}")))
    }

    /// Digest used for the signed attributes, the hash table digest unless
    /// the signer info names another.
    fn signer_hash(&self) -> Result<HashAlgorithm> {
        let name = self
            .signer_info_digest_algorithm
            .as_deref()
            .unwrap_or(&self.digest_algorithm);
        HashAlgorithm::from_name(name)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("digest {name}")))
    }
}

impl VerificationResult {
    #[must_use]
    pub const fn valid() -> Self {
        Self {
            is_valid:      true,
            failure_stage: None,
        }
    }

    #[must_use]
    pub const fn invalid(stage: FailureStage) -> Self {
        Self {
            is_valid:      false,
            failure_stage: Some(stage),
        }
    }
}

impl Stage {
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::RawInput => Some(Self::MrzFormatted),
            Self::MrzFormatted => Some(Self::HashTableAssembled),
            Self::HashTableAssembled => Some(Self::EContentAssembled),
            Self::EContentAssembled => Some(Self::KeyExtracted),
            Self::KeyExtracted => Some(Self::SignatureVerified),
            Self::SignatureVerified => None,
        }
    }
}

/// Runs passive authentication on `data`.
pub fn verify(data: &PassportData, config: &VerifierConfig) -> Result<VerificationReport> {
    let mut run = Run::default();
    let outcome = run.execute(data, config);
    let (result, reason) = match outcome {
        Ok(()) => (VerificationResult::valid(), None),
        Err(error) => match error.failure_stage() {
            Some(stage) => {
                info!(%error, stage = ?run.stage, "passport failed verification");
                (VerificationResult::invalid(stage), Some(error.to_string()))
            }
            None => return Err(error),
        },
    };
    Ok(VerificationReport {
        result,
        stage: run.stage,
        buffers: run.buffers,
        signature_algorithm: run.signature_algorithm,
        reason,
    })
}

#[derive(Default)]
struct Run {
    stage:               Stage,
    buffers:             Buffers,
    signature_algorithm: Option<String>,
}

impl Run {
    fn advance(&mut self, stage: Stage) {
        debug_assert_eq!(self.stage.next(), Some(stage));
        debug!(?stage, "stage complete");
        self.stage = stage;
    }

    fn execute(&mut self, data: &PassportData, config: &VerifierConfig) -> Result<()> {
        let hash = HashAlgorithm::from_name(&data.digest_algorithm).ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!("digest {}", data.digest_algorithm))
        })?;
        let signer_hash = data.signer_hash()?;

        // MRZ
        let (document_type, dg1) = mrz::encode_dg1_checked(&data.mrz)?;
        let mrz_hash = hash.hash_bytes(&dg1);
        debug!(?document_type, mrz_hash = hex::encode(&mrz_hash), "formatted MRZ");
        self.buffers.dg1 = dg1.into();
        self.buffers.mrz_hash = mrz_hash.clone().into();
        self.advance(Stage::MrzFormatted);

        // Data group hash table
        let mut hashes = DataGroupHashes::new();
        for (number, digest) in &data.data_group_hashes {
            let previous = hashes.insert(*number, digest.to_vec())?;
            ensure_err!(
                previous.is_none(),
                Error::parse(format!("data group {number} listed twice"))
            );
        }
        if let Some(chip) = hashes.upsert_mrz_hash(mrz_hash) {
            if chip != *self.buffers.mrz_hash {
                debug!("DG1 hash from the reader differs from the MRZ hash");
            }
        }
        let table = match &data.lds_security_object {
            Some(declared_der) => {
                let declared = DeclaredLds::from_der(declared_der)?;
                ensure_err!(
                    declared.hash == hash,
                    Error::StructureMismatch {
                        what: "hash table digest algorithm",
                    }
                );
                hashes.check_declared(&declared.hashes)?;
                let table = hashes.to_der_with_layout(hash, &declared.layout);
                ensure_err!(
                    table == **declared_der,
                    Error::StructureMismatch {
                        what: "LDS security object",
                    }
                );
                table
            }
            None => {
                // The layout whose digest the signed attributes declare.
                let declared_digest = econtent::message_digest(&data.e_content).ok();
                let layouts = LdsLayout::common();
                let layout = layouts
                    .iter()
                    .find(|layout| {
                        let table = hashes.to_der_with_layout(hash, layout);
                        declared_digest == Some(signer_hash.hash_bytes(&table).as_slice())
                    })
                    .unwrap_or(&layouts[0]);
                debug!(?layout, "reconstructed LDS security object");
                hashes.to_der_with_layout(hash, layout)
            }
        };
        let table_digest = signer_hash.hash_bytes(&table);
        self.buffers.hash_table = table.into();
        self.buffers.table_digest = table_digest.clone().into();
        self.advance(Stage::HashTableAssembled);

        // Signed attributes
        let malformed = |error: Error| {
            debug!(%error, "chip signed attributes do not parse");
            Error::StructureMismatch {
                what: "signed attributes",
            }
        };
        let declared_digest = econtent::message_digest(&data.e_content).map_err(malformed)?;
        ensure_err!(
            declared_digest == table_digest,
            Error::HashMismatch(HashTarget::SecurityObject)
        );
        let signing_time = econtent::find_signing_time(&data.e_content).map_err(malformed)?;
        let assembled = econtent::assemble(&table_digest, signing_time);
        ensure_err!(
            assembled == *data.e_content,
            Error::StructureMismatch {
                what: "signed attributes",
            }
        );
        self.buffers.econtent = assembled.into();
        self.advance(Stage::EContentAssembled);

        // Document Signer key
        let certificate = certificate::parse(data.dsc.as_bytes(), config)?;
        debug!(
            key_bits = certificate.public_key.bits(),
            extraction = ?certificate.extraction,
            "extracted Document Signer key"
        );
        self.advance(Stage::KeyExtracted);

        // Signature
        let econtent = &self.buffers.econtent;
        let (hash, scheme) = match signature_algorithm(data, &certificate) {
            Some(declared) => declared,
            None => {
                let name = data.digest_encryption_algorithm.as_deref().unwrap_or("none");
                config.scheme_detection.check(
                    &format!("signature algorithm {name} not recognized, trying all schemes"),
                    || Error::UnsupportedAlgorithm(format!("signature algorithm {name}")),
                )?;
                signature::detect(
                    econtent,
                    &data.encrypted_digest,
                    &certificate.public_key,
                    config,
                )?
            }
        };
        self.signature_algorithm = Some(format!("{scheme} with {hash}"));
        signature::verify(
            econtent,
            &data.encrypted_digest,
            &certificate.public_key,
            hash,
            scheme,
            config,
        )?;
        self.advance(Stage::SignatureVerified);
        Ok(())
    }
}

/// Digest and scheme from the declared names, with PSS salt restrictions of
/// the key applied.
fn signature_algorithm(
    data: &PassportData,
    certificate: &CertificateInfo,
) -> Option<(HashAlgorithm, SignatureScheme)> {
    let name = data.digest_encryption_algorithm.as_deref()?;
    let digest = data
        .signer_info_digest_algorithm
        .as_deref()
        .or(Some(&data.digest_algorithm));
    let (hash, scheme) = signature::resolve(name, digest)?;
    Some(match (scheme, certificate.key_pss) {
        (SignatureScheme::Pss { salt_length: None }, Some(pss)) if pss.hash == hash => (
            hash,
            SignatureScheme::Pss {
                salt_length: Some(pss.salt_length),
            },
        ),
        _ => (hash, scheme),
    })
}

#[cfg(test)]
mod tests {
    use {super::*, anyhow::Result};

    #[test]
    fn test_stage_order() {
        let mut stage = Stage::RawInput;
        let mut count = 1;
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            count += 1;
        }
        assert_eq!(stage, Stage::SignatureVerified);
        assert_eq!(count, 6);
    }

    #[test]
    fn test_passport_json() -> Result<()> {
        let data = PassportData::from_json(
            r#"{
                "mrz": "P<",
                "dataGroupHashes": [[1, [-1, 0, 127]], [2, "AAE="]],
                "eContent": [49, 0],
                "encryptedDigest": [],
                "dsc": "",
                "digestAlgorithm": "SHA-256"
            }"#,
        )?;
        assert_eq!(data.data_group_hashes[0].1.to_vec(), [0xff, 0x00, 0x7f]);
        assert_eq!(data.data_group_hashes[1].1.to_vec(), [0x00, 0x01]);
        assert_eq!(data.signer_hash()?, HashAlgorithm::Sha256);
        assert_eq!(data.lds_security_object, None);
        assert!(PassportData::from_json("{}").is_err());
        Ok(())
    }

    #[test]
    fn test_result_json() -> Result<()> {
        let json = serde_json::to_value(VerificationResult::invalid(FailureStage::HashMismatch))?;
        assert_eq!(
            json,
            serde_json::json!({"isValid": false, "failureStage": "hashMismatch"})
        );
        Ok(())
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let data = PassportData {
            mrz:                          "P<UTO".to_owned(),
            data_group_hashes:            vec![],
            e_content:                    ByteArray::default(),
            encrypted_digest:             ByteArray::default(),
            dsc:                          String::new(),
            digest_algorithm:             "SHA-256".to_owned(),
            signer_info_digest_algorithm: None,
            digest_encryption_algorithm:  None,
            lds_security_object:          None,
        };
        assert!(matches!(
            verify(&data, &VerifierConfig::default()),
            Err(Error::Parse(_))
        ));
        let data = PassportData {
            digest_algorithm: "MD5".to_owned(),
            ..data
        };
        assert!(matches!(
            verify(&data, &VerifierConfig::default()),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
