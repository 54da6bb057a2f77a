use {
    crate::passport::FailureStage,
    std::fmt::{self, Display, Formatter},
    thiserror::Error,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed MRZ, hex, certificate or other input.
    #[error("parse error: {0}")]
    Parse(String),

    /// A value does not fit the declared width.
    #[error("value does not fit in {bits} bits")]
    Overflow { bits: usize },

    /// A reconstructed structure differs from the chip-declared one.
    #[error("reconstructed {what} does not match the declared value")]
    StructureMismatch { what: &'static str },

    /// A recomputed hash differs from the declared one.
    #[error("hash of {0} does not match the declared value")]
    HashMismatch(HashTarget),

    /// No strategy could recover a public key from the certificate.
    #[error("could not extract public key from certificate: {reason}")]
    KeyExtractionFailed {
        reason:      String,
        certificate: Vec<u8>,
    },

    /// The signature is cryptographically invalid.
    #[error("signature is invalid")]
    SignatureInvalid,

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("DER error: {0}")]
    Der(#[from] der::Error),
}

/// What a [`Error::HashMismatch`] is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashTarget {
    DataGroup(u8),

    /// The `LDSSecurityObject` digest declared in the signed attributes.
    SecurityObject,
}

impl Display for HashTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataGroup(number) => write!(f, "data group {number}"),
            Self::SecurityObject => f.write_str("the security object"),
        }
    }
}

impl Error {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub(crate) fn key_extraction(reason: impl Into<String>, certificate: &[u8]) -> Self {
        Self::KeyExtractionFailed {
            reason:      reason.into(),
            certificate: certificate.to_vec(),
        }
    }

    /// The pipeline stage this error terminates verification at, if it is a
    /// verification outcome rather than a fault.
    #[must_use]
    pub const fn failure_stage(&self) -> Option<FailureStage> {
        match self {
            Self::HashMismatch(_) => Some(FailureStage::HashMismatch),
            Self::StructureMismatch { .. } => Some(FailureStage::StructureMismatch),
            Self::KeyExtractionFailed { .. } => Some(FailureStage::KeyExtractionFailed),
            Self::SignatureInvalid => Some(FailureStage::SignatureInvalid),
            _ => None,
        }
    }
}
