use {
    crate::{Error, Result},
    serde::Deserialize,
    tracing::warn,
};

/// How to handle correctable deviations from the standards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leniency {
    /// Correct silently.
    Allow,

    /// Correct, but log a warning.
    #[default]
    Warn,

    /// Be strict and return an error.
    Strict,
}

impl Leniency {
    pub(crate) fn check(self, message: &str, error: impl FnOnce() -> Error) -> Result<()> {
        match self {
            Self::Strict => Err(error()),
            Self::Warn => {
                warn!("{message}");
                Ok(())
            }
            Self::Allow => Ok(()),
        }
    }
}

impl std::str::FromStr for Leniency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Self::Allow),
            "warn" => Ok(Self::Warn),
            "strict" => Ok(Self::Strict),
            _ => Err(format!("unknown leniency {s:?}, expected allow, warn or strict")),
        }
    }
}

/// Verification settings.
///
/// Default behaviour is to warn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifierConfig {
    /// Byte-pattern key extraction when the certificate does not decode.
    pub key_fallback: Leniency,

    /// PKCS#1 v1.5 `DigestInfo` with absent instead of NULL hash parameters.
    pub digest_info_parameters: Leniency,

    /// Trying all schemes when the declared signature algorithm is missing
    /// or unknown.
    pub scheme_detection: Leniency,
}

impl VerifierConfig {
    /// Rejects every deviation.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            key_fallback:           Leniency::Strict,
            digest_info_parameters: Leniency::Strict,
            scheme_detection:       Leniency::Strict,
        }
    }
}
