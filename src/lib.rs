//! ICAO 9303 passive authentication core.
//!
//! Reconstructs the signed attributes (`eContent`) of an eMRTD Document
//! Security Object from the MRZ and the data group hashes, extracts the
//! Document Signer public key from its certificate and verifies the
//! signature over the reconstructed content.
//!
//! The stages are exposed individually ([`mrz`], [`lds`], [`econtent`],
//! [`certificate`], [`crypto::signature`]) and chained in [`passport`].

pub mod algorithms;
pub mod asn1;
pub mod certificate;
pub mod codec;
mod config;
pub mod crypto;
pub mod econtent;
mod error;
pub mod lds;
pub mod mrz;
pub mod passport;

pub use self::{
    config::{Leniency, VerifierConfig},
    error::{Error, HashTarget, Result},
    passport::{FailureStage, PassportData, VerificationReport, VerificationResult},
};

/// Returns early with the given error if the condition does not hold.
///
/// Like `anyhow::ensure!`, but for typed errors.
#[macro_export]
macro_rules! ensure_err {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err);
        }
    };
}
