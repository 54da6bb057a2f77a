//! RSA signature verification.
//!
//! Only the public operation is implemented, there is no signing.
//!
//! Verification is split in two: [`RsaPublicKey::recover`] computes the
//! encoded message `EM = s^e mod n` once, the `verify_*` functions then check
//! an encoding against it. Scheme detection tries many encodings against a
//! single exponentiation.

use {
    super::{
        mod_ring::{ModRing, RingRefExt, UintMont},
        uint_from_biguint,
    },
    crate::{
        algorithms::HashAlgorithm,
        asn1::tlv::{self, Tlv},
        ensure_err, Error, Leniency, Result,
    },
    num_bigint::BigUint,
    num_traits::ToPrimitive,
    ruint::Uint,
    subtle::ConstantTimeEq,
    tracing::trace,
};

#[derive(Clone, Debug)]
pub struct RsaPublicKey<U: UintMont> {
    ring:            ModRing<U>,
    public_exponent: U,
    small_exponent:  Option<u64>,
    modulus_bits:    usize,
}

impl<U: UintMont> RsaPublicKey<U> {
    pub fn new(modulus: &BigUint, public_exponent: &BigUint) -> Result<Self> {
        ensure_err!(
            modulus.bit(0) && modulus.bits() > 1,
            Error::parse("RSA modulus must be odd")
        );
        ensure_err!(
            *public_exponent > BigUint::from(1_u8) && public_exponent < modulus,
            Error::parse("RSA public exponent out of range")
        );
        Ok(Self {
            ring:            ModRing::new(uint_from_biguint(modulus)?)?,
            public_exponent: uint_from_biguint(public_exponent)?,
            small_exponent:  public_exponent.to_u64(),
            modulus_bits:    modulus.bits() as usize,
        })
    }

    #[must_use]
    pub const fn modulus_bits(&self) -> usize {
        self.modulus_bits
    }

    /// Modulus length in bytes, `k` in RFC 8017.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.modulus_bits.div_ceil(8)
    }

    /// RFC 8017 RSAVP1: the `k` byte encoded message `s^e mod n`.
    ///
    /// Signatures shorter than `k` are accepted as if left padded with zeros.
    pub fn recover(&self, signature: &[u8]) -> Result<Vec<u8>> {
        let k = self.size();
        ensure_err!(signature.len() <= k, Error::SignatureInvalid);
        let signature = U::try_from_be_slice(signature).ok_or(Error::SignatureInvalid)?;
        let signature = (&self.ring)
            .checked_from(signature)
            .ok_or(Error::SignatureInvalid)?;
        let message = match self.small_exponent {
            Some(e) => signature.pow_ct(e),
            None => signature.pow_ct(self.public_exponent),
        };
        let bytes = message.to_uint().to_be_vec();
        Ok(bytes[bytes.len() - k..].to_vec())
    }
}

/// Recovers the encoded message with an integer width fitting the modulus.
pub fn recover(modulus: &BigUint, exponent: &BigUint, signature: &[u8]) -> Result<Vec<u8>> {
    match modulus.bits() {
        0..=1024 => RsaPublicKey::<Uint<1024, 16>>::new(modulus, exponent)?.recover(signature),
        1025..=2048 => RsaPublicKey::<Uint<2048, 32>>::new(modulus, exponent)?.recover(signature),
        2049..=3072 => RsaPublicKey::<Uint<3072, 48>>::new(modulus, exponent)?.recover(signature),
        3073..=4096 => RsaPublicKey::<Uint<4096, 64>>::new(modulus, exponent)?.recover(signature),
        bits => Err(Error::UnsupportedAlgorithm(format!(
            "{bits} bit RSA modulus"
        ))),
    }
}

/// RFC 8017 9.2 `DigestInfo`, with or without NULL hash parameters.
fn digest_info(hash: HashAlgorithm, digest: &[u8], null_parameters: bool) -> Vec<u8> {
    let mut algorithm = vec![Tlv::oid(&hash.oid())];
    if null_parameters {
        algorithm.push(Tlv::null());
    }
    Tlv::constructed(tlv::SEQUENCE, [
        Tlv::constructed(tlv::SEQUENCE, algorithm),
        Tlv::octet_string(digest),
    ])
    .to_vec()
}

/// RFC 8017 9.2 EMSA-PKCS1-v1_5 encoding: `00 01 FF.. 00 DigestInfo`.
fn emsa_pkcs1_v15(digest_info: &[u8], em_len: usize) -> Option<Vec<u8>> {
    let padding = em_len.checked_sub(digest_info.len() + 3)?;
    if padding < 8 {
        return None;
    }
    let mut em = Vec::with_capacity(em_len);
    em.extend_from_slice(&[0x00, 0x01]);
    em.resize(2 + padding, 0xff);
    em.push(0x00);
    em.extend_from_slice(digest_info);
    Some(em)
}

/// RFC 8017 8.2.2 step 3 and 4, on a recovered encoded message.
///
/// RFC 8017 requires NULL digest parameters, but absent parameters are seen
/// in the wild and RFC 5754 mandates them for SHA2 elsewhere in CMS. Those
/// are handled according to `absent_parameters`.
pub fn verify_pkcs1_v15(
    em: &[u8],
    hash: HashAlgorithm,
    digest: &[u8],
    absent_parameters: Leniency,
) -> Result<()> {
    let expected = |null| emsa_pkcs1_v15(&digest_info(hash, digest, null), em.len());
    if let Some(expected) = expected(true) {
        if bool::from(expected.ct_eq(em)) {
            return Ok(());
        }
    }
    if let Some(expected) = expected(false) {
        if bool::from(expected.ct_eq(em)) {
            return absent_parameters.check(
                "PKCS#1 v1.5 DigestInfo without NULL parameters",
                || Error::SignatureInvalid,
            );
        }
    }
    Err(Error::SignatureInvalid)
}

/// RFC 8017 9.1.2 EMSA-PSS-VERIFY on a recovered encoded message.
///
/// `em` is the `k` byte output of [`RsaPublicKey::recover`]. A `salt_length`
/// of `None` accepts whatever salt the padding encodes.
pub fn verify_pss(
    em: &[u8],
    modulus_bits: usize,
    hash: HashAlgorithm,
    mgf_hash: HashAlgorithm,
    digest: &[u8],
    salt_length: Option<usize>,
) -> Result<()> {
    // EM: maskedDB || H || 0xbc, with maskedDB = DB xor MGF(H)
    // DB: 00 .. 00 || 01 || salt
    // H:  Hash(00 00 00 00 00 00 00 00 || mHash || salt)
    ensure_err!(modulus_bits >= 2, Error::SignatureInvalid);
    let em_bits = modulus_bits - 1;
    let em_len = em_bits.div_ceil(8);
    ensure_err!(em.len() >= em_len, Error::SignatureInvalid);
    let (leading, em) = em.split_at(em.len() - em_len);
    ensure_err!(
        leading.iter().all(|&b| b == 0),
        Error::SignatureInvalid
    );

    let hash_len = hash.output_len();
    ensure_err!(digest.len() == hash_len, Error::SignatureInvalid);
    ensure_err!(
        em_len >= hash_len + salt_length.unwrap_or(0) + 2,
        Error::SignatureInvalid
    );
    ensure_err!(em[em_len - 1] == 0xbc, Error::SignatureInvalid);

    let db_len = em_len - hash_len - 1;
    let (masked_db, h) = em[..em_len - 1].split_at(db_len);
    let unused_bits = 8 * em_len - em_bits;
    let top_mask = 0xff_u8 >> unused_bits;
    ensure_err!(masked_db[0] & !top_mask == 0, Error::SignatureInvalid);

    let mut db = mgf1(mgf_hash, h, db_len);
    for (byte, masked) in db.iter_mut().zip(masked_db) {
        *byte ^= masked;
    }
    db[0] &= top_mask;

    let separator = db
        .iter()
        .position(|&b| b != 0)
        .ok_or(Error::SignatureInvalid)?;
    ensure_err!(db[separator] == 0x01, Error::SignatureInvalid);
    let salt = &db[separator + 1..];
    if let Some(expected) = salt_length {
        ensure_err!(salt.len() == expected, Error::SignatureInvalid);
    }
    trace!(salt_length = salt.len(), "PSS padding intact");

    let mut prefixed = vec![0_u8; 8];
    prefixed.extend_from_slice(digest);
    prefixed.extend_from_slice(salt);
    let h_prime = hash.hash_bytes(&prefixed);
    ensure_err!(bool::from(h_prime.ct_eq(h)), Error::SignatureInvalid);
    Ok(())
}

/// RFC 8017 B.2.1 MGF1.
fn mgf1(hash: HashAlgorithm, seed: &[u8], out_len: usize) -> Vec<u8> {
    let mut mask = Vec::with_capacity(out_len + hash.output_len());
    let mut counter: u32 = 0;
    while mask.len() < out_len {
        let mut data = Vec::with_capacity(seed.len() + 4);
        data.extend_from_slice(seed);
        data.extend_from_slice(&counter.to_be_bytes());
        mask.extend_from_slice(&hash.hash_bytes(&data));
        counter += 1;
    }
    mask.truncate(out_len);
    mask
}
