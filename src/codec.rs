//! Conversions between byte buffers, big integers and their text forms.
//!
//! Bytes are unsigned throughout the crate. Signed bytes (-128..=127) only
//! appear in JSON input produced by runtimes without an unsigned byte type;
//! [`ByteArray`] normalizes them on deserialization.

use {
    crate::{ensure_err, Error, Result},
    base64::{engine::general_purpose::STANDARD as BASE64, Engine},
    num_bigint::BigUint,
    num_traits::Zero,
    serde::{de, Deserialize, Deserializer, Serialize, Serializer},
    std::ops::Deref,
};

/// Maps a signed byte to its unsigned representation.
#[inline]
#[must_use]
pub const fn to_unsigned(byte: i8) -> u8 {
    byte as u8
}

/// Maps an unsigned byte to its signed (two's complement) representation.
#[inline]
#[must_use]
pub const fn to_signed(byte: u8) -> i8 {
    byte as i8
}

/// Big-endian accumulation of unsigned bytes into an unbounded integer.
#[must_use]
pub fn bytes_to_big_integer(bytes: &[u8]) -> BigUint {
    bytes
        .iter()
        .fold(BigUint::zero(), |acc, &byte| (acc << 8_u32) + byte)
}

/// Parses a hex string, optionally `0x` prefixed, into its decimal string.
pub fn hex_to_decimal_string(hex: &str) -> Result<String> {
    let digits = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    ensure_err!(!digits.is_empty(), Error::parse("empty hex string"));
    if let Some(c) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(Error::parse(format!("invalid hex character {c:?}")));
    }
    let value = BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| Error::parse("invalid hex string"))?;
    Ok(value.to_str_radix(10))
}

/// Splits `value` into `word_count` little-endian words of `word_bits` bits,
/// each rendered as a decimal string.
pub fn split_to_fixed_width_words(
    value: &BigUint,
    word_bits: usize,
    word_count: usize,
) -> Result<Vec<String>> {
    let bits = word_bits * word_count;
    ensure_err!(word_bits > 0, Error::Overflow { bits });
    let mask = (BigUint::from(1_u8) << word_bits) - 1_u8;
    let mut rest = value.clone();
    let mut words = Vec::with_capacity(word_count);
    for _ in 0..word_count {
        words.push((&rest & &mask).to_str_radix(10));
        rest >>= word_bits;
    }
    ensure_err!(rest.is_zero(), Error::Overflow { bits });
    Ok(words)
}

/// Reassembles little-endian decimal words of `word_bits` bits.
pub fn words_to_big_integer<S: AsRef<str>>(words: &[S], word_bits: usize) -> Result<BigUint> {
    words.iter().rev().try_fold(BigUint::zero(), |acc, word| {
        let word = word.as_ref();
        let value = BigUint::parse_bytes(word.as_bytes(), 10)
            .ok_or_else(|| Error::parse(format!("invalid decimal word {word:?}")))?;
        ensure_err!(value.bits() <= word_bits as u64, Error::Overflow {
            bits: word_bits,
        });
        Ok((acc << word_bits) + value)
    })
}

/// Byte buffer as found in passport JSON.
///
/// Deserializes from an array of signed or unsigned byte values, or from a
/// base64 string. Serializes as lowercase hex.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteArray(pub Vec<u8>);

impl ByteArray {
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for ByteArray {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for ByteArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteArray({})", hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for ByteArray {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Values(Vec<i16>),
            Base64(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Values(values) => values
                .into_iter()
                .map(|value| match value {
                    -128..=-1 => Ok(to_unsigned(value as i8)),
                    0..=255 => Ok(value as u8),
                    _ => Err(de::Error::custom(format!("byte value {value} out of range"))),
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(Self),
            Raw::Base64(text) => BASE64
                .decode(text.trim())
                .map(Self)
                .map_err(de::Error::custom),
        }
    }
}

impl Serialize for ByteArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex::serialize(&self.0, serializer)
    }
}
