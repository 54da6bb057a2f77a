//! Minimal DER tag-length-value encoder and reader.
//!
//! The encoder computes all length prefixes from the content, using the long
//! form where needed, so structures with any number of data groups or any
//! digest size encode without precomputed headers. The reader walks raw
//! TLVs while keeping the exact input bytes of every element, which is what
//! the chip signed.

use {
    crate::{ensure_err, Error, Result},
    bytes::{Buf, BufMut},
    der::asn1::ObjectIdentifier as Oid,
};

pub const INTEGER: u32 = 0x02;
pub const BIT_STRING: u32 = 0x03;
pub const OCTET_STRING: u32 = 0x04;
pub const NULL: u32 = 0x05;
pub const OBJECT_IDENTIFIER: u32 = 0x06;
pub const UTC_TIME: u32 = 0x17;
pub const SEQUENCE: u32 = 0x30;
pub const SET: u32 = 0x31;

/// Tag and length of an element, without requiring its value to be present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub tag:        u32,
    /// Size of the tag and length octets.
    pub header_len: usize,
    pub value_len:  usize,
}

/// An owned TLV element ready for encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tlv {
    tag:   u32,
    value: Vec<u8>,
}

/// A borrowed TLV element of some input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TlvRef<'a> {
    pub tag:   u32,
    /// The value bytes.
    pub value: &'a [u8],
    /// The complete element including tag and length.
    pub raw:   &'a [u8],
}

impl Tlv {
    #[must_use]
    pub fn primitive(tag: u32, value: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// Constructed element containing `children` in order.
    #[must_use]
    pub fn constructed(tag: u32, children: impl IntoIterator<Item = Self>) -> Self {
        let mut value = Vec::new();
        for child in children {
            child.encode(&mut value);
        }
        Self { tag, value }
    }

    /// Appends already encoded DER to the value.
    #[must_use]
    pub fn with_raw(mut self, raw: &[u8]) -> Self {
        self.value.extend_from_slice(raw);
        self
    }

    /// Minimal two's complement INTEGER.
    #[must_use]
    pub fn integer(value: u64) -> Self {
        let bytes = value.to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
        let mut value = Vec::with_capacity(9);
        if bytes[start] & 0x80 != 0 {
            value.push(0);
        }
        value.extend_from_slice(&bytes[start..]);
        Self::primitive(INTEGER, value)
    }

    #[must_use]
    pub fn oid(oid: &Oid) -> Self {
        Self::primitive(OBJECT_IDENTIFIER, oid.as_bytes())
    }

    #[must_use]
    pub fn octet_string(value: &[u8]) -> Self {
        Self::primitive(OCTET_STRING, value)
    }

    #[must_use]
    pub fn null() -> Self {
        Self::primitive(NULL, [])
    }

    #[must_use]
    pub const fn tag(&self) -> u32 {
        self.tag
    }

    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    #[must_use]
    pub fn encoded_len(&self) -> usize {
        tag_size(self.tag) + length_size(self.value.len()) + self.value.len()
    }

    pub fn encode<B: BufMut>(&self, buffer: &mut B) {
        encode_tag(buffer, self.tag);
        encode_length(buffer, self.value.len());
        buffer.put_slice(&self.value);
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buffer);
        buffer
    }
}

impl Header {
    /// Reads the tag and length at the start of `input`.
    ///
    /// Unlike [`TlvRef::parse`] this works on truncated input.
    pub fn parse(input: &[u8]) -> Result<Self> {
        let mut buffer = input;
        let tag = decode_tag(&mut buffer)?;
        let value_len = decode_length(&mut buffer)?;
        Ok(Self {
            tag,
            header_len: input.len() - buffer.len(),
            value_len,
        })
    }

    #[must_use]
    pub const fn total_len(&self) -> usize {
        self.header_len + self.value_len
    }
}

impl<'a> TlvRef<'a> {
    /// Reads one element from the front of `input`, returning it and the rest.
    pub fn parse(input: &'a [u8]) -> Result<(Self, &'a [u8])> {
        let mut buffer = input;
        let tag = decode_tag(&mut buffer)?;
        let length = decode_length(&mut buffer)?;
        ensure_err!(
            buffer.remaining() >= length,
            Error::parse("EOF when reading TLV value")
        );
        let header = input.len() - buffer.len();
        let (raw, rest) = input.split_at(header + length);
        Ok((
            Self {
                tag,
                value: &raw[header..],
                raw,
            },
            rest,
        ))
    }

    /// Parses `input` as exactly one element.
    pub fn parse_exact(input: &'a [u8]) -> Result<Self> {
        let (tlv, rest) = Self::parse(input)?;
        ensure_err!(rest.is_empty(), Error::parse("trailing data after TLV"));
        Ok(tlv)
    }

    /// Parses the value as a sequence of elements.
    pub fn children(&self) -> Result<Vec<Self>> {
        let mut rest = self.value;
        let mut children = Vec::new();
        while !rest.is_empty() {
            let (child, tail) = Self::parse(rest)?;
            children.push(child);
            rest = tail;
        }
        Ok(children)
    }

    #[must_use]
    pub const fn is_constructed(&self) -> bool {
        self.raw[0] & 0x20 != 0
    }
}

fn tag_size(tag: u32) -> usize {
    match tag {
        0..=0xff => 1,
        0x100..=0xffff => 2,
        0x1_0000..=0xff_ffff => 3,
        _ => 4,
    }
}

fn encode_tag<B: BufMut>(buffer: &mut B, tag: u32) {
    let bytes = tag.to_be_bytes();
    buffer.put_slice(&bytes[4 - tag_size(tag)..]);
}

fn decode_tag<B: Buf>(buffer: &mut B) -> Result<u32> {
    ensure_err!(buffer.has_remaining(), Error::parse("EOF when reading tag"));
    let first = buffer.get_u8();
    let mut tag = u32::from(first);
    if first & 0x1f == 0x1f {
        // Multi-byte tag number, base 128 with continuation bits.
        loop {
            ensure_err!(
                buffer.has_remaining(),
                Error::parse("EOF when reading long tag")
            );
            ensure_err!(tag <= 0xff_ffff, Error::parse("tag too long"));
            let byte = buffer.get_u8();
            tag = (tag << 8) | u32::from(byte);
            if byte & 0x80 == 0 {
                break;
            }
        }
    }
    Ok(tag)
}

fn length_size(length: usize) -> usize {
    if length < 0x80 {
        1
    } else {
        1 + (usize::BITS - length.leading_zeros()).div_ceil(8) as usize
    }
}

fn encode_length<B: BufMut>(buffer: &mut B, length: usize) {
    if length < 0x80 {
        buffer.put_u8(length as u8);
    } else {
        let be = length.to_be_bytes();
        let trim = be.iter().position(|&b| b != 0).unwrap_or(0);
        let trimmed = &be[trim..];
        buffer.put_u8(0x80 | trimmed.len() as u8);
        buffer.put_slice(trimmed);
    }
}

fn decode_length<B: Buf>(buffer: &mut B) -> Result<usize> {
    ensure_err!(
        buffer.has_remaining(),
        Error::parse("EOF when reading length")
    );
    let first = buffer.get_u8();
    if first < 0x80 {
        return Ok(first as usize);
    }
    const BYTES: usize = usize::BITS as usize / 8;
    let len = (first & 0x7f) as usize;
    ensure_err!(len != 0, Error::parse("indefinite length not supported"));
    ensure_err!(len <= BYTES, Error::parse("length too large"));
    ensure_err!(
        buffer.remaining() >= len,
        Error::parse("EOF when reading long length")
    );
    let mut bytes = [0; BYTES];
    buffer.copy_to_slice(&mut bytes[BYTES - len..]);
    Ok(usize::from_be_bytes(bytes))
}
