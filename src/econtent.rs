//! Signed attributes of the Document Security Object.
//!
//! RFC 5652 5.4: when `signedAttrs` is present the signature is computed over
//! its DER encoding, with an explicit `SET OF` tag instead of the `[0]
//! IMPLICIT` tag it carries inside `SignerInfo`. ICAO 9303-10 4.6.2.2
//! requires the content-type and message-digest attributes. Virtually all
//! issuers add a signing-time, whose encoding has to be taken verbatim from
//! the chip.

use {
    crate::{
        asn1::{
            tlv::{self, Tlv, TlvRef},
            ID_LDS_SECURITY_OBJECT,
        },
        ensure_err, Error, Result,
    },
    const_oid::db::rfc5911::{ID_CONTENT_TYPE, ID_MESSAGE_DIGEST, ID_SIGNING_TIME},
    der::asn1::ObjectIdentifier as Oid,
};

/// One attribute of a signed attributes `SET`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignedAttribute<'a> {
    pub oid:    Oid,
    /// The `SET OF AttributeValue`, including its header.
    pub values: TlvRef<'a>,
}

/// Builds the signed attributes for a security object with the given digest.
///
/// `signing_time` is the complete attribute value set as found on the chip,
/// usually `31 0F 17 0D <UTCTime>`.
#[must_use]
pub fn assemble(digest: &[u8], signing_time: Option<&[u8]>) -> Vec<u8> {
    let content_type = Tlv::constructed(tlv::SEQUENCE, [
        Tlv::oid(&ID_CONTENT_TYPE),
        Tlv::constructed(tlv::SET, [Tlv::oid(&ID_LDS_SECURITY_OBJECT)]),
    ]);
    let signing_time = signing_time
        .map(|value| Tlv::constructed(tlv::SEQUENCE, [Tlv::oid(&ID_SIGNING_TIME)]).with_raw(value));
    let message_digest = Tlv::constructed(tlv::SEQUENCE, [
        Tlv::oid(&ID_MESSAGE_DIGEST),
        Tlv::constructed(tlv::SET, [Tlv::octet_string(digest)]),
    ]);
    Tlv::constructed(
        tlv::SET,
        [Some(content_type), signing_time, Some(message_digest)]
            .into_iter()
            .flatten(),
    )
    .to_vec()
}

/// Splits signed attributes into their attribute types and value sets.
pub fn parse_attributes(econtent: &[u8]) -> Result<Vec<SignedAttribute<'_>>> {
    let set = TlvRef::parse_exact(econtent)?;
    ensure_err!(
        set.tag == tlv::SET,
        Error::parse(format!("signed attributes start with tag {:#x}", set.tag))
    );
    set.children()?
        .iter()
        .map(|attribute| {
            ensure_err!(
                attribute.tag == tlv::SEQUENCE,
                Error::parse("attribute is not a SEQUENCE")
            );
            let (oid, rest) = TlvRef::parse(attribute.value)?;
            ensure_err!(
                oid.tag == tlv::OBJECT_IDENTIFIER,
                Error::parse("attribute type is not an OBJECT IDENTIFIER")
            );
            let values = TlvRef::parse_exact(rest)?;
            ensure_err!(
                values.tag == tlv::SET,
                Error::parse("attribute values are not a SET")
            );
            Ok(SignedAttribute {
                oid: Oid::from_bytes(oid.value)
                    .map_err(|e| Error::parse(format!("invalid attribute type: {e}")))?,
                values,
            })
        })
        .collect()
}

/// Signing-time value set, verbatim, if the attributes carry one.
pub fn find_signing_time(econtent: &[u8]) -> Result<Option<&[u8]>> {
    Ok(parse_attributes(econtent)?
        .into_iter()
        .find(|attribute| attribute.oid == ID_SIGNING_TIME)
        .map(|attribute| attribute.values.raw))
}

/// The digest declared by the message-digest attribute.
pub fn message_digest(econtent: &[u8]) -> Result<&[u8]> {
    let attribute = parse_attributes(econtent)?
        .into_iter()
        .find(|attribute| attribute.oid == ID_MESSAGE_DIGEST)
        .ok_or_else(|| Error::parse("missing message-digest attribute"))?;
    let digest = TlvRef::parse_exact(attribute.values.value)?;
    ensure_err!(
        digest.tag == tlv::OCTET_STRING,
        Error::parse("message digest is not an OCTET STRING")
    );
    Ok(digest.value)
}
