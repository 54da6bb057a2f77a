//! Byte pattern RSA key recovery for certificates that do not decode.
//!
//! Looks for the `rsaEncryption` (or `id-RSASSA-PSS`) object identifier and
//! reads the `RSAPublicKey` from the BIT STRING that follows it. Only the
//! headers of the enclosing elements are read, so the key is found even when
//! the certificate is cut off after it.

use {
    super::PublicKeyInfo,
    crate::{
        asn1::tlv::{self, Header, Tlv, TlvRef},
        ensure_err, Error, Result,
    },
    const_oid::db::rfc5912::{ID_RSASSA_PSS, RSA_ENCRYPTION},
    num_bigint::BigUint,
    num_traits::Zero,
    tracing::debug,
};

/// Elements allowed between the algorithm OID and the key BIT STRING.
const MAX_SKIPPED: usize = 3;

pub fn scan_rsa_key(der: &[u8]) -> Result<PublicKeyInfo> {
    let mut last_error = Error::parse("no RSA algorithm identifier found");
    for oid in [RSA_ENCRYPTION, ID_RSASSA_PSS] {
        let pattern = Tlv::oid(&oid).to_vec();
        let mut offset = 0;
        while let Some(found) = find(&der[offset..], &pattern) {
            let start = offset + found + pattern.len();
            match key_after(&der[start..]) {
                Ok(key) => {
                    debug!(%oid, offset = start, "found RSA key by byte pattern");
                    return Ok(key);
                }
                Err(error) => last_error = error,
            }
            offset = start;
        }
    }
    Err(last_error)
}

fn key_after(mut input: &[u8]) -> Result<PublicKeyInfo> {
    for _ in 0..=MAX_SKIPPED {
        let header = Header::parse(input)?;
        if header.tag == tlv::BIT_STRING {
            let bits = &input[header.header_len..];
            ensure_err!(
                bits.first() == Some(&0),
                Error::parse("key BIT STRING has unused bits")
            );
            return rsa_public_key(&bits[1..]);
        }
        ensure_err!(
            header.total_len() <= input.len(),
            Error::parse("truncated before the key BIT STRING")
        );
        input = &input[header.total_len()..];
    }
    Err(Error::parse("no BIT STRING after the RSA algorithm identifier"))
}

/// Reads `RSAPublicKey ::= SEQUENCE { modulus INTEGER, publicExponent INTEGER }`,
/// tolerating a truncated SEQUENCE as long as both integers are complete.
fn rsa_public_key(input: &[u8]) -> Result<PublicKeyInfo> {
    let header = Header::parse(input)?;
    ensure_err!(
        header.tag == tlv::SEQUENCE,
        Error::parse("key BIT STRING does not contain a SEQUENCE")
    );
    let (modulus, rest) = TlvRef::parse(&input[header.header_len..])?;
    let (exponent, _) = TlvRef::parse(rest)?;
    let modulus = integer(modulus, "modulus")?;
    let exponent = integer(exponent, "public exponent")?;
    ensure_err!(
        !modulus.is_zero() && !exponent.is_zero(),
        Error::parse("zero RSA key component")
    );
    Ok(PublicKeyInfo::Rsa { modulus, exponent })
}

fn integer(element: TlvRef<'_>, what: &str) -> Result<BigUint> {
    ensure_err!(
        element.tag == tlv::INTEGER,
        Error::parse(format!("RSA {what} is not an INTEGER"))
    );
    ensure_err!(
        element.value.first().is_some_and(|&b| b & 0x80 == 0),
        Error::parse(format!("RSA {what} is negative or empty"))
    );
    Ok(BigUint::from_bytes_be(element.value))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use {super::*, anyhow::Result, hex_literal::hex};

    #[test]
    fn test_truncated_certificate() -> Result<()> {
        let der = hex!(
            "308202be 3082"
            "06092a864886f70d010101 0500"
            "030d00 300a 020300c35b 0203010001"
            "a0"
        );
        let PublicKeyInfo::Rsa { modulus, exponent } = scan_rsa_key(&der)? else {
            panic!("expected an RSA key");
        };
        assert_eq!(modulus, BigUint::from(0xc35b_u32));
        assert_eq!(exponent, BigUint::from(65537_u32));
        Ok(())
    }

    #[test]
    fn test_skips_unusable_occurrences() -> Result<()> {
        // The first occurrence is followed by a BIT STRING with unused bits.
        let der = hex!(
            "06092a864886f70d010101 030201ff"
            "06092a864886f70d010101 0500"
            "030c00 3009 020203e9 0203010001"
        );
        let PublicKeyInfo::Rsa { modulus, .. } = scan_rsa_key(&der)? else {
            panic!("expected an RSA key");
        };
        assert_eq!(modulus, BigUint::from(1001_u32));
        Ok(())
    }

    #[test]
    fn test_rejects() {
        // No OID.
        assert!(scan_rsa_key(&hex!("3003020101")).is_err());
        // Exponent cut off.
        assert!(scan_rsa_key(&hex!("06092a864886f70d010101 0500 030d00 300a 020300c35b 0203")).is_err());
        // Negative modulus.
        assert!(scan_rsa_key(&hex!("06092a864886f70d010101 0500 030c00 3009 0202c35b 0203010001")).is_err());
    }
}
