//! eMRTD specific ASN1 structures.

use {
    super::AnyAlgorithmIdentifier,
    der::{
        asn1::{OctetString, PrintableString},
        Sequence,
    },
};

/// ICAO 9303-10 Appendix D.1
///
/// ```asn1
/// LDSSecurityObject ::= SEQUENCE {
///     version                LDSSecurityObjectVersion,
///     hashAlgorithm          DigestAlgorithmIdentifier,
///     dataGroupHashValues    SEQUENCE SIZE (2..ub-DataGroups) OF DataGroupHash,
///     ldsVersionInfo         LDSVersionInfo OPTIONAL
/// }
/// ```
///
/// `ldsVersionInfo` is present if and only if `version` is `v1`.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct LdsSecurityObject {
    pub version:                u64,
    pub hash_algorithm:         AnyAlgorithmIdentifier,
    pub data_group_hash_values: Vec<DataGroupHash>,
    pub lds_version_info:       Option<LdsVersionInfo>,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct DataGroupHash {
    pub data_group_number:     u64,
    pub data_group_hash_value: OctetString,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct LdsVersionInfo {
    pub lds_version:     PrintableString,
    pub unicode_version: PrintableString,
}

#[cfg(test)]
mod tests {
    use {super::*, anyhow::Result, der::Decode, hex_literal::hex};

    #[test]
    fn test_lds_v1() -> Result<()> {
        let der = hex!(
            "3056 020101 300b 0609608648016503040201"
            "3032"
            "  3017 020101 0412 000102030405060708090a0b0c0d0e0f1011"
            "  3017 020102 0412 101112131415161718191a1b1c1d1e1f2021"
            "3010 1304 30313038 1308 3034303030303030"
        );
        let lds = LdsSecurityObject::from_der(&der)?;
        assert_eq!(lds.version, 1);
        assert_eq!(lds.data_group_hash_values.len(), 2);
        assert_eq!(lds.data_group_hash_values[1].data_group_number, 2);
        let info = lds.lds_version_info.expect("version info");
        assert_eq!(info.lds_version.to_string(), "0108");
        assert_eq!(info.unicode_version.to_string(), "04000000");
        Ok(())
    }
}
