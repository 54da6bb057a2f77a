//! Data group hash table.
//!
//! ICAO 9303-10 4.6.2.3: the Document Security Object signs an
//! `LDSSecurityObject` listing the hash of every data group present on the
//! chip. To check the MRZ against the signature the table is rebuilt with the
//! DG1 hash recomputed from the MRZ, then DER encoded again.

use {
    crate::{
        algorithms::HashAlgorithm,
        asn1::{
            emrtd::LdsSecurityObject,
            tlv::{self, Tlv},
            AnyAlgorithmIdentifier,
        },
        ensure_err, Error, HashTarget, Result,
    },
    der::{asn1::Null, Decode},
    std::collections::{btree_map, BTreeMap},
    tracing::debug,
};

/// Encoding of the digest `AlgorithmIdentifier` parameters.
///
/// RFC 5754 2 says parameters of the SHA2 family must be absent, but
/// implementations have to accept NULL, and many issuers write it. The chip
/// signed whatever it wrote, so the reconstruction has to follow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DigestParameters {
    #[default]
    Absent,
    Null,
}

/// `LDSVersionInfo`, present in `LDSSecurityObject` v1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LdsVersion {
    pub lds_version:     String,
    pub unicode_version: String,
}

/// Layout details of a declared `LDSSecurityObject` that the reconstruction
/// has to reproduce.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LdsLayout {
    pub parameters: DigestParameters,
    pub version:    Option<LdsVersion>,
}

impl LdsLayout {
    /// Layouts issuers use, tried in order when the chip's
    /// `LDSSecurityObject` is not available: v0 then v1 (LDS 1.8, Unicode
    /// 4.0.0), each with absent then NULL digest parameters.
    #[must_use]
    pub fn common() -> [Self; 4] {
        let v1 = || {
            Some(LdsVersion {
                lds_version:     "0108".to_owned(),
                unicode_version: "040000".to_owned(),
            })
        };
        [
            Self {
                parameters: DigestParameters::Absent,
                version:    None,
            },
            Self {
                parameters: DigestParameters::Null,
                version:    None,
            },
            Self {
                parameters: DigestParameters::Absent,
                version:    v1(),
            },
            Self {
                parameters: DigestParameters::Null,
                version:    v1(),
            },
        ]
    }
}

/// Data group hashes keyed by data group number.
///
/// Iteration is in ascending data group order, whatever the insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataGroupHashes(BTreeMap<u8, Vec<u8>>);

/// Data group numbers that can appear in an `LDSSecurityObject`.
#[must_use]
pub const fn is_valid_data_group(number: u8) -> bool {
    matches!(number, 1..=16 | 28..=30)
}

impl DigestParameters {
    pub fn of(algorithm: &AnyAlgorithmIdentifier) -> Result<Self> {
        match &algorithm.parameters {
            None => Ok(Self::Absent),
            Some(any) => {
                any.decode_as::<Null>()?;
                Ok(Self::Null)
            }
        }
    }
}

impl DataGroupHashes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hash, replacing any previous one for the same data group.
    pub fn insert(&mut self, data_group: u8, digest: Vec<u8>) -> Result<Option<Vec<u8>>> {
        ensure_err!(
            is_valid_data_group(data_group),
            Error::parse(format!("invalid data group number {data_group}"))
        );
        Ok(self.0.insert(data_group, digest))
    }

    /// Replaces the DG1 entry with the hash recomputed from the MRZ.
    ///
    /// Returns the hash it replaced, if any.
    pub fn upsert_mrz_hash(&mut self, digest: Vec<u8>) -> Option<Vec<u8>> {
        self.0.insert(1, digest)
    }

    #[must_use]
    pub fn get(&self, data_group: u8) -> Option<&[u8]> {
        self.0.get(&data_group).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &[u8])> {
        self.0.iter().map(|(&number, digest)| (number, digest.as_slice()))
    }

    /// DER encoding as a v0 `LDSSecurityObject`.
    #[must_use]
    pub fn to_der(&self, hash: HashAlgorithm, parameters: DigestParameters) -> Vec<u8> {
        self.to_der_with_layout(hash, &LdsLayout {
            parameters,
            version: None,
        })
    }

    /// DER encoding, v1 if the layout carries an `LDSVersionInfo`.
    #[must_use]
    pub fn to_der_with_layout(&self, hash: HashAlgorithm, layout: &LdsLayout) -> Vec<u8> {
        let mut algorithm = vec![Tlv::oid(&hash.oid())];
        if layout.parameters == DigestParameters::Null {
            algorithm.push(Tlv::null());
        }
        let entries = self.iter().map(|(number, digest)| {
            Tlv::constructed(tlv::SEQUENCE, [
                Tlv::integer(number.into()),
                Tlv::octet_string(digest),
            ])
        });
        let mut fields = vec![
            Tlv::integer(u64::from(layout.version.is_some())),
            Tlv::constructed(tlv::SEQUENCE, algorithm),
            Tlv::constructed(tlv::SEQUENCE, entries),
        ];
        if let Some(version) = &layout.version {
            fields.push(Tlv::constructed(tlv::SEQUENCE, [
                Tlv::primitive(PRINTABLE_STRING, version.lds_version.as_bytes()),
                Tlv::primitive(PRINTABLE_STRING, version.unicode_version.as_bytes()),
            ]));
        }
        Tlv::constructed(tlv::SEQUENCE, fields).to_vec()
    }

    /// Compares against the hashes a chip declared.
    ///
    /// A differing digest is a [`Error::HashMismatch`] for that data group,
    /// a data group present on one side only is a structure mismatch.
    pub fn check_declared(&self, declared: &Self) -> Result<()> {
        for (number, digest) in declared.iter() {
            match self.get(number) {
                Some(ours) if ours == digest => {}
                Some(_) => return Err(Error::HashMismatch(HashTarget::DataGroup(number))),
                None => {
                    debug!(data_group = number, "data group missing from hash table");
                    return Err(Error::StructureMismatch {
                        what: "data group hash table",
                    });
                }
            }
        }
        ensure_err!(
            self.len() == declared.len(),
            Error::StructureMismatch {
                what: "data group hash table",
            }
        );
        Ok(())
    }
}

const PRINTABLE_STRING: u32 = 0x13;

impl FromIterator<(u8, Vec<u8>)> for DataGroupHashes {
    /// Collects without validating the numbers, later duplicates win.
    fn from_iter<I: IntoIterator<Item = (u8, Vec<u8>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DataGroupHashes {
    type IntoIter = btree_map::Iter<'a, u8, Vec<u8>>;
    type Item = (&'a u8, &'a Vec<u8>);

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A decoded `LDSSecurityObject` with everything needed to re-encode it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclaredLds {
    pub hash:   HashAlgorithm,
    pub layout: LdsLayout,
    pub hashes: DataGroupHashes,
}

impl DeclaredLds {
    /// Decodes the `LDSSecurityObject` from the chip's encapsulated content.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let lds = LdsSecurityObject::from_der(bytes)?;
        Self::try_from(&lds)
    }
}

impl TryFrom<&LdsSecurityObject> for DeclaredLds {
    type Error = Error;

    fn try_from(lds: &LdsSecurityObject) -> Result<Self> {
        let oid = lds.hash_algorithm.algorithm;
        let hash = HashAlgorithm::from_oid(&oid)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("digest {oid}")))?;
        ensure_err!(
            (lds.version == 0) == lds.lds_version_info.is_none(),
            Error::parse("LDSVersionInfo must be present exactly for version 1")
        );
        let mut hashes = DataGroupHashes::new();
        for entry in &lds.data_group_hash_values {
            let number = u8::try_from(entry.data_group_number)
                .map_err(|_| Error::parse("data group number out of range"))?;
            let previous = hashes.insert(number, entry.data_group_hash_value.as_bytes().to_vec())?;
            ensure_err!(
                previous.is_none(),
                Error::parse(format!("data group {number} listed twice"))
            );
        }
        Ok(Self {
            hash,
            layout: LdsLayout {
                parameters: DigestParameters::of(&lds.hash_algorithm)?,
                version:    lds.lds_version_info.as_ref().map(|info| LdsVersion {
                    lds_version:     info.lds_version.to_string(),
                    unicode_version: info.unicode_version.to_string(),
                }),
            },
            hashes,
        })
    }
}
