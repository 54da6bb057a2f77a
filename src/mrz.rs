//! Machine Readable Zone formatting and the DG1 envelope.
//!
//! ICAO 9303-10 4.7.1: DG1 holds the MRZ as a single string without line
//! breaks, wrapped as
//!
//! ```text
//! 61 L { 5F1F L <MRZ characters> }
//! ```
//!
//! The lengths follow from the document type: 88 characters for passport
//! books (TD3), 72 for TD2 and 90 for TD1 cards.

use {
    crate::{asn1::Tlv, ensure_err, Error, Result},
    serde::{Deserialize, Serialize},
    std::fmt::{self, Display, Formatter},
};

/// DG1 application tag.
pub const DG1_TAG: u32 = 0x61;

/// ICAO 9303-10 4.7.1.1 MRZ data element tag.
pub const MRZ_INFO_TAG: u32 = 0x5F1F;

/// MRTD form factor, ICAO 9303-4 to 9303-6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    /// Card, three lines of 30 characters.
    Td1,
    /// Card, two lines of 36 characters.
    Td2,
    /// Passport book, two lines of 44 characters.
    Td3,
}

/// Fields of a TD3 MRZ, each at its fixed width.
///
/// Concatenating the fields in order reproduces the MRZ exactly as stored in
/// DG1. Fillers (`<`) are part of the field values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MrzInfo {
    pub document_code:               String,
    pub issuing_state:               String,
    pub primary_identifier:          String,
    pub secondary_identifier:        String,
    pub document_number:             String,
    pub document_number_check_digit: char,
    pub nationality:                 String,
    pub date_of_birth:               String,
    pub date_of_birth_check_digit:   char,
    pub gender:                      String,
    pub date_of_expiry:              String,
    pub date_of_expiry_check_digit:  char,
    /// Personal number and its check digit.
    pub optional_data:               String,
    pub composite_check_digit:       char,
}

impl DocumentType {
    /// Number of MRZ characters, without line breaks.
    #[must_use]
    pub const fn mrz_len(self) -> usize {
        match self {
            Self::Td1 => 90,
            Self::Td2 => 72,
            Self::Td3 => 88,
        }
    }

    #[must_use]
    pub const fn from_mrz_len(len: usize) -> Option<Self> {
        match len {
            90 => Some(Self::Td1),
            72 => Some(Self::Td2),
            88 => Some(Self::Td3),
            _ => None,
        }
    }
}

impl MrzInfo {
    /// Splits a TD3 MRZ into its fields. Line breaks are ignored.
    pub fn parse(mrz: &str) -> Result<Self> {
        let mrz = strip_line_breaks(mrz);
        ensure_err!(
            mrz.is_ascii(),
            Error::parse("MRZ contains non-ASCII characters")
        );
        ensure_err!(
            DocumentType::from_mrz_len(mrz.len()) == Some(DocumentType::Td3),
            Error::parse(format!("expected a TD3 MRZ of 88 characters, got {}", mrz.len()))
        );
        let char_at = |i: usize| char::from(mrz.as_bytes()[i]);

        // Line 1: the name field splits at the first `<<`.
        let names = &mrz[5..44];
        let (primary, secondary) = names.split_once("<<").unwrap_or((names, ""));

        Ok(Self {
            document_code:               mrz[0..2].trim_end_matches('<').to_owned(),
            issuing_state:               mrz[2..5].to_owned(),
            primary_identifier:          primary.to_owned(),
            secondary_identifier:        secondary.to_owned(),
            document_number:             mrz[44..53].to_owned(),
            document_number_check_digit: char_at(53),
            nationality:                 mrz[54..57].to_owned(),
            date_of_birth:               mrz[57..63].to_owned(),
            date_of_birth_check_digit:   char_at(63),
            gender:                      mrz[64..65].to_owned(),
            date_of_expiry:              mrz[65..71].to_owned(),
            date_of_expiry_check_digit:  char_at(71),
            optional_data:               mrz[72..87].to_owned(),
            composite_check_digit:       char_at(87),
        })
    }

    /// Verifies the check digits of ICAO 9303-4 4.2.2.
    pub fn validate_check_digits(&self) -> Result<()> {
        let check = |field: &str, value: &str, digit: char| {
            let expected = check_digit(value);
            ensure_err!(
                expected == digit,
                Error::parse(format!(
                    "{field} check digit is {digit:?}, expected {expected:?}"
                ))
            );
            Ok(())
        };
        check(
            "document number",
            &self.document_number,
            self.document_number_check_digit,
        )?;
        check(
            "date of birth",
            &self.date_of_birth,
            self.date_of_birth_check_digit,
        )?;
        check(
            "date of expiry",
            &self.date_of_expiry,
            self.date_of_expiry_check_digit,
        )?;
        let composite = format!(
            "{}{}{}{}{}{}{}",
            self.document_number,
            self.document_number_check_digit,
            self.date_of_birth,
            self.date_of_birth_check_digit,
            self.date_of_expiry,
            self.date_of_expiry_check_digit,
            self.optional_data,
        );
        check("composite", &composite, self.composite_check_digit)
    }

    #[must_use]
    pub fn document_type(&self) -> Option<DocumentType> {
        DocumentType::from_mrz_len(self.to_string().len())
    }
}

impl Display for MrzInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let gender = self.gender.chars().next().unwrap_or('<');
        write!(
            f,
            "{:<<2}{}{}<<{}{}{}{}{}{}{}{}{}{}{}",
            self.document_code,
            self.issuing_state,
            self.primary_identifier,
            self.secondary_identifier,
            self.document_number,
            self.document_number_check_digit,
            self.nationality,
            self.date_of_birth,
            self.date_of_birth_check_digit,
            gender,
            self.date_of_expiry,
            self.date_of_expiry_check_digit,
            self.optional_data,
            self.composite_check_digit,
        )
    }
}

/// Formats the MRZ and wraps it in the DG1 envelope, ready for hashing.
#[must_use]
pub fn format_mrz(info: &MrzInfo) -> Vec<u8> {
    encode_dg1(&info.to_string())
}

/// Wraps MRZ characters in the DG1 envelope, lengths derived from the input.
#[must_use]
pub fn encode_dg1(mrz: &str) -> Vec<u8> {
    Tlv::constructed(DG1_TAG, [Tlv::primitive(MRZ_INFO_TAG, mrz.as_bytes())]).to_vec()
}

/// Like [`encode_dg1`], but rejects strings that are not a TD1, TD2 or TD3
/// MRZ.
pub fn encode_dg1_checked(mrz: &str) -> Result<(DocumentType, Vec<u8>)> {
    let mrz = strip_line_breaks(mrz);
    let document_type = DocumentType::from_mrz_len(mrz.len()).ok_or_else(|| {
        Error::parse(format!(
            "MRZ of {} characters is not a TD1, TD2 or TD3 document",
            mrz.len()
        ))
    })?;
    Ok((document_type, encode_dg1(&mrz)))
}

/// ICAO 9303-3 4.9 check digit, weights 7, 3, 1.
///
/// Fillers and unexpected characters count as zero.
#[must_use]
pub fn check_digit(value: &str) -> char {
    let sum: u32 = value
        .bytes()
        .zip([7, 3, 1].into_iter().cycle())
        .map(|(c, weight)| {
            let v = match c {
                b'0'..=b'9' => u32::from(c - b'0'),
                b'A'..=b'Z' => u32::from(c - b'A') + 10,
                _ => 0,
            };
            v * weight
        })
        .sum();
    char::from(b'0' + (sum % 10) as u8)
}

fn strip_line_breaks(mrz: &str) -> String {
    mrz.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
}

#[cfg(test)]
mod tests {
    use {super::*, crate::algorithms::HashAlgorithm, anyhow::Result, hex_literal::hex};

    const FRENCH: &str = "P<FRADUPONT<<ALPHONSE<HUGUES<ALBERT<<<<<<<<<24HB818324FRA0402111M3111115<<<<<<<<<<<<<<02";
    const SPECIMEN: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    #[test]
    fn test_format_french_sample() -> Result<()> {
        let info = MrzInfo::parse(FRENCH)?;
        assert_eq!(info.document_code, "P");
        assert_eq!(info.primary_identifier, "DUPONT");
        assert_eq!(info.document_number, "24HB81832");
        assert_eq!(info.to_string(), FRENCH);

        let dg1 = format_mrz(&info);
        assert_eq!(dg1.len(), 93);
        assert_eq!(&dg1[..9], &[97, 91, 95, 31, 88, 80, 60, 70, 82]);
        assert_eq!(
            HashAlgorithm::Sha256.hash_bytes(&dg1),
            hex!("b0df1f856c549e66460ba5afc40cc98219832e7d9cc21c1737859da48788dc4e")
        );
        assert_eq!(format_mrz(&info), dg1);
        Ok(())
    }

    #[test]
    fn test_fields() {
        let info = MrzInfo {
            document_code:               "P".to_owned(),
            issuing_state:               "UTO".to_owned(),
            primary_identifier:          "ERIKSSON".to_owned(),
            secondary_identifier:        "ANNA<MARIA<<<<<<<<<<<<<<<<<<<".to_owned(),
            document_number:             "L898902C3".to_owned(),
            document_number_check_digit: '6',
            nationality:                 "UTO".to_owned(),
            date_of_birth:               "740812".to_owned(),
            date_of_birth_check_digit:   '2',
            gender:                      "FEMALE".to_owned(),
            date_of_expiry:              "120415".to_owned(),
            date_of_expiry_check_digit:  '9',
            optional_data:               "ZE184226B<<<<<1".to_owned(),
            composite_check_digit:       '0',
        };
        assert_eq!(info.to_string(), SPECIMEN);
        assert_eq!(info.document_type(), Some(DocumentType::Td3));
    }

    #[test]
    fn test_check_digits() -> Result<()> {
        assert_eq!(check_digit("L898902C3"), '6');
        assert_eq!(check_digit("740812"), '2');
        assert_eq!(check_digit("120415"), '9');
        assert_eq!(check_digit("<<<<<<<<<<<<<<"), '0');

        MrzInfo::parse(SPECIMEN)?.validate_check_digits()?;

        let mut tampered = MrzInfo::parse(SPECIMEN)?;
        tampered.date_of_birth = "740813".to_owned();
        assert!(matches!(
            tampered.validate_check_digits(),
            Err(Error::Parse(_))
        ));
        Ok(())
    }

    #[test]
    fn test_document_types() -> Result<()> {
        let (td1, dg1) = encode_dg1_checked(&"<".repeat(90))?;
        assert_eq!(td1, DocumentType::Td1);
        assert_eq!(&dg1[..5], &hex!("615d5f1f5a"));

        let (td2, dg1) = encode_dg1_checked(&"<".repeat(72))?;
        assert_eq!(td2, DocumentType::Td2);
        assert_eq!(&dg1[..5], &hex!("614b5f1f48"));

        let two_lines = format!("{}\n{}", &SPECIMEN[..44], &SPECIMEN[44..]);
        let (td3, dg1) = encode_dg1_checked(&two_lines)?;
        assert_eq!(td3, DocumentType::Td3);
        assert_eq!(&dg1[..5], &hex!("615b5f1f58"));

        assert!(encode_dg1_checked("P<UTO").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_rejects() {
        assert!(MrzInfo::parse(&FRENCH[..87]).is_err());
        assert!(MrzInfo::parse(&"<".repeat(90)).is_err());
    }
}
