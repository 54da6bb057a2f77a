use {
    crate::asn1::ID_PRIME_FIELD,
    der::{
        asn1::{Int, ObjectIdentifier as Oid},
        Any, Sequence, ValueOrd,
    },
};

/// ANSI X9.62 `FieldID`.
///
/// ```asn1
/// FieldID ::= SEQUENCE {
///     fieldType   OBJECT IDENTIFIER,
///     parameters  ANY DEFINED BY fieldType
/// }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Sequence, ValueOrd)]
pub struct FieldId {
    pub field_type: Oid,
    pub parameters: Any,
}

impl FieldId {
    /// The prime `p` of a `prime-field`, `None` for characteristic two fields.
    pub fn prime(&self) -> der::Result<Option<Int>> {
        if self.field_type != ID_PRIME_FIELD {
            return Ok(None);
        }
        self.parameters.decode_as::<Int>().map(Some)
    }
}
