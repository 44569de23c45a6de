//! Submission records
//!
//! A [`Record`] aggregates every field collected across the funnel pages
//! for one [`BusinessKey`]. The store assigns a [`RecordId`] on insert and
//! keeps it stable afterwards.

use crate::error::RecordError;
use crate::field::Field;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

/// Reserved attribute holding the record identity
pub const ID_FIELD: &str = "_id";

/// Reserved attribute holding the business key
pub const BUSINESS_KEY_FIELD: &str = "trustName";

/// Reserved attribute holding the last error message
pub const ERROR_LOG_FIELD: &str = "errorLog";

/// Check if a field name is one of the reserved record attributes
#[inline]
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    matches!(name, ID_FIELD | BUSINESS_KEY_FIELD | ERROR_LOG_FIELD)
}

/// Named field values owned by a record or a page
pub type FieldSet = BTreeMap<String, Field>;

/// Unique, non-empty business key of a Submission
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BusinessKey(String);

impl BusinessKey {
    /// Parse a business key, trimming surrounding whitespace
    ///
    /// # Errors
    /// Returns [`RecordError::EmptyBusinessKey`] if nothing is left after
    /// trimming.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, RecordError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RecordError::EmptyBusinessKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Key as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BusinessKey {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<BusinessKey> for String {
    fn from(key: BusinessKey) -> Self {
        key.0
    }
}

impl Display for BusinessKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-assigned record identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Generate new record ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Submission as stored remotely
///
/// Serializes to a flat, schemaless map: the reserved `_id`, `trustName`
/// and `errorLog` attributes next to every collected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identity, `None` until the store has assigned one
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    /// Business key
    #[serde(rename = "trustName")]
    pub business_key: BusinessKey,

    /// Last error recorded against this Submission
    #[serde(rename = "errorLog", default, skip_serializing_if = "Option::is_none")]
    pub error_log: Option<String>,

    /// Every other collected field
    #[serde(flatten)]
    pub fields: FieldSet,
}

impl Record {
    /// Create a record carrying only its business key
    #[inline]
    #[must_use]
    pub fn new(business_key: BusinessKey) -> Self {
        Self {
            id: None,
            business_key,
            error_log: None,
            fields: FieldSet::new(),
        }
    }

    /// Add a field
    ///
    /// # Errors
    /// Returns [`RecordError::ReservedField`] for reserved attribute names.
    pub fn with_field(mut self, name: impl Into<String>, value: Field) -> Result<Self, RecordError> {
        let name = name.into();
        if is_reserved(&name) {
            return Err(RecordError::ReservedField(name));
        }
        self.fields.insert(name, value);
        Ok(self)
    }

    /// Set the error log
    #[inline]
    #[must_use]
    pub fn with_error_log(mut self, message: impl Into<String>) -> Self {
        self.error_log = Some(message.into());
        self
    }

    /// Set the identity
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// Look up a collected field
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Look up a collected field that is present and not blank
    #[inline]
    #[must_use]
    pub fn non_blank_field(&self, name: &str) -> Option<&Field> {
        self.field(name).filter(|field| !field.is_blank())
    }

    /// True when only the business key (and possibly an error log) is set
    #[inline]
    #[must_use]
    pub fn is_minimal(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overlay page-owned fields onto this record
    ///
    /// Owned fields win over stored values of the same name; every other
    /// stored field, the identity, the business key and the error log pass
    /// through unchanged. Reserved names in `owned` are ignored.
    #[must_use]
    pub fn merged(&self, owned: &FieldSet) -> Self {
        let mut merged = self.clone();
        for (name, value) in owned {
            if is_reserved(name) {
                tracing::debug!(field = %name, "skipping reserved field in merge");
                continue;
            }
            merged.fields.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Decode a record from its flat JSON form
    ///
    /// # Errors
    /// Returns [`RecordError::Malformed`] when the value is not a record.
    pub fn from_json(value: serde_json::Value) -> Result<Self, RecordError> {
        serde_json::from_value(value).map_err(|e| RecordError::Malformed(e.to_string()))
    }

    /// Encode the record in its flat JSON form
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::StructuredValue;
    use pretty_assertions::assert_eq;

    fn key() -> BusinessKey {
        BusinessKey::parse("Smith Family Trust").unwrap()
    }

    #[test]
    fn business_key_trims_and_rejects_empty() {
        assert_eq!(BusinessKey::parse("  Acme Trust ").unwrap().as_str(), "Acme Trust");
        assert_eq!(BusinessKey::parse("   "), Err(RecordError::EmptyBusinessKey));
    }

    #[test]
    fn reserved_names_rejected_as_fields() {
        let err = Record::new(key())
            .with_field(BUSINESS_KEY_FIELD, Field::scalar("other"))
            .unwrap_err();
        assert_eq!(err, RecordError::ReservedField("trustName".into()));
    }

    #[test]
    fn merge_overlays_owned_fields_only() {
        let existing = Record::new(key())
            .with_id(RecordId::new())
            .with_field("A", Field::scalar("1"))
            .unwrap()
            .with_field("B", Field::scalar("2"))
            .unwrap();

        let mut owned = FieldSet::new();
        owned.insert("B".into(), Field::scalar("3"));

        let merged = existing.merged(&owned);
        assert_eq!(merged.field("A"), Some(&Field::scalar("1")));
        assert_eq!(merged.field("B"), Some(&Field::scalar("3")));
        assert_eq!(merged.id, existing.id);
        assert_eq!(merged.business_key, existing.business_key);
    }

    #[test]
    fn merge_cannot_rewrite_business_key() {
        let existing = Record::new(key()).with_error_log("earlier failure");
        let mut owned = FieldSet::new();
        owned.insert(BUSINESS_KEY_FIELD.into(), Field::scalar("Hijacked"));
        owned.insert(ERROR_LOG_FIELD.into(), Field::scalar(""));

        let merged = existing.merged(&owned);
        assert_eq!(merged.business_key, key());
        assert_eq!(merged.error_log.as_deref(), Some("earlier failure"));
        assert!(merged.is_minimal());
    }

    #[test]
    fn merge_is_idempotent() {
        let mut owned = FieldSet::new();
        owned.insert("email".into(), Field::scalar("a@b.co"));
        let once = Record::new(key()).merged(&owned);
        assert_eq!(once.merged(&owned), once);
    }

    #[test]
    fn flat_json_shape() {
        let id = RecordId::new();
        let record = Record::new(key())
            .with_id(id)
            .with_field("firstName", Field::scalar("Ada"))
            .unwrap()
            .with_field(
                "address",
                StructuredValue::new("1 Queen St").with_component("city", "Auckland").into(),
            )
            .unwrap();

        let json = record.to_json();
        assert_eq!(json["_id"], serde_json::json!(id.to_string()));
        assert_eq!(json["trustName"], "Smith Family Trust");
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["address"]["city"], "Auckland");
        assert!(json.get("errorLog").is_none());

        assert_eq!(Record::from_json(json).unwrap(), record);
    }

    #[test]
    fn json_without_key_is_malformed() {
        let err = Record::from_json(serde_json::json!({ "firstName": "Ada" })).unwrap_err();
        assert!(matches!(err, RecordError::Malformed(_)));

        let err = Record::from_json(serde_json::json!({ "trustName": "  " })).unwrap_err();
        assert!(matches!(err, RecordError::Malformed(_)));
    }
}
