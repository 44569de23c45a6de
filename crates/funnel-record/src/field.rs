//! Typed field values
//!
//! A field is either a plain string or a structured value (a postal
//! address) carrying a canonical formatted string plus raw components.
//! Validation and comparison always go through the canonical string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Kind of value a page field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Plain string
    #[default]
    Scalar,
    /// Formatted string with raw components
    Structured,
}

/// Structured value with a canonical formatted representation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructuredValue {
    /// Canonical single-line representation
    #[serde(default)]
    pub formatted: String,
    /// Raw components (street, city, postal code, ...)
    #[serde(flatten)]
    pub raw: BTreeMap<String, String>,
}

impl StructuredValue {
    /// Create a structured value without components
    #[inline]
    #[must_use]
    pub fn new(formatted: impl Into<String>) -> Self {
        Self {
            formatted: formatted.into(),
            raw: BTreeMap::new(),
        }
    }

    /// Add a raw component
    #[inline]
    #[must_use]
    pub fn with_component(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.raw.insert(name.into(), value.into());
        self
    }
}

/// Field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    /// Plain string value
    Scalar(String),
    /// Structured value (address)
    Structured(StructuredValue),
}

impl Field {
    /// Create a scalar field
    #[inline]
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    /// Create a structured field with only a formatted string
    #[inline]
    pub fn structured(formatted: impl Into<String>) -> Self {
        Self::Structured(StructuredValue::new(formatted))
    }

    /// Empty value of the given kind
    #[must_use]
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Scalar => Self::Scalar(String::new()),
            FieldKind::Structured => Self::Structured(StructuredValue::default()),
        }
    }

    /// Kind of this value
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Scalar(_) => FieldKind::Scalar,
            Self::Structured(_) => FieldKind::Structured,
        }
    }

    /// Canonical string: the scalar itself or the formatted address
    #[inline]
    #[must_use]
    pub fn canonical(&self) -> &str {
        match self {
            Self::Scalar(value) => value,
            Self::Structured(value) => &value.formatted,
        }
    }

    /// True when the canonical string is empty after trimming
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.canonical().trim().is_empty()
    }

    /// Trim the canonical string, keeping raw components untouched
    #[must_use]
    pub fn canonicalized(self) -> Self {
        match self {
            Self::Scalar(value) => Self::Scalar(value.trim().to_string()),
            Self::Structured(mut value) => {
                value.formatted = value.formatted.trim().to_string();
                Self::Structured(value)
            }
        }
    }

    /// Coerce into the given kind
    ///
    /// A scalar becomes a structured value whose formatted string is the
    /// scalar; a structured value becomes its formatted string.
    #[must_use]
    pub fn into_kind(self, kind: FieldKind) -> Self {
        match (self, kind) {
            (Self::Scalar(value), FieldKind::Structured) => Self::structured(value),
            (Self::Structured(value), FieldKind::Scalar) => Self::Scalar(value.formatted),
            (field, _) => field,
        }
    }

    /// String stored in a session cache
    ///
    /// Scalars are stored verbatim, structured values as a JSON object.
    #[must_use]
    pub fn to_cache_string(&self) -> String {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::Structured(value) => {
                serde_json::to_string(value).unwrap_or_else(|_| value.formatted.clone())
            }
        }
    }

    /// Decode a cached string for a field of the given kind
    ///
    /// A JSON object decodes to a structured value (a missing `formatted`
    /// member reads as empty); any other string for a structured field is
    /// taken as its formatted representation.
    #[must_use]
    pub fn from_cache_string(kind: FieldKind, raw: &str) -> Self {
        match kind {
            FieldKind::Scalar => Self::Scalar(raw.to_string()),
            FieldKind::Structured => match serde_json::from_str::<StructuredValue>(raw) {
                Ok(value) => Self::Structured(value),
                Err(_) => Self::structured(raw),
            },
        }
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::Scalar(String::new())
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::scalar(value)
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<StructuredValue> for Field {
    fn from(value: StructuredValue) -> Self {
        Self::Structured(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn address() -> StructuredValue {
        StructuredValue::new("  1 Queen St, Auckland  ")
            .with_component("city", "Auckland")
            .with_component("postalCode", "1010")
    }

    #[test]
    fn canonical_of_structured_is_formatted() {
        let field = Field::from(address());
        assert_eq!(field.canonical(), "  1 Queen St, Auckland  ");
        assert_eq!(field.kind(), FieldKind::Structured);
    }

    #[test]
    fn canonicalized_trims_only_formatted() {
        let Field::Structured(value) = Field::from(address()).canonicalized() else {
            panic!("expected structured value");
        };
        assert_eq!(value.formatted, "1 Queen St, Auckland");
        assert_eq!(value.raw.get("city").map(String::as_str), Some("Auckland"));
    }

    #[test]
    fn blank_checks_canonical_string() {
        assert!(Field::scalar("   ").is_blank());
        assert!(Field::empty(FieldKind::Structured).is_blank());
        assert!(!Field::scalar(" x ").is_blank());
        let components_only = StructuredValue::new("").with_component("city", "Auckland");
        assert!(Field::from(components_only).is_blank());
    }

    #[test]
    fn structured_cache_string_is_json() {
        let field = Field::from(address()).canonicalized();
        let cached = field.to_cache_string();
        assert!(cached.starts_with('{'));
        assert_eq!(Field::from_cache_string(FieldKind::Structured, &cached), field);
    }

    #[test]
    fn plain_cache_string_for_structured_field() {
        let field = Field::from_cache_string(FieldKind::Structured, "1 Queen St");
        assert_eq!(field, Field::structured("1 Queen St"));
    }

    #[test]
    fn empty_json_object_is_blank_structured() {
        let field = Field::from_cache_string(FieldKind::Structured, "{}");
        assert_eq!(field, Field::empty(FieldKind::Structured));
        assert!(field.is_blank());
    }

    #[test]
    fn scalar_cache_string_is_verbatim() {
        let field = Field::from_cache_string(FieldKind::Scalar, "{\"formatted\":\"x\"}");
        assert_eq!(field, Field::scalar("{\"formatted\":\"x\"}"));
    }

    #[test]
    fn untagged_serialization() {
        let json = serde_json::to_value(Field::scalar("Ada")).unwrap();
        assert_eq!(json, serde_json::json!("Ada"));

        let json = serde_json::to_value(Field::from(address())).unwrap();
        assert_eq!(json["formatted"], "  1 Queen St, Auckland  ");
        assert_eq!(json["postalCode"], "1010");

        let back: Field = serde_json::from_value(json).unwrap();
        assert_eq!(back, Field::from(address()));
    }

    #[test]
    fn into_kind_coerces() {
        assert_eq!(
            Field::scalar("1 Queen St").into_kind(FieldKind::Structured),
            Field::structured("1 Queen St")
        );
        assert_eq!(
            Field::from(address()).into_kind(FieldKind::Scalar),
            Field::scalar("  1 Queen St, Auckland  ")
        );
    }

    proptest! {
        #[test]
        fn blank_iff_trimmed_empty(s in "\\PC{0,16}") {
            prop_assert_eq!(Field::scalar(s.clone()).is_blank(), s.trim().is_empty());
            prop_assert_eq!(Field::structured(s.clone()).is_blank(), s.trim().is_empty());
        }
    }
}
