//! Shared validation helpers for inbound HTTP adapters.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::domain::{Error, ExternalId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidDate,
    InvalidPage,
    InvalidExternalId,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidDate => "invalid_date",
            ErrorCode::InvalidPage => "invalid_page",
            ErrorCode::InvalidExternalId => "invalid_external_id",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("missing required field: {field}")).with_details(json!({
        "field": field,
        "code": ErrorCode::MissingField.as_str(),
    }))
}

pub(crate) fn invalid_page_error(field: FieldName, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": ErrorCode::InvalidPage.as_str(),
    }))
}

/// Parse a `YYYY-MM-DD` calendar date.
pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        let field = field.as_str();
        Error::invalid_request(format!("{field} must be a date in YYYY-MM-DD format"))
            .with_details(json!({
                "field": field,
                "value": value,
                "code": ErrorCode::InvalidDate.as_str(),
            }))
    })
}

pub(crate) fn parse_optional_date(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<NaiveDate>, Error> {
    value.map(|raw| parse_date(&raw, field)).transpose()
}

/// Validate a catalogue identity; zero marks a locally authored record.
pub(crate) fn parse_external_id(value: i64, field: FieldName) -> Result<ExternalId, Error> {
    if value < 0 {
        let field = field.as_str();
        return Err(
            Error::invalid_request(format!("{field} must not be negative")).with_details(json!({
                "field": field,
                "value": value,
                "code": ErrorCode::InvalidExternalId.as_str(),
            })),
        );
    }
    Ok(ExternalId::new(value))
}

/// Require a string field that may be absent from the payload.
pub(crate) fn require_field(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Keep `null` distinct from an absent field.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`: an absent
/// field stays `None`, `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
