//! Catalogue identities.
//!
//! Every persisted entity carries the integer identity the upstream catalogue
//! assigned to it. Zero marks records authored locally; such records never
//! take part in reconciliation or reference resolution.

use serde::{Deserialize, Serialize};

/// Integer identity assigned by the upstream catalogue.
///
/// # Examples
/// ```
/// use starwars_rest::domain::ExternalId;
///
/// assert!(ExternalId::LOCAL.is_local());
/// assert!(!ExternalId::new(4).is_local());
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ExternalId(i64);

impl ExternalId {
    /// Identity of locally authored records.
    pub const LOCAL: Self = Self(0);

    /// Wrap a raw identity.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Return `true` for locally authored records.
    #[must_use]
    pub const fn is_local(self) -> bool {
        self.0 == 0
    }

    /// Return the identity unless it marks a local record.
    #[must_use]
    pub const fn catalogue(self) -> Option<Self> {
        if self.is_local() { None } else { Some(self) }
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure to read a catalogue identity from a resource URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("resource url `{url}` has no trailing numeric identifier")]
pub struct ExternalIdError {
    url: String,
}

impl ExternalIdError {
    /// The URL that failed to parse.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Extract the catalogue identity from a canonical resource URL.
///
/// The identity is the last non-empty path segment, so both
/// `.../films/4/` and `.../films/4` yield `4`. Query strings and fragments
/// are ignored.
///
/// # Errors
///
/// Returns [`ExternalIdError`] when the last segment is not an integer.
///
/// # Examples
/// ```
/// use starwars_rest::domain::{ExternalId, external_id_from_url};
///
/// let id = external_id_from_url("https://swapi.dev/api/films/4/").expect("numeric tail");
/// assert_eq!(id, ExternalId::new(4));
/// assert!(external_id_from_url("https://swapi.dev/api/films/").is_err());
/// ```
pub fn external_id_from_url(url: &str) -> Result<ExternalId, ExternalIdError> {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    path.rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<i64>().ok())
        .filter(|value| *value > 0)
        .map(ExternalId::new)
        .ok_or_else(|| ExternalIdError {
            url: url.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    //! Identifier extraction edge cases.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::trailing_slash("https://swapi.dev/api/films/4/", 4)]
    #[case::no_trailing_slash("https://swapi.dev/api/people/12", 12)]
    #[case::query_string("https://swapi.dev/api/starships/9/?format=json", 9)]
    #[case::relative("/api/films/1/", 1)]
    fn extracts_trailing_segment(#[case] url: &str, #[case] expected: i64) {
        assert_eq!(external_id_from_url(url), Ok(ExternalId::new(expected)));
    }

    #[rstest]
    #[case::collection("https://swapi.dev/api/films/")]
    #[case::word("https://swapi.dev/api/films/schema/")]
    #[case::zero("https://swapi.dev/api/films/0/")]
    #[case::negative("https://swapi.dev/api/films/-3/")]
    #[case::empty("")]
    fn rejects_non_identifier_tails(#[case] url: &str) {
        let error = external_id_from_url(url).expect_err("tail is not an identity");
        assert_eq!(error.url(), url);
    }

    #[rstest]
    fn local_identity_has_no_catalogue_form() {
        assert_eq!(ExternalId::LOCAL.catalogue(), None);
        assert_eq!(ExternalId::new(2).catalogue(), Some(ExternalId::new(2)));
    }
}
