//! Cache key type shared by response cache adapters.
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Key under which one cached response is stored.
///
/// Keys are lowercase SHA-256 hex digests, so adapters can embed them in
/// backend key names without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseCacheKey(String);

impl ResponseCacheKey {
    /// Derive the key for a request path and raw query string.
    ///
    /// Query pairs are sorted first, so `?b=2&a=1` and `?a=1&b=2` share a key.
    ///
    /// # Examples
    /// ```
    /// use starwars_rest::domain::ports::ResponseCacheKey;
    ///
    /// let left = ResponseCacheKey::for_request("/api/v1/films", "page=2&page_size=5");
    /// let right = ResponseCacheKey::for_request("/api/v1/films", "page_size=5&page=2");
    /// assert_eq!(left, right);
    /// assert_eq!(left.as_str().len(), 64);
    /// ```
    pub fn for_request(path: &str, query: &str) -> Self {
        let mut pairs: Vec<&str> = query.split('&').filter(|pair| !pair.is_empty()).collect();
        pairs.sort_unstable();
        let canonical = if pairs.is_empty() {
            path.to_owned()
        } else {
            format!("{path}?{}", pairs.join("&"))
        };
        Self(hex::encode(Sha256::digest(canonical.as_bytes())))
    }

    /// Wrap a previously derived key after checking its shape.
    pub fn new(value: impl Into<String>) -> Result<Self, ResponseCacheKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(ResponseCacheKeyValidationError::Empty);
        }
        if !raw.chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()) {
            return Err(ResponseCacheKeyValidationError::NotHex);
        }
        Ok(Self(raw))
    }

    /// Borrow the underlying key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ResponseCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ResponseCacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validation errors returned when constructing [`ResponseCacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseCacheKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("response cache key must not be empty")]
    Empty,
    /// Key is not a lowercase hex digest.
    #[error("response cache key must be lowercase hex")]
    NotHex,
}

#[cfg(test)]
mod tests {
    //! Validates key derivation and parsing.
    use super::{ResponseCacheKey, ResponseCacheKeyValidationError};
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn cache_key_rejects_blank(#[case] value: &str) {
        let err = ResponseCacheKey::new(value).expect_err("blank keys rejected");
        assert_eq!(err, ResponseCacheKeyValidationError::Empty);
    }

    #[rstest]
    #[case("films:1")]
    #[case("ABCDEF")]
    fn cache_key_rejects_non_hex(#[case] value: &str) {
        let err = ResponseCacheKey::new(value).expect_err("non-hex key rejected");
        assert_eq!(err, ResponseCacheKeyValidationError::NotHex);
    }

    #[rstest]
    fn derived_key_round_trips_through_new() {
        let key = ResponseCacheKey::for_request("/api/v1/films", "");
        let parsed = ResponseCacheKey::new(key.as_str()).expect("derived key is valid");
        assert_eq!(parsed, key);
    }

    #[rstest]
    #[case::different_path("/api/v1/characters", "page=1")]
    #[case::different_query("/api/v1/films", "page=2")]
    fn distinct_requests_get_distinct_keys(#[case] path: &str, #[case] query: &str) {
        let base = ResponseCacheKey::for_request("/api/v1/films", "page=1");
        assert_ne!(ResponseCacheKey::for_request(path, query), base);
    }

    #[rstest]
    fn empty_pairs_are_ignored() {
        assert_eq!(
            ResponseCacheKey::for_request("/api/v1/films", "&page=1&"),
            ResponseCacheKey::for_request("/api/v1/films", "page=1"),
        );
    }
}
