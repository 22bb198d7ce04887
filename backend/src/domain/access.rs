//! Write access policy.
//!
//! Safe methods are open to everyone. Every other method needs a bearer
//! token matching one of the configured API tokens. Tokens are kept only as
//! SHA-256 digests; the plaintext is wiped as soon as it has been hashed.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::Error;

/// Length of a logged token fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Methods that never change state.
pub const SAFE_METHODS: [&str; 3] = ["GET", "HEAD", "OPTIONS"];

/// Method-keyed access gate.
///
/// # Examples
/// ```
/// use starwars_rest::domain::AccessPolicy;
///
/// let policy = AccessPolicy::from_list("alpha, beta");
/// assert!(policy.authorize("GET", None).is_ok());
/// assert!(policy.authorize("POST", Some("beta")).is_ok());
/// assert!(policy.authorize("DELETE", Some("gamma")).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    digests: Vec<[u8; 32]>,
}

impl AccessPolicy {
    /// Build a policy accepting any of `tokens`. Blank tokens are ignored.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let digests = tokens
            .into_iter()
            .map(|token| Zeroizing::new(token.into()))
            .filter(|token| !token.trim().is_empty())
            .map(|token| digest(token.trim()))
            .collect();
        Self { digests }
    }

    /// Build a policy from a comma separated token list.
    pub fn from_list(raw: &str) -> Self {
        Self::from_tokens(raw.split(','))
    }

    /// Whether any token is configured. Without one every write is refused.
    pub fn accepts_writes(&self) -> bool {
        !self.digests.is_empty()
    }

    /// Short fingerprints of the configured tokens, safe to log.
    pub fn fingerprints(&self) -> Vec<String> {
        self.digests
            .iter()
            .map(|digest| hex::encode(&digest[..FINGERPRINT_BYTES]))
            .collect()
    }

    /// Decide whether a request may proceed.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when a write carries no token or an unknown one;
    /// `Forbidden` when writes are disabled because no token is configured.
    pub fn authorize(&self, method: &str, bearer: Option<&str>) -> Result<(), Error> {
        if is_safe_method(method) {
            return Ok(());
        }
        if !self.accepts_writes() {
            return Err(Error::forbidden("write access is disabled"));
        }
        let Some(token) = bearer.map(str::trim).filter(|token| !token.is_empty()) else {
            return Err(Error::unauthorized(
                "authentication credentials were not provided",
            ));
        };
        let candidate = digest(token);
        if self.digests.iter().any(|known| *known == candidate) {
            Ok(())
        } else {
            Err(Error::unauthorized("invalid token"))
        }
    }
}

/// Whether `method` is read-only.
pub fn is_safe_method(method: &str) -> bool {
    SAFE_METHODS
        .iter()
        .any(|safe| safe.eq_ignore_ascii_case(method))
}

fn digest(token: &str) -> [u8; 32] {
    let mut out = [0_u8; 32];
    out.copy_from_slice(&Sha256::digest(token.as_bytes()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case::get("GET")]
    #[case::head("head")]
    #[case::options("OPTIONS")]
    fn safe_methods_need_no_token(#[case] method: &str) {
        assert!(AccessPolicy::default().authorize(method, None).is_ok());
    }

    #[rstest]
    #[case::missing(None, ErrorCode::Unauthorized)]
    #[case::blank(Some("  "), ErrorCode::Unauthorized)]
    #[case::unknown(Some("sith"), ErrorCode::Unauthorized)]
    fn writes_need_a_known_token(#[case] bearer: Option<&str>, #[case] expected: ErrorCode) {
        let policy = AccessPolicy::from_list("jedi");
        let error = policy.authorize("POST", bearer).expect_err("rejected");
        assert_eq!(error.code(), expected);
    }

    #[rstest]
    fn configured_tokens_are_accepted() {
        let policy = AccessPolicy::from_tokens(["jedi", " rebel "]);
        assert!(policy.authorize("PATCH", Some("rebel")).is_ok());
        assert!(policy.authorize("DELETE", Some("jedi")).is_ok());
    }

    #[rstest]
    fn writes_are_forbidden_without_configured_tokens() {
        let policy = AccessPolicy::from_list(" , ");
        assert!(!policy.accepts_writes());
        let error = policy.authorize("PUT", Some("jedi")).expect_err("disabled");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    fn fingerprints_are_short_hex() {
        let fingerprints = AccessPolicy::from_list("jedi").fingerprints();
        assert_eq!(fingerprints.len(), 1);
        assert!(
            fingerprints
                .iter()
                .all(|fp| fp.len() == 16 && fp.chars().all(|c| c.is_ascii_hexdigit()))
        );
    }
}
