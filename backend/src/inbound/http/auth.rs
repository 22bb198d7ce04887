//! Authentication helpers used by HTTP handlers.
//!
//! Write handlers take a [`WriteAccess`] argument; extracting it runs the
//! configured [`AccessPolicy`](crate::domain::AccessPolicy) against the request
//! method and its `Authorization: Bearer` credentials.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::Error;

use super::state::HttpState;

const BEARER_PREFIX: &str = "bearer ";

/// Proof that the request passed the write access gate.
#[derive(Debug, Clone, Copy)]
pub struct WriteAccess;

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively; other schemes yield `None`.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?.trim();
    let prefix = value.get(..BEARER_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    value.get(BEARER_PREFIX.len()..).map(str::trim)
}

fn authorize(req: &HttpRequest) -> Result<WriteAccess, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))?;
    state
        .access
        .authorize(req.method().as_str(), bearer_token(req))
        .inspect_err(|error| debug!(code = ?error.code(), path = %req.path(), "write rejected"))?;
    Ok(WriteAccess)
}

impl FromRequest for WriteAccess {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorize(req))
    }
}
