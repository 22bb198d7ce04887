//! Page query parameters and the response envelope for collection endpoints.

use actix_web::HttpRequest;
use pagination::{Page, PageRequest, PageRequestError};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::{IntoParams, ToSchema};

use crate::domain::Error;
use crate::domain::ports::RecordSlice;

use super::validation::{FieldName, invalid_page_error};

/// `page` and `page_size` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// One-based page number.
    #[param(minimum = 1)]
    pub page: Option<u32>,
    /// Records per page, at most 100.
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

impl PageParams {
    /// Validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for a zero page or an out-of-range page size.
    pub fn to_request(self) -> Result<PageRequest, Error> {
        PageRequest::new(self.page, self.page_size).map_err(|error| {
            let field = match error {
                PageRequestError::InvalidPage => FieldName::new("page"),
                PageRequestError::InvalidPageSize { .. } => FieldName::new("page_size"),
            };
            invalid_page_error(field, error.to_string())
        })
    }
}

/// Query parameters of the search endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring matched against names.
    pub name: Option<String>,
    /// One-based page number.
    #[param(minimum = 1)]
    pub page: Option<u32>,
    /// Records per page, at most 100.
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

impl SearchParams {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// OpenAPI shape of the page envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageBody<T> {
    /// Records matching the query across all pages.
    pub count: u64,
    /// Absolute URL of the next page.
    pub next: Option<String>,
    /// Absolute URL of the previous page.
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Absolute URL of the current request as the client addressed it.
fn request_url(req: &HttpRequest) -> Result<Url, Error> {
    let info = req.connection_info();
    let raw = format!("{}://{}{}", info.scheme(), info.host(), req.uri());
    Url::parse(&raw).map_err(|err| Error::internal(format!("invalid request url `{raw}`: {err}")))
}

/// Wrap a store slice in the envelope, converting each record with `f`.
pub fn envelope<T, U>(
    req: &HttpRequest,
    request: &PageRequest,
    slice: RecordSlice<T>,
    f: impl FnMut(T) -> U,
) -> Result<Page<U>, Error> {
    let base = request_url(req)?;
    let results = slice.records.into_iter().map(f).collect();
    Ok(Page::for_request(results, slice.total, request, &base))
}
