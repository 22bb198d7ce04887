//! Serialisable page envelope.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::request::PageRequest;

/// One page of results with optional links to its neighbours.
///
/// Missing fields decode to their defaults so sparse upstream payloads such
/// as `{"results": []}` are still accepted.
///
/// # Examples
/// ```
/// use pagination::Page;
///
/// let page: Page<u32> = Page::new(vec![1, 2], 2);
/// assert!(page.is_last());
/// assert_eq!(page.results, vec![1, 2]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    /// Total number of records across all pages.
    #[serde(default)]
    pub count: u64,
    /// Absolute URL of the next page, if any.
    #[serde(default)]
    pub next: Option<String>,
    /// Absolute URL of the previous page, if any.
    #[serde(default)]
    pub previous: Option<String>,
    /// Records on this page.
    #[serde(default)]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Build a page without neighbour links.
    #[must_use]
    pub const fn new(results: Vec<T>, count: u64) -> Self {
        Self {
            count,
            next: None,
            previous: None,
            results,
        }
    }

    /// Build a page whose links are derived from `request` against `base`.
    ///
    /// # Examples
    /// ```
    /// use pagination::{Page, PageRequest};
    /// use url::Url;
    ///
    /// let base = Url::parse("http://localhost/api/v1/films").expect("valid url");
    /// let request = PageRequest::new(Some(1), Some(2)).expect("valid request");
    /// let page = Page::for_request(vec!["a", "b"], 3, &request, &base);
    /// assert_eq!(
    ///     page.next.as_deref(),
    ///     Some("http://localhost/api/v1/films?page=2&page_size=2")
    /// );
    /// assert!(page.previous.is_none());
    /// ```
    #[must_use]
    pub fn for_request(results: Vec<T>, count: u64, request: &PageRequest, base: &Url) -> Self {
        let links = request.links(base, count);
        Self {
            count,
            next: links.next,
            previous: links.previous,
            results,
        }
    }

    /// Return `true` when no further page is advertised.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.next.is_none()
    }

    /// Transform every record while keeping count and links.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
