//! Lazy traversal of one paginated catalogue collection.

use std::collections::HashSet;
use std::marker::PhantomData;

use tracing::{debug, warn};

use super::CatalogueClient;
use crate::domain::ports::{CatalogueRecord, CatalogueSourceError};

/// Follows `next` links through one collection, one page at a time.
///
/// The traversal ends when a page has no `next`, when the catalogue answers
/// 404, or when a `next` link points at a page already read. A fresh pager
/// restarts from the first page.
pub struct CataloguePager<'a, R> {
    client: &'a CatalogueClient,
    next_url: Option<String>,
    visited: HashSet<String>,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: CatalogueRecord> CataloguePager<'a, R> {
    pub(super) fn new(client: &'a CatalogueClient, first_url: String) -> Self {
        Self {
            client,
            next_url: Some(first_url),
            visited: HashSet::new(),
            _record: PhantomData,
        }
    }

    /// Read the next page; `Ok(None)` once the traversal has ended.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`CatalogueSourceError`] once retries are exhausted or
    /// the failure is not retryable. The pager is finished afterwards.
    pub async fn next_page(&mut self) -> Result<Option<Vec<R>>, CatalogueSourceError> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };
        if !self.visited.insert(url.clone()) {
            warn!(url = %url, "catalogue paging revisited a page; stopping");
            return Ok(None);
        }

        let source = self.client.source();
        let page = self
            .client
            .with_retry(|| R::fetch_page(source, &url))
            .await?;
        let Some(page) = page else {
            debug!(url = %url, "catalogue page not found; ending traversal");
            return Ok(None);
        };

        debug!(
            url = %url,
            records = page.results.len(),
            has_next = page.next.is_some(),
            "fetched catalogue page"
        );
        self.next_url = page.next;
        Ok(Some(page.results))
    }
}
