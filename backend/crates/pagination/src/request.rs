//! Page-number requests and neighbour link construction.

use url::Url;

/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

const PAGE_PARAM: &str = "page";
const PAGE_SIZE_PARAM: &str = "page_size";

/// Validation failures for [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// Page numbers start at 1.
    #[error("page must be at least 1")]
    InvalidPage,
    /// Page size is outside `1..=MAX_PAGE_SIZE`.
    #[error("page_size must be between 1 and {max}")]
    InvalidPageSize {
        /// Upper bound accepted for page sizes.
        max: u32,
    },
}

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

/// Absolute neighbour links for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// Link to the following page.
    pub next: Option<String>,
    /// Link to the preceding page.
    pub previous: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Validate optional query values, applying defaults for missing ones.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when the page is zero or the page size is
    /// outside `1..=MAX_PAGE_SIZE`.
    ///
    /// # Examples
    /// ```
    /// use pagination::{PageRequest, PageRequestError, DEFAULT_PAGE_SIZE};
    ///
    /// let request = PageRequest::new(None, None).expect("defaults are valid");
    /// assert_eq!(request.page(), 1);
    /// assert_eq!(request.page_size(), DEFAULT_PAGE_SIZE);
    /// assert_eq!(PageRequest::new(Some(0), None), Err(PageRequestError::InvalidPage));
    /// ```
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Result<Self, PageRequestError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(PageRequestError::InvalidPage);
        }
        let size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(PageRequestError::InvalidPageSize { max: MAX_PAGE_SIZE });
        }
        Ok(Self {
            page,
            page_size: size,
        })
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Requested number of records per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of records preceding this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)).saturating_mul(u64::from(self.page_size))
    }

    /// Maximum number of records on this page.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Build neighbour links relative to `base`, preserving unrelated query
    /// parameters.
    #[must_use]
    pub fn links(&self, base: &Url, total: u64) -> PageLinks {
        let has_next = self.offset().saturating_add(self.limit()) < total;
        let has_previous = self.page > 1;
        PageLinks {
            next: has_next.then(|| self.link_to(base, self.page.saturating_add(1))),
            previous: has_previous.then(|| self.link_to(base, self.page.saturating_sub(1))),
        }
    }

    fn link_to(&self, base: &Url, page: u32) -> String {
        let retained: Vec<(String, String)> = base
            .query_pairs()
            .filter(|(key, _)| key != PAGE_PARAM && key != PAGE_SIZE_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut link = base.clone();
        link.set_query(None);
        {
            let mut pairs = link.query_pairs_mut();
            for (key, value) in &retained {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(PAGE_PARAM, &page.to_string());
            pairs.append_pair(PAGE_SIZE_PARAM, &self.page_size.to_string());
        }
        link.into()
    }
}

#[cfg(test)]
mod tests {
    //! Page request validation and link construction.

    use super::*;
    use rstest::rstest;

    fn base() -> Url {
        Url::parse("http://localhost:8080/api/v1/characters?ordering=name&page=9")
            .expect("valid url")
    }

    #[rstest]
    #[case::zero_size(Some(1), Some(0))]
    #[case::oversized(Some(1), Some(MAX_PAGE_SIZE + 1))]
    fn rejects_out_of_range_sizes(#[case] page: Option<u32>, #[case] size: Option<u32>) {
        assert_eq!(
            PageRequest::new(page, size),
            Err(PageRequestError::InvalidPageSize { max: MAX_PAGE_SIZE })
        );
    }

    #[rstest]
    fn offset_follows_page_number() {
        let request = PageRequest::new(Some(3), Some(20)).expect("valid");
        assert_eq!(request.offset(), 40);
        assert_eq!(request.limit(), 20);
    }

    #[rstest]
    fn middle_page_links_both_ways_and_keeps_other_params() {
        let request = PageRequest::new(Some(2), Some(5)).expect("valid");

        let links = request.links(&base(), 12);

        assert_eq!(
            links.next.as_deref(),
            Some("http://localhost:8080/api/v1/characters?ordering=name&page=3&page_size=5")
        );
        assert_eq!(
            links.previous.as_deref(),
            Some("http://localhost:8080/api/v1/characters?ordering=name&page=1&page_size=5")
        );
    }

    #[rstest]
    fn last_page_has_no_next_link() {
        let request = PageRequest::new(Some(3), Some(5)).expect("valid");

        let links = request.links(&base(), 12);

        assert!(links.next.is_none());
        assert!(links.previous.is_some());
    }
}
