//! Shared helpers for the Diesel catalogue repositories.

use std::collections::HashMap;

use pagination::PageRequest;

use crate::domain::ports::CatalogueRepositoryError;

/// `LIMIT` and `OFFSET` values for a page request.
pub(crate) fn page_bounds(page: PageRequest) -> Result<(i64, i64), CatalogueRepositoryError> {
    let limit = i64::try_from(page.limit())
        .map_err(|_| CatalogueRepositoryError::query("page size exceeds i64 range"))?;
    let offset = i64::try_from(page.offset())
        .map_err(|_| CatalogueRepositoryError::query("page offset exceeds i64 range"))?;
    Ok((limit, offset))
}

/// Convert a `COUNT(*)` result into a listing total.
pub(crate) fn total_from_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// Build an `ILIKE` pattern matching `fragment` anywhere in the value.
///
/// `%`, `_` and `\` in the fragment are escaped so they match literally.
pub(crate) fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Sort and deduplicate raw ids before writing relationship rows.
pub(crate) fn unique_raw_ids<T: Copy>(ids: &[T], raw: impl Fn(T) -> i64) -> Vec<i64> {
    let mut values: Vec<i64> = ids.iter().copied().map(raw).collect();
    values.sort_unstable();
    values.dedup();
    values
}

/// Group `(owner, target)` link pairs by owner, keeping target order.
pub(crate) fn group_links<T>(
    pairs: Vec<(i64, i64)>,
    wrap: impl Fn(i64) -> T,
) -> HashMap<i64, Vec<T>> {
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    for (owner, target) in pairs {
        grouped.entry(owner).or_default().push(wrap(target));
    }
    grouped
}
