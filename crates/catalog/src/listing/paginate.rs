//! Sort and paginate stage.

use core::cmp::Ordering;

use super::{ListedProduct, ListingPage, SortDirection, SortField, SortOrder, PAGE_SIZE};

/// `ceil(total / PAGE_SIZE)`, 0 for an empty result.
pub fn page_count(total: usize) -> u64 {
    total.div_ceil(PAGE_SIZE) as u64
}

/// Records to skip for a 1-based page number (pages below 1 skip nothing).
pub fn skip_for(page: u32) -> usize {
    let page = page.max(1) as usize;
    PAGE_SIZE.saturating_mul(page - 1)
}

fn compare(a: &ListedProduct, b: &ListedProduct, field: SortField) -> Ordering {
    match field {
        SortField::Price => a.product.price.cmp(&b.product.price),
        SortField::Created => a.product.created.cmp(&b.product.created),
        SortField::Name => a.product.name.cmp(&b.product.name),
        SortField::AverageRating => a.average_rating.total_cmp(&b.average_rating),
        SortField::TotalReviews => a.total_reviews.cmp(&b.total_reviews),
    }
}

fn compare_by(a: &ListedProduct, b: &ListedProduct, order: SortOrder) -> Ordering {
    match order.direction {
        SortDirection::Ascending => compare(a, b, order.field),
        SortDirection::Descending => compare(b, a, order.field),
    }
}

/// Sort in place by each key in turn; no keys means newest first. Remaining
/// ties fall back to product id so page boundaries are stable.
pub fn sort_listed(products: &mut [ListedProduct], keys: &[SortOrder]) {
    let default_keys = [SortOrder::default()];
    let keys = if keys.is_empty() { &default_keys[..] } else { keys };
    products.sort_by(|a, b| {
        keys.iter()
            .fold(Ordering::Equal, |ord, key| ord.then_with(|| compare_by(a, b, *key)))
            .then_with(|| a.product.id.cmp(&b.product.id))
    });
}

/// Count the full filtered set, then sort, skip, and take one page.
pub fn paginate(mut products: Vec<ListedProduct>, keys: &[SortOrder], page: u32) -> ListingPage {
    let total = products.len();
    sort_listed(&mut products, keys);

    let products = products
        .into_iter()
        .skip(skip_for(page))
        .take(PAGE_SIZE)
        .collect();

    ListingPage {
        products,
        page: page.max(1),
        pages_count: page_count(total),
        products_in_total: total as u64,
    }
}
