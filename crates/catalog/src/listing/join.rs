//! Join stages: brand, review statistics, viewer wishlist.

use std::collections::HashMap;

use storefront_core::{BrandId, ProductId, UserId};

use crate::{Brand, BrandSummary, Product, ProductView, Review, WishlistEntry};

use super::ListedProduct;

/// Attach each product's brand. Products whose brand is missing or inactive
/// are dropped.
pub fn join_brands(products: Vec<Product>, brands: &[Brand]) -> Vec<ProductView> {
    let active: HashMap<BrandId, BrandSummary> = brands
        .iter()
        .filter(|b| b.is_active)
        .map(|b| (b.id, b.summary()))
        .collect();

    products
        .into_iter()
        .filter_map(|product| {
            let brand = product.brand.and_then(|id| active.get(&id)).cloned()?;
            Some(ProductView::new(product, Some(brand)))
        })
        .collect()
}

/// Per-product review aggregate.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ReviewStats {
    pub total_ratings: f64,
    pub total_reviews: u64,
}

impl ReviewStats {
    /// Aggregate reviews by product.
    pub fn index(reviews: &[Review]) -> HashMap<ProductId, ReviewStats> {
        let mut out: HashMap<ProductId, ReviewStats> = HashMap::new();
        for review in reviews {
            let entry = out.entry(review.product).or_default();
            entry.total_ratings += review.rating;
            entry.total_reviews += 1;
        }
        out
    }

    /// Mean rating, or 0 when there are no reviews.
    pub fn average_rating(&self) -> f64 {
        if self.total_reviews == 0 {
            0.0
        } else {
            self.total_ratings / self.total_reviews as f64
        }
    }
}

pub fn attach_review_stats(
    products: Vec<ProductView>,
    stats: &HashMap<ProductId, ReviewStats>,
) -> Vec<ListedProduct> {
    products
        .into_iter()
        .map(|product| {
            let s = stats.get(&product.id).copied().unwrap_or_default();
            ListedProduct {
                product,
                total_ratings: s.total_ratings,
                total_reviews: s.total_reviews,
                average_rating: s.average_rating(),
            }
        })
        .collect()
}

/// Liked state per product for one viewer. Products without an entry are absent.
pub fn viewer_likes(viewer: UserId, wishlist: &[WishlistEntry]) -> HashMap<ProductId, bool> {
    wishlist
        .iter()
        .filter(|w| w.user == viewer)
        .map(|w| (w.product, w.is_liked))
        .collect()
}

/// Set `isLiked` on every product for the given viewer (false without an entry).
pub fn annotate_wishlist(products: &mut [ListedProduct], viewer: UserId, wishlist: &[WishlistEntry]) {
    let likes = viewer_likes(viewer, wishlist);
    for listed in products.iter_mut() {
        listed.product.is_liked = Some(likes.get(&listed.product.id).copied().unwrap_or(false));
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::listing::fixtures::*;

    #[test]
    fn average_is_zero_without_reviews() {
        assert_eq!(ReviewStats::default().average_rating(), 0.0);
    }

    #[test]
    fn index_sums_and_counts_per_product() {
        let b = brand(true);
        let a = product(1, Decimal::ONE, Some(&b));
        let c = product(2, Decimal::ONE, Some(&b));
        let stats = ReviewStats::index(&[review(&a, 3.0), review(&a, 4.0), review(&c, 5.0)]);

        assert_eq!(stats[&a.id].total_reviews, 2);
        assert_eq!(stats[&a.id].total_ratings, 7.0);
        assert_eq!(stats[&a.id].average_rating(), 3.5);
        assert_eq!(stats[&c.id].average_rating(), 5.0);
    }

    #[test]
    fn join_keeps_brand_summary() {
        let b = brand(true);
        let p = product(1, Decimal::ONE, Some(&b));
        let joined = join_brands(vec![p], std::slice::from_ref(&b));
        assert_eq!(joined[0].brand.as_ref().unwrap().name, b.name);
    }
}
