//! Filter stages: the listing predicate and category restriction.

use std::collections::HashSet;

use crate::Category;

use super::{ListedProduct, ListingQuery, PriceRange};

/// Predicate applied to every joined product.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ListingFilter {
    pub price: Option<PriceRange>,
    pub min_rating: f64,
}

impl ListingFilter {
    pub fn from_query(query: &ListingQuery) -> Self {
        Self {
            price: query.price,
            min_rating: query.min_rating,
        }
    }

    pub fn matches(&self, listed: &ListedProduct) -> bool {
        if !listed.product.is_active {
            return false;
        }
        if let Some(range) = self.price {
            if !range.contains(listed.product.price) {
                return false;
            }
        }
        listed.average_rating >= self.min_rating
    }
}

/// Find the active category with the given slug.
pub fn resolve_category<'a>(slug: &str, categories: &'a [Category]) -> Option<&'a Category> {
    categories.iter().find(|c| c.is_active && c.slug == slug)
}

/// Keep only products in the category's product set. No category means no
/// matches: an unresolvable slug is not an error.
pub fn restrict_to_category(products: Vec<ListedProduct>, category: Option<&Category>) -> Vec<ListedProduct> {
    let Some(category) = category else {
        return Vec::new();
    };
    let members: HashSet<_> = category.products.iter().copied().collect();
    products
        .into_iter()
        .filter(|p| members.contains(&p.product.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::listing::fixtures::*;
    use crate::listing::join;

    fn listed(price: Decimal, active: bool) -> ListedProduct {
        let b = brand(true);
        let mut p = product(1, price, Some(&b));
        p.is_active = active;
        let views = join::join_brands(vec![p], &[b]);
        join::attach_review_stats(views, &Default::default()).remove(0)
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let filter = ListingFilter {
            price: PriceRange::from_bounds(Some(Decimal::new(10, 0)), Some(Decimal::new(20, 0))),
            min_rating: 0.0,
        };
        assert!(filter.matches(&listed(Decimal::new(10, 0), true)));
        assert!(filter.matches(&listed(Decimal::new(20, 0), true)));
        assert!(!filter.matches(&listed(Decimal::new(2001, 2), true)));
    }

    #[test]
    fn inactive_products_never_match() {
        let filter = ListingFilter { price: None, min_rating: 0.0 };
        assert!(!filter.matches(&listed(Decimal::ONE, false)));
    }

    #[test]
    fn resolve_ignores_inactive_categories() {
        let cats = vec![category("a", false, &[]), category("b", true, &[])];
        assert!(resolve_category("a", &cats).is_none());
        assert_eq!(resolve_category("b", &cats).unwrap().slug, "b");
    }
}
