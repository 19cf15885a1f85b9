//! Deactivation cascade.
//!
//! Turning a brand or category off hides the products it governs. These
//! helpers compute which products must be deactivated; storage applies the
//! update as one batch.

use storefront_core::{BrandId, ProductId};

use crate::{Category, Product};

/// All products of the brand, active or not.
pub fn products_of_brand(brand: BrandId, products: &[Product]) -> Vec<ProductId> {
    products
        .iter()
        .filter(|p| p.brand == Some(brand))
        .map(|p| p.id)
        .collect()
}

/// Products referenced by the category.
///
/// An already-inactive category has nothing to cascade.
pub fn products_of_category(category: &Category) -> Vec<ProductId> {
    if !category.is_active {
        return Vec::new();
    }
    category.products.clone()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::listing::fixtures::*;

    #[test]
    fn brand_cascade_targets_only_its_products() {
        let a = brand(true);
        let b = brand(true);
        let pa = product(1, Decimal::ONE, Some(&a));
        let pb = product(2, Decimal::ONE, Some(&b));
        assert_eq!(products_of_brand(a.id, &[pa.clone(), pb]), vec![pa.id]);
    }

    #[test]
    fn inactive_category_has_nothing_to_cascade() {
        let b = brand(true);
        let p = product(1, Decimal::ONE, Some(&b));
        assert_eq!(products_of_category(&category("c", true, &[&p])), vec![p.id]);
        assert!(products_of_category(&category("c", false, &[&p])).is_empty());
    }
}
