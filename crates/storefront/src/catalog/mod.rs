//! Product catalog.
//!
//! The catalog is static reference data compiled into the binary from
//! `data/catalog.json`. It is validated once on load and never mutated, so
//! a [`Catalog`] can be shared freely behind an `Arc`.

pub mod query;

use std::collections::HashSet;

use maison_core::{Category, Gender, Product, ProductId};

pub use query::{CatalogQuery, Collection, PriceRange, ProductFilter, SortOption};

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

/// Errors raised while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id {0}")]
    DuplicateId(ProductId),
    #[error("product {0} must have a positive price")]
    NonPositivePrice(ProductId),
    #[error("product {0} has no images")]
    MissingImages(ProductId),
}

/// An immutable, validated product collection.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Validate and wrap a product list, keeping its order.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate ids, non-positive prices or products
    /// without images.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(&product.id) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
            if !product.price.is_positive() {
                return Err(CatalogError::NonPositivePrice(product.id.clone()));
            }
            if product.images.is_empty() {
                return Err(CatalogError::MissingImages(product.id.clone()));
            }
        }
        Ok(Self { products })
    }

    /// Parse a catalog from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a product is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(json)?)
    }

    /// The catalog shipped with the storefront.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled data file is invalid.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Every product, in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Products in a category.
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(move |p| p.category == category)
    }

    /// Products for a gender, including unisex ones.
    pub fn by_gender(&self, gender: Gender) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(move |p| {
            let own = p.effective_gender();
            own == gender || own == Gender::Unisex
        })
    }

    /// Featured products for the landing page.
    pub fn featured(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_featured)
    }

    /// Products flagged as new arrivals.
    pub fn new_arrivals(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_new)
    }

    /// Case-insensitive substring search over name, description and tags.
    ///
    /// A blank query matches nothing.
    #[must_use]
    pub fn search(&self, text: &str) -> Vec<&Product> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.products
            .iter()
            .filter(|p| query::matches_text(p, &needle))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use maison_core::Money;

    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.is_empty());

        let jacket = catalog.get(&ProductId::new("1")).unwrap();
        assert_eq!(jacket.name, "Interlocking G Wool Jacket");
        assert_eq!(jacket.price, Money::from_major(2800));
        assert!(catalog.get(&ProductId::new("missing")).is_none());
    }

    #[test]
    fn test_builtin_products_are_valid() {
        let catalog = Catalog::builtin().unwrap();
        for product in catalog.products() {
            assert!(product.price.is_positive(), "{}", product.id);
            assert!(product.primary_image().is_some(), "{}", product.id);
        }
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let json = r#"[
            {"id":"1","name":"a","description":"","price":10,"category":"bags","images":["x"]},
            {"id":"1","name":"b","description":"","price":20,"category":"bags","images":["y"]}
        ]"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(id) if id.as_str() == "1"));
    }

    #[test]
    fn test_invalid_products_are_rejected() {
        let free = r#"[{"id":"1","name":"a","description":"","price":0,"category":"bags","images":["x"]}]"#;
        assert!(matches!(
            Catalog::from_json(free).unwrap_err(),
            CatalogError::NonPositivePrice(_)
        ));

        let bare = r#"[{"id":"1","name":"a","description":"","price":5,"category":"bags","images":[]}]"#;
        assert!(matches!(
            Catalog::from_json(bare).unwrap_err(),
            CatalogError::MissingImages(_)
        ));
    }

    #[test]
    fn test_by_gender_includes_unisex() {
        let catalog = Catalog::builtin().unwrap();
        let men: Vec<_> = catalog.by_gender(Gender::Men).collect();
        assert!(!men.is_empty());
        assert!(
            men.iter()
                .all(|p| matches!(p.effective_gender(), Gender::Men | Gender::Unisex))
        );
        assert!(men.iter().any(|p| p.effective_gender() == Gender::Unisex));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let catalog = Catalog::builtin().unwrap();
        let hits = catalog.search("WOOL");
        assert!(hits.iter().any(|p| p.id.as_str() == "1"));
        assert!(catalog.search("   ").is_empty());
        assert!(catalog.search("zzz-not-a-product").is_empty());
    }
}
