//! Filter and sort engine over the product catalog.
//!
//! Filtering is a pure predicate over each product; sorting is stable so
//! ties keep catalog order. A [`CatalogQuery`] always filters first and
//! sorts second.

use std::collections::BTreeSet;
use std::str::FromStr;

use maison_core::{Category, Gender, Money, ParseEnumError, Product};

use super::Catalog;

/// An inclusive price range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Money,
    pub max: Money,
}

impl PriceRange {
    #[must_use]
    pub const fn new(min: Money, max: Money) -> Self {
        Self { min, max }
    }

    /// Whether `price` lies within the range, bounds included.
    #[must_use]
    pub fn contains(&self, price: Money) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Optional constraints narrowing a product list.
///
/// `None` (or an empty set) for a criterion imposes no restriction. Colors,
/// sizes and tags are compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub categories: Option<BTreeSet<Category>>,
    pub genders: Option<BTreeSet<Gender>>,
    pub price: Option<PriceRange>,
    pub colors: Option<BTreeSet<String>>,
    pub sizes: Option<BTreeSet<String>>,
    pub tags: Option<BTreeSet<String>>,
}

impl ProductFilter {
    /// A filter that lets everything through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    #[must_use]
    pub fn genders(mut self, genders: impl IntoIterator<Item = Gender>) -> Self {
        self.genders = Some(genders.into_iter().collect());
        self
    }

    #[must_use]
    pub const fn price(mut self, range: PriceRange) -> Self {
        self.price = Some(range);
        self
    }

    #[must_use]
    pub fn colors<S: AsRef<str>>(mut self, colors: impl IntoIterator<Item = S>) -> Self {
        self.colors = Some(normalise(colors));
        self
    }

    #[must_use]
    pub fn sizes<S: AsRef<str>>(mut self, sizes: impl IntoIterator<Item = S>) -> Self {
        self.sizes = Some(normalise(sizes));
        self
    }

    #[must_use]
    pub fn tags<S: AsRef<str>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = Some(normalise(tags));
        self
    }

    /// Whether `product` satisfies every present criterion.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(categories) = active(self.categories.as_ref())
            && !categories.contains(&product.category)
        {
            return false;
        }

        if let Some(genders) = self.gender_criterion() {
            let gender = product.effective_gender();
            if gender != Gender::Unisex && !genders.contains(&gender) {
                return false;
            }
        }

        if let Some(range) = self.price
            && !range.contains(product.price)
        {
            return false;
        }

        intersects(self.colors.as_ref(), &product.colors)
            && intersects(self.sizes.as_ref(), &product.sizes)
            && intersects(self.tags.as_ref(), &product.tags)
    }

    // Choosing unisex lifts the gender restriction entirely.
    fn gender_criterion(&self) -> Option<&BTreeSet<Gender>> {
        active(self.genders.as_ref()).filter(|genders| !genders.contains(&Gender::Unisex))
    }

    /// Whether no criterion is active.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        active(self.categories.as_ref()).is_none()
            && self.gender_criterion().is_none()
            && self.price.is_none()
            && active(self.colors.as_ref()).is_none()
            && active(self.sizes.as_ref()).is_none()
            && active(self.tags.as_ref()).is_none()
    }
}

fn normalise<S: AsRef<str>>(values: impl IntoIterator<Item = S>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

fn active<T>(set: Option<&BTreeSet<T>>) -> Option<&BTreeSet<T>> {
    set.filter(|s| !s.is_empty())
}

// Products that do not list the attribute at all are not excluded.
fn intersects(wanted: Option<&BTreeSet<String>>, have: &[String]) -> bool {
    let Some(wanted) = active(wanted) else {
        return true;
    };
    have.is_empty() || have.iter().any(|v| wanted.contains(&v.to_lowercase()))
}

/// Keep the products matching `filter`, in input order.
#[must_use]
pub fn filter_products<'a>(products: &'a [Product], filter: &ProductFilter) -> Vec<&'a Product> {
    products.iter().filter(|p| filter.matches(p)).collect()
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    PriceAsc,
    PriceDesc,
    /// New arrivals first.
    #[default]
    Newest,
    /// Featured products first.
    Popular,
}

impl SortOption {
    pub const ALL: [Self; 4] = [Self::PriceAsc, Self::PriceDesc, Self::Newest, Self::Popular];

    /// Parse from a listing parameter, falling back to the default order.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "price-asc" | "price_asc" => Self::PriceAsc,
            "price-desc" | "price_desc" => Self::PriceDesc,
            "popular" | "featured" => Self::Popular,
            _ => Self::Newest,
        }
    }

    /// Convert to listing parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Newest => "newest",
            Self::Popular => "popular",
        }
    }

    /// Human label for listing headers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::Newest => "Newest",
            Self::Popular => "Most Popular",
        }
    }
}

/// Stable sort of `products` by `sort`.
pub fn sort_products(products: &mut [&Product], sort: SortOption) {
    match sort {
        SortOption::PriceAsc => products.sort_by_key(|p| p.price),
        SortOption::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
        SortOption::Newest => products.sort_by_key(|p| !p.is_new),
        SortOption::Popular => products.sort_by_key(|p| !p.is_featured),
    }
}

/// A listing page's base product set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Collection {
    #[default]
    All,
    /// A gender page; includes unisex products.
    Gender(Gender),
    Category(Category),
}

impl Collection {
    /// The URL slug for this collection.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Gender(gender) => gender.as_str(),
            Self::Category(category) => category.as_str(),
        }
    }

    #[must_use]
    pub fn contains(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Gender(gender) => {
                let own = product.effective_gender();
                own == *gender || own == Gender::Unisex
            }
            Self::Category(category) => product.category == *category,
        }
    }
}

impl FromStr for Collection {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.trim();
        if slug.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if let Ok(gender @ (Gender::Men | Gender::Women)) = slug.parse::<Gender>() {
            return Ok(Self::Gender(gender));
        }
        slug.parse::<Category>()
            .map(Self::Category)
            .map_err(|_| ParseEnumError {
                kind: "collection",
                value: s.to_owned(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Scope {
    #[default]
    Everything,
    Only(Collection),
    Nothing,
}

/// Builder for a catalog listing: scope, search text, filter, then sort.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    scope: Scope,
    search: Option<String>,
    filter: ProductFilter,
    sort: SortOption,
}

impl CatalogQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn collection(mut self, collection: Collection) -> Self {
        self.scope = Scope::Only(collection);
        self
    }

    /// Scope to the collection named by a page slug. An unknown slug yields
    /// an empty listing.
    #[must_use]
    pub fn collection_slug(mut self, slug: &str) -> Self {
        self.scope = slug.parse().map_or(Scope::Nothing, Scope::Only);
        self
    }

    /// Restrict to one category; `"all"` leaves the category unconstrained.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown category name.
    pub fn category_choice(mut self, choice: &str) -> Result<Self, ParseEnumError> {
        if !choice.trim().eq_ignore_ascii_case("all") {
            self.filter = self.filter.categories([choice.parse()?]);
        }
        Ok(self)
    }

    /// Restrict to one gender; `"all"` leaves the gender unconstrained.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown gender name.
    pub fn gender_choice(mut self, choice: &str) -> Result<Self, ParseEnumError> {
        if !choice.trim().eq_ignore_ascii_case("all") {
            self.filter = self.filter.genders([choice.parse()?]);
        }
        Ok(self)
    }

    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: ProductFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn sort(mut self, sort: SortOption) -> Self {
        self.sort = sort;
        self
    }

    /// Run the query against `catalog`.
    #[must_use]
    pub fn run<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Product> {
        let base: Vec<&Product> = match (&self.scope, &self.search) {
            (Scope::Nothing, _) => return Vec::new(),
            (_, Some(text)) => catalog.search(text),
            _ => catalog.products().iter().collect(),
        };

        let mut results: Vec<&Product> = base
            .into_iter()
            .filter(|p| match self.scope {
                Scope::Only(collection) => collection.contains(p),
                _ => true,
            })
            .filter(|p| self.filter.matches(p))
            .collect();

        sort_products(&mut results, self.sort);
        results
    }
}

/// Whether the lowercase `needle` occurs in the product's name, description
/// or any tag.
pub(crate) fn matches_text(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
        || product.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything_in_order() {
        let catalog = catalog();
        let filter = ProductFilter::new();
        assert!(filter.is_unrestricted());

        let result = filter_products(catalog.products(), &filter);
        let all: Vec<&Product> = catalog.products().iter().collect();
        assert_eq!(ids(&result), ids(&all));
    }

    #[test]
    fn test_category_filter() {
        let catalog = catalog();
        let filter = ProductFilter::new().categories([Category::Bags]);
        let result = filter_products(catalog.products(), &filter);
        assert!(!result.is_empty());
        assert!(result.iter().all(|p| p.category == Category::Bags));
    }

    #[test]
    fn test_empty_set_is_no_constraint() {
        let catalog = catalog();
        let filter = ProductFilter::new().categories([]);
        assert!(filter.is_unrestricted());
        assert_eq!(
            filter_products(catalog.products(), &filter).len(),
            catalog.len()
        );
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let catalog = catalog();
        let filter = ProductFilter::new().price(PriceRange::new(
            Money::ZERO,
            Money::from_major(1000),
        ));
        let result = filter_products(catalog.products(), &filter);
        assert!(!result.is_empty());
        assert!(result.iter().all(|p| p.price <= Money::from_major(1000)));

        let exact = ProductFilter::new().price(PriceRange::new(
            Money::from_major(2800),
            Money::from_major(2800),
        ));
        assert_eq!(ids(&filter_products(catalog.products(), &exact)), vec!["1"]);
    }

    #[test]
    fn test_unisex_passes_any_gender() {
        let catalog = catalog();
        let filter = ProductFilter::new().genders([Gender::Women]);
        let result = filter_products(catalog.products(), &filter);
        assert!(result.iter().any(|p| p.effective_gender() == Gender::Unisex));
        assert!(result.iter().all(|p| p.effective_gender() != Gender::Men));
    }

    #[test]
    fn test_unisex_choice_does_not_restrict_gender() {
        let catalog = catalog();
        for genders in [vec![Gender::Unisex], vec![Gender::Men, Gender::Unisex]] {
            let filter = ProductFilter::new().genders(genders);
            assert!(filter.is_unrestricted());
            assert_eq!(filter_products(catalog.products(), &filter).len(), 11);
        }
    }

    #[test]
    fn test_products_without_sizes_pass_size_filter() {
        let catalog = catalog();
        let filter = ProductFilter::new().sizes(["XS"]);
        let result = filter_products(catalog.products(), &filter);
        // bags list no sizes
        assert!(result.iter().any(|p| p.category == Category::Bags));
        // loafers list sizes, none of them XS
        assert!(result.iter().all(|p| p.id.as_str() != "3"));
    }

    #[test]
    fn test_color_and_tag_filters_ignore_case() {
        let catalog = catalog();
        let filter = ProductFilter::new().colors(["Beige"]).tags(["WOOL"]);
        let result = filter_products(catalog.products(), &filter);
        assert_eq!(ids(&result), vec!["1", "7"]);
    }

    #[test]
    fn test_price_sorts_are_monotonic() {
        let catalog = catalog();
        let mut products: Vec<&Product> = catalog.products().iter().collect();

        sort_products(&mut products, SortOption::PriceAsc);
        assert!(products.windows(2).all(|w| w[0].price <= w[1].price));

        sort_products(&mut products, SortOption::PriceDesc);
        assert!(products.windows(2).all(|w| w[0].price >= w[1].price));
    }

    #[test]
    fn test_newest_is_a_stable_partition() {
        let catalog = catalog();
        let mut products: Vec<&Product> = catalog.products().iter().collect();
        sort_products(&mut products, SortOption::Newest);

        let split = products.iter().position(|p| !p.is_new).unwrap();
        assert!(products[..split].iter().all(|p| p.is_new));
        assert!(products[split..].iter().all(|p| !p.is_new));
        assert_eq!(ids(&products[..split]), vec!["1", "4", "8", "11", "12"]);
    }

    #[test]
    fn test_popular_puts_featured_first() {
        let catalog = catalog();
        let mut products: Vec<&Product> = catalog.products().iter().collect();
        sort_products(&mut products, SortOption::Popular);
        let featured = catalog.featured().count();
        assert!(products[..featured].iter().all(|p| p.is_featured));
        assert!(products[featured..].iter().all(|p| !p.is_featured));
    }

    #[test]
    fn test_sort_option_parse_and_as_str() {
        for option in SortOption::ALL {
            assert_eq!(SortOption::parse(option.as_str()), option);
        }
        assert_eq!(SortOption::parse("bogus"), SortOption::Newest);
    }

    #[test]
    fn test_collection_slugs() {
        assert_eq!("all".parse::<Collection>().unwrap(), Collection::All);
        assert_eq!(
            "men".parse::<Collection>().unwrap(),
            Collection::Gender(Gender::Men)
        );
        assert_eq!(
            "shoes".parse::<Collection>().unwrap(),
            Collection::Category(Category::Shoes)
        );
        assert!("unisex".parse::<Collection>().is_err());
        assert!("sale".parse::<Collection>().is_err());
    }

    #[test]
    fn test_query_filters_then_sorts() {
        let catalog = catalog();
        let results = CatalogQuery::new()
            .collection(Collection::Gender(Gender::Men))
            .filter(ProductFilter::new().categories([Category::Clothing]))
            .sort(SortOption::PriceAsc)
            .run(&catalog);
        assert_eq!(ids(&results), vec!["9", "4", "11"]);
    }

    #[test]
    fn test_query_unknown_slug_is_empty() {
        let catalog = catalog();
        assert!(
            CatalogQuery::new()
                .collection_slug("clearance")
                .run(&catalog)
                .is_empty()
        );
    }

    #[test]
    fn test_query_all_choice_is_wildcard() {
        let catalog = catalog();
        let results = CatalogQuery::new()
            .category_choice("all")
            .unwrap()
            .gender_choice("all")
            .unwrap()
            .run(&catalog);
        assert_eq!(results.len(), catalog.len());
        assert!(CatalogQuery::new().category_choice("hats").is_err());
    }

    #[test]
    fn test_query_with_search_text() {
        let catalog = catalog();
        let results = CatalogQuery::new()
            .search("bag")
            .sort(SortOption::PriceDesc)
            .run(&catalog);
        assert_eq!(ids(&results), vec!["8", "2", "10"]);
    }
}
