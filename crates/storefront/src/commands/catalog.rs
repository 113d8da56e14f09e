//! Catalog browsing.

use clap::Args;
use rust_decimal::Decimal;

use maison_core::{Money, Product, ProductId};
use maison_storefront::catalog::{CatalogQuery, Collection, PriceRange, ProductFilter, SortOption};
use maison_storefront::error::AppError;
use maison_storefront::state::AppState;

#[derive(Debug, Args)]
pub struct ProductsArgs {
    /// Collection: all, men, women, clothing, bags, shoes or accessories
    #[arg(long, default_value = "all")]
    collection: String,

    /// Category filter, or "all"
    #[arg(long, default_value = "all")]
    category: String,

    /// Gender filter, or "all"
    #[arg(long, default_value = "all")]
    gender: String,

    /// Case-insensitive text search over name, description and tags
    #[arg(long)]
    search: Option<String>,

    #[arg(long = "color")]
    colors: Vec<String>,

    #[arg(long = "size")]
    sizes: Vec<String>,

    #[arg(long = "tag")]
    tags: Vec<String>,

    #[arg(long)]
    min_price: Option<Decimal>,

    #[arg(long)]
    max_price: Option<Decimal>,

    /// price-asc, price-desc, newest or popular
    #[arg(long, default_value = "newest")]
    sort: String,

    /// Only featured products
    #[arg(long)]
    featured: bool,

    /// Only new arrivals
    #[arg(long)]
    new_arrivals: bool,
}

impl ProductsArgs {
    fn query(&self) -> Result<CatalogQuery, AppError> {
        let mut filter = ProductFilter::new();
        if !self.colors.is_empty() {
            filter = filter.colors(&self.colors);
        }
        if !self.sizes.is_empty() {
            filter = filter.sizes(&self.sizes);
        }
        if !self.tags.is_empty() {
            filter = filter.tags(&self.tags);
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            let min = self.min_price.unwrap_or(Decimal::ZERO);
            let max = self.max_price.unwrap_or(Decimal::MAX);
            if min > max {
                return Err(AppError::BadRequest(
                    "--min-price must not exceed --max-price".to_string(),
                ));
            }
            filter = filter.price(PriceRange::new(Money::new(min), Money::new(max)));
        }

        let mut query = CatalogQuery::new()
            .collection(self.collection.parse::<Collection>()?)
            .filter(filter)
            .category_choice(&self.category)?
            .gender_choice(&self.gender)?
            .sort(SortOption::parse(&self.sort));
        if let Some(text) = &self.search {
            query = query.search(text.as_str());
        }
        Ok(query)
    }
}

/// List products.
pub fn products(state: &AppState, args: &ProductsArgs) -> Result<(), AppError> {
    let sort = SortOption::parse(&args.sort);
    let results: Vec<&Product> = args
        .query()?
        .run(state.catalog())
        .into_iter()
        .filter(|p| !args.featured || p.is_featured)
        .filter(|p| !args.new_arrivals || p.is_new)
        .collect();

    println!("{} products ({})", results.len(), sort.label());
    for product in results {
        println!("{}", product_line(product));
    }
    Ok(())
}

/// Show one product in full.
pub fn product(state: &AppState, id: &str) -> Result<(), AppError> {
    let product = state
        .catalog()
        .get(&ProductId::new(id))
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    println!("{}", product.name);
    println!("{}", product.price);
    println!();
    println!("{}", product.description);
    println!();
    println!("Category: {}", product.category);
    if let Some(gender) = product.gender {
        println!("Gender:   {gender}");
    }
    if !product.colors.is_empty() {
        println!("Colors:   {}", product.colors.join(", "));
    }
    if !product.sizes.is_empty() {
        println!("Sizes:    {}", product.sizes.join(", "));
    }
    if !product.tags.is_empty() {
        println!("Tags:     {}", product.tags.join(", "));
    }
    if let Some(image) = product.primary_image() {
        println!("Image:    {image}");
    }
    Ok(())
}

fn product_line(product: &Product) -> String {
    let mut badges = Vec::new();
    if product.is_new {
        badges.push("new");
    }
    if product.is_featured {
        badges.push("featured");
    }
    let badges = if badges.is_empty() {
        String::new()
    } else {
        format!("  [{}]", badges.join(", "))
    };
    format!(
        "{:>4}  {:<32} {:>12}  {}{badges}",
        product.id.as_str(),
        product.name,
        product.price.to_string(),
        product.category
    )
}
