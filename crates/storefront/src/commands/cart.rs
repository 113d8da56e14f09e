//! Cart management.

use clap::Subcommand;

use maison_core::ProductId;
use maison_storefront::cart::CartStore;
use maison_storefront::error::AppError;
use maison_storefront::state::AppState;

#[derive(Debug, Subcommand)]
pub enum CartAction {
    /// Show the cart with totals
    Show,
    /// Add a product
    Add {
        /// Product id
        id: String,
        #[arg(default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove {
        /// Product id
        id: String,
    },
    /// Set the quantity of a product already in the cart
    Update {
        /// Product id
        id: String,
        quantity: u32,
    },
    /// Empty the cart
    Clear,
}

pub fn run(state: &AppState, action: CartAction) -> Result<(), AppError> {
    let mut cart = state.open_cart();
    cart.subscribe(|event| println!("{event}"));

    match action {
        CartAction::Show => {}
        CartAction::Add { id, quantity } => {
            let product = state
                .catalog()
                .get(&ProductId::new(id.as_str()))
                .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
            cart.add_to_cart(product, quantity);
        }
        CartAction::Remove { id } => cart.remove_from_cart(&ProductId::new(id)),
        CartAction::Update { id, quantity } => {
            cart.update_quantity(&ProductId::new(id), quantity);
        }
        CartAction::Clear => cart.clear_cart(),
    }

    print_cart(state, &cart);
    Ok(())
}

pub fn print_cart(state: &AppState, cart: &CartStore) {
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }

    println!("Cart ({} items)", cart.total_items());
    for item in cart.items() {
        println!(
            "{:>4}  {} x {:<32} {:>12}",
            item.product.id.as_str(),
            item.quantity,
            item.product.name,
            item.line_total().to_string()
        );
    }

    let totals = state.config().pricing.totals(cart.subtotal());
    println!("Subtotal  {}", totals.subtotal);
    if totals.shipping.is_positive() {
        println!("Shipping  {}", totals.shipping);
    } else {
        println!("Shipping  Free");
    }
    println!("Tax       {}", totals.tax);
    println!("Total     {}", totals.total);
}
