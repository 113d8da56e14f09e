//! Checkout.

use std::path::{Path, PathBuf};

use clap::Args;

use maison_storefront::checkout::{AddressForm, CheckoutEntry, CheckoutFlow, Customer};
use maison_storefront::error::AppError;
use maison_storefront::state::AppState;

use super::Credentials;
use super::cart::print_cart;

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Shipping address form as JSON
    #[arg(long)]
    shipping: PathBuf,

    /// Billing address form as JSON; omit to bill to the shipping address
    #[arg(long)]
    billing: Option<PathBuf>,

    /// Payment reference to record with the order
    #[arg(long)]
    payment_reference: String,

    /// Continue without signing in
    #[arg(long, conflicts_with_all = ["email", "password"])]
    guest: bool,

    #[command(flatten)]
    credentials: Credentials,
}

pub async fn run(state: &AppState, args: CheckoutArgs) -> Result<(), AppError> {
    let mut cart = state.open_cart();

    let customer = if args.guest {
        Some(Customer::Guest)
    } else {
        args.credentials
            .sign_in(state)
            .await?
            .as_ref()
            .map(Customer::from)
    };

    let mut flow = match CheckoutFlow::enter(&cart, customer, state.config().pricing) {
        CheckoutEntry::EmptyCart => {
            println!("Your cart is empty");
            return Ok(());
        }
        CheckoutEntry::ChooseSignInOrGuest => {
            return Err(AppError::Unauthorized(
                "sign in with --email and --password, or pass --guest".to_string(),
            ));
        }
        CheckoutEntry::Ready(flow) => flow,
    };

    print_cart(state, &cart);
    println!();

    flow.submit_shipping(read_form(&args.shipping).await?)?;
    println!("{} done", flow.step());

    let billing = match &args.billing {
        Some(path) => {
            flow.set_same_as_shipping(false);
            Some(read_form(path).await?)
        }
        None => None,
    };
    flow.submit_billing(billing)?;
    println!("{} done", flow.step());

    let confirmation = flow
        .submit_payment(&args.payment_reference, &mut cart, state.orders())
        .await?;

    println!();
    println!("Thank you for your order!");
    println!("Order #{}", confirmation.order_number);
    println!("Status: {}", confirmation.status);
    println!("Total:  {}", confirmation.totals.total);
    println!(
        "Track it with: maison track {} {}",
        confirmation.order_number, confirmation.shipping_address.email
    );
    Ok(())
}

async fn read_form(path: &Path) -> Result<AddressForm, AppError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::BadRequest(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&json)
        .map_err(|e| AppError::BadRequest(format!("invalid address form {}: {e}", path.display())))
}
