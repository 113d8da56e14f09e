//! Checkout flow.
//!
//! ```text
//! Shipping(1) ──► Billing(2) ──► Payment(3) ──► Processing(4)
//!      ◄────────────   ◄────────────   │
//!                             ▲        │ order store failed
//!                             └────────┘
//! ```
//!
//! Forward moves are gated by validation, back moves are not, and no step
//! can be skipped. Submitting payment borrows both the flow and the cart
//! mutably for the whole request, so a second submission cannot start while
//! one is in flight.

pub mod form;
pub mod pricing;

use std::fmt;

use serde::Serialize;
use tracing::{info, instrument, warn};

use maison_core::{Address, OrderNumber, OrderStatus, ShippingAddress, UserId};

use crate::cart::CartStore;
use crate::error::add_breadcrumb;
use crate::models::AuthSession;
use crate::orders::{LineItem, NewOrder, OrderError, OrderService};

pub use form::{AddressForm, Field, FormError};
pub use pricing::{OrderTotals, PricingPolicy};

/// A checkout step, numbered as shown to customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Shipping = 1,
    Billing = 2,
    Payment = 3,
    Processing = 4,
}

impl CheckoutStep {
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shipping => "Shipping",
            Self::Billing => "Billing",
            Self::Payment => "Payment",
            Self::Processing => "Processing",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

/// Who is checking out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Customer {
    /// Chose to continue without signing in.
    Guest,
    /// Signed in; the order is attached to the account.
    Member(UserId),
}

impl Customer {
    #[must_use]
    pub const fn user_id(self) -> Option<UserId> {
        match self {
            Self::Guest => None,
            Self::Member(id) => Some(id),
        }
    }
}

impl From<&AuthSession> for Customer {
    fn from(session: &AuthSession) -> Self {
        Self::Member(session.user_id)
    }
}

/// Outcome of trying to enter checkout.
#[derive(Debug)]
pub enum CheckoutEntry {
    /// Nothing to buy.
    EmptyCart,
    /// No session and no guest choice yet: ask the customer to sign in or
    /// continue as a guest.
    ChooseSignInOrGuest,
    Ready(CheckoutFlow),
}

/// Errors from the checkout flow.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] FormError),

    #[error("Please enter a payment reference")]
    MissingPaymentReference,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("cannot {action} from the {from} step")]
    InvalidStep {
        from: CheckoutStep,
        action: &'static str,
    },

    /// The order store failed; the flow is back on the payment step.
    #[error("There was a problem processing your order: {0}")]
    OrderCreation(#[from] OrderError),
}

/// Confirmation shown after a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderConfirmation {
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    pub totals: OrderTotals,
    pub shipping_address: ShippingAddress,
}

/// State of one checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    step: CheckoutStep,
    customer: Customer,
    pricing: PricingPolicy,
    shipping_form: AddressForm,
    billing_form: AddressForm,
    same_as_shipping: bool,
    shipping: Option<ShippingAddress>,
    billing: Option<Address>,
}

impl CheckoutFlow {
    /// Try to enter checkout.
    ///
    /// `customer` is `None` when nobody is signed in and the customer has
    /// not yet chosen to continue as a guest.
    #[must_use]
    pub fn enter(cart: &CartStore, customer: Option<Customer>, pricing: PricingPolicy) -> CheckoutEntry {
        if cart.is_empty() {
            return CheckoutEntry::EmptyCart;
        }
        let Some(customer) = customer else {
            return CheckoutEntry::ChooseSignInOrGuest;
        };
        add_breadcrumb("checkout", "Checkout started", None);
        CheckoutEntry::Ready(Self::new(customer, pricing))
    }

    fn new(customer: Customer, pricing: PricingPolicy) -> Self {
        Self {
            step: CheckoutStep::Shipping,
            customer,
            pricing,
            shipping_form: AddressForm::default(),
            billing_form: AddressForm::default(),
            same_as_shipping: true,
            shipping: None,
            billing: None,
        }
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn customer(&self) -> Customer {
        self.customer
    }

    #[must_use]
    pub const fn same_as_shipping(&self) -> bool {
        self.same_as_shipping
    }

    #[must_use]
    pub const fn shipping_form(&self) -> &AddressForm {
        &self.shipping_form
    }

    #[must_use]
    pub const fn billing_form(&self) -> &AddressForm {
        &self.billing_form
    }

    /// The validated shipping address, once the shipping step is passed.
    #[must_use]
    pub const fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping.as_ref()
    }

    /// The validated billing address, once the billing step is passed.
    #[must_use]
    pub const fn billing_address(&self) -> Option<&Address> {
        self.billing.as_ref()
    }

    /// Totals for the current cart under this flow's pricing.
    #[must_use]
    pub fn totals(&self, cart: &CartStore) -> OrderTotals {
        self.pricing.totals(cart.subtotal())
    }

    fn expect_step(&self, step: CheckoutStep, action: &'static str) -> Result<(), CheckoutError> {
        if self.step == step {
            Ok(())
        } else {
            Err(CheckoutError::InvalidStep {
                from: self.step,
                action,
            })
        }
    }

    /// Submit the shipping form and move to billing.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] naming blank fields (the step
    /// does not change), or [`CheckoutError::InvalidStep`] outside the
    /// shipping step.
    pub fn submit_shipping(&mut self, form: AddressForm) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Shipping, "submit shipping")?;
        let result = form.to_shipping();
        self.shipping_form = form;
        let shipping = result?;

        if self.same_as_shipping {
            self.billing_form = self.shipping_form.clone();
        }
        self.shipping = Some(shipping);
        self.step = CheckoutStep::Billing;
        Ok(())
    }

    /// Toggle "billing same as shipping". Turning it on copies the current
    /// shipping form into the billing form.
    pub fn set_same_as_shipping(&mut self, same: bool) {
        self.same_as_shipping = same;
        if same {
            self.billing_form = self.shipping_form.clone();
        }
    }

    /// Submit the billing step and move to payment.
    ///
    /// With "same as shipping" on, the billing address is a copy of the
    /// shipping address and `form` is ignored. Otherwise `form` (or the
    /// billing form kept from an earlier visit, if `None`) is validated.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] naming blank fields, or
    /// [`CheckoutError::InvalidStep`] outside the billing step.
    pub fn submit_billing(&mut self, form: Option<AddressForm>) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Billing, "submit billing")?;

        let billing = if self.same_as_shipping {
            self.billing_form = self.shipping_form.clone();
            self.shipping
                .as_ref()
                .map(|s| s.address.clone())
                .ok_or(CheckoutError::InvalidStep {
                    from: self.step,
                    action: "copy shipping address",
                })?
        } else {
            if let Some(form) = form {
                self.billing_form = form;
            }
            self.billing_form.to_billing()?
        };

        self.billing = Some(billing);
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Go back one step. Entered data is kept.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidStep`] from shipping or processing.
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.step = match self.step {
            CheckoutStep::Billing => CheckoutStep::Shipping,
            CheckoutStep::Payment => CheckoutStep::Billing,
            from @ (CheckoutStep::Shipping | CheckoutStep::Processing) => {
                return Err(CheckoutError::InvalidStep {
                    from,
                    action: "go back",
                });
            }
        };
        Ok(self.step)
    }

    /// Submit payment and place the order.
    ///
    /// Any non-blank reference is accepted; it is recorded, not verified.
    /// On success the cart is cleared. On failure the flow returns to the
    /// payment step, the cart is untouched and no order exists.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingPaymentReference`],
    /// [`CheckoutError::EmptyCart`], [`CheckoutError::InvalidStep`] outside
    /// the payment step, or [`CheckoutError::OrderCreation`] if the order
    /// store failed.
    #[instrument(skip_all, fields(customer = ?self.customer))]
    pub async fn submit_payment(
        &mut self,
        payment_reference: &str,
        cart: &mut CartStore,
        orders: &OrderService,
    ) -> Result<OrderConfirmation, CheckoutError> {
        self.expect_step(CheckoutStep::Payment, "submit payment")?;

        let payment_reference = payment_reference.trim();
        if payment_reference.is_empty() {
            return Err(CheckoutError::MissingPaymentReference);
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let shipping_address = self.shipping.clone().ok_or(CheckoutError::InvalidStep {
            from: self.step,
            action: "submit payment without a shipping address",
        })?;

        let new_order = NewOrder {
            user_id: self.customer.user_id(),
            status: OrderStatus::Pending,
            items: cart.items().iter().map(LineItem::from).collect(),
            shipping_address,
            payment_reference: payment_reference.to_owned(),
            totals: self.totals(cart),
        };

        let mut processing = ProcessingGuard::enter(&mut self.step);
        match orders.place_order(&new_order).await {
            Ok(order) => {
                processing.complete();
                cart.clear_cart();
                add_breadcrumb(
                    "checkout",
                    "Order placed",
                    Some(&[("order_number", order.order_number.as_str())]),
                );
                info!(order_number = %order.order_number, "Checkout complete");
                Ok(OrderConfirmation {
                    order_number: order.order_number,
                    status: order.status,
                    items: order.items,
                    totals: order.totals,
                    shipping_address: order.shipping_address,
                })
            }
            Err(e) => {
                warn!(error = %e, "Order creation failed, returning to payment");
                Err(e.into())
            }
        }
    }
}

/// Holds the flow in [`CheckoutStep::Processing`] while an order is placed.
///
/// Unless completed, dropping it puts the flow back on the payment step,
/// including when the submission future itself is dropped mid-request.
struct ProcessingGuard<'a> {
    step: &'a mut CheckoutStep,
    completed: bool,
}

impl<'a> ProcessingGuard<'a> {
    fn enter(step: &'a mut CheckoutStep) -> Self {
        *step = CheckoutStep::Processing;
        Self {
            step,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            *self.step = CheckoutStep::Payment;
        }
    }
}
