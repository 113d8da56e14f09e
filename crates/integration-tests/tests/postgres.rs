//! Integration tests against `PostgreSQL`.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - `MAISON_TEST_DATABASE_URL` pointing at it
//!
//! Run with: cargo test -p maison-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use maison_core::{Email, Money, OrderStatus};
use maison_integration_tests::{TestContext, shipping_form};
use maison_storefront::checkout::{CheckoutEntry, CheckoutFlow, Customer};
use maison_storefront::orders::OrderError;
use maison_storefront::services::{AuthError, SignUp};

/// Unique suffix so repeated runs don't collide on emails and usernames.
fn unique() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{nanos:x}")
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_member_checkout_round_trip() {
    let ctx = TestContext::postgres().await;
    let suffix = unique();
    let email = format!("ada+{suffix}@example.com");

    let session = ctx
        .state
        .auth()
        .sign_up(&SignUp {
            email: email.clone(),
            password: "s3cret!".to_string(),
            full_name: "Ada Lovelace".to_string(),
            username: format!("ada_{suffix}"),
        })
        .await
        .unwrap();

    let mut cart = ctx.state.open_cart();
    cart.add_to_cart(ctx.product("1"), 1);
    let CheckoutEntry::Ready(mut flow) = CheckoutFlow::enter(
        &cart,
        Some(Customer::from(&session)),
        ctx.state.config().pricing,
    ) else {
        panic!("checkout did not open");
    };
    flow.submit_shipping(shipping_form(&email)).unwrap();
    flow.submit_billing(None).unwrap();
    let confirmation = flow
        .submit_payment("PAY-PG", &mut cart, ctx.state.orders())
        .await
        .unwrap();
    assert!(cart.is_empty());

    let order = ctx
        .state
        .orders()
        .find_order(&confirmation.order_number, &Email::parse(&email).unwrap())
        .await
        .unwrap();
    assert_eq!(order.totals.total, Money::from_major(3024));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].unit_price, Money::from_major(2800));
    assert_eq!(order.user_id, Some(session.user_id));

    let wrong = Email::parse("eve@example.com").unwrap();
    assert!(matches!(
        ctx.state
            .orders()
            .find_order(&confirmation.order_number, &wrong)
            .await
            .unwrap_err(),
        OrderError::NotFound
    ));

    let shipped = ctx
        .state
        .orders()
        .advance_status(&order.order_number, OrderStatus::Processing)
        .await
        .unwrap();
    assert_eq!(shipped.status, OrderStatus::Processing);

    let history = ctx
        .state
        .orders()
        .order_history(session.user_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OrderStatus::Processing);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_duplicate_sign_up_is_rejected() {
    let ctx = TestContext::postgres().await;
    let suffix = unique();
    let form = SignUp {
        email: format!("dup+{suffix}@example.com"),
        password: "s3cret!".to_string(),
        full_name: "Dup Licate".to_string(),
        username: format!("dup_{suffix}"),
    };

    ctx.state.auth().sign_up(&form).await.unwrap();
    assert!(matches!(
        ctx.state.auth().sign_up(&form).await.unwrap_err(),
        AuthError::UserAlreadyExists
    ));

    let same_username = SignUp {
        email: format!("other+{suffix}@example.com"),
        ..form
    };
    assert!(matches!(
        ctx.state.auth().sign_up(&same_username).await.unwrap_err(),
        AuthError::UsernameTaken
    ));
}
