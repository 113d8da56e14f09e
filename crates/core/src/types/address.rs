//! Postal addresses captured at checkout.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::email::Email;

/// Default country preselected on address forms.
pub const DEFAULT_COUNTRY: &str = "United States";

/// A postal address with a contact phone number.
///
/// Used as-is for billing; shipping addresses wrap it with an email in
/// [`ShippingAddress`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    /// Street address line.
    pub address: String,
    pub city: String,
    /// State or province.
    pub state: String,
    /// ZIP or postal code.
    pub zip_code: String,
    pub country: String,
    pub phone: String,
}

impl Address {
    /// "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Multi-line postal rendering used on receipts.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.full_name())?;
        writeln!(f, "{}", self.address)?;
        writeln!(f, "{}, {} {}", self.city, self.state, self.zip_code)?;
        writeln!(f, "{}", self.country)?;
        write!(f, "{}", self.phone)
    }
}

/// Where an order ships, plus the email the order is looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(flatten)]
    pub address: Address,
    pub email: Email,
}

impl fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.address)?;
        write!(f, "{}", self.email)
    }
}
