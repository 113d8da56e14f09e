//! Address forms and their validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use maison_core::{Address, DEFAULT_COUNTRY, Email, EmailError, ShippingAddress};

/// A form field a customer left blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Address,
    City,
    State,
    ZipCode,
    Phone,
    Email,
}

impl Field {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "first name",
            Self::LastName => "last name",
            Self::Address => "address",
            Self::City => "city",
            Self::State => "state",
            Self::ZipCode => "ZIP code",
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why an address form was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Please fill in all required fields (missing: {})", join(.0))]
    MissingFields(Vec<Field>),
    #[error("invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),
}

fn join(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raw address form input as typed by the customer.
///
/// Used for both the shipping and the billing step; `email` is only
/// required for shipping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressForm {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
    pub email: String,
}

impl Default for AddressForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: DEFAULT_COUNTRY.to_owned(),
            phone: String::new(),
            email: String::new(),
        }
    }
}

impl AddressForm {
    /// Validate as a shipping address: every field including email.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingFields`] naming each blank field, or
    /// [`FormError::InvalidEmail`] if the email does not parse.
    pub fn to_shipping(&self) -> Result<ShippingAddress, FormError> {
        let mut missing = self.blank_address_fields();
        if self.email.trim().is_empty() {
            missing.push(Field::Email);
        }
        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }
        Ok(ShippingAddress {
            address: self.address_unchecked(),
            email: Email::parse(&self.email)?,
        })
    }

    /// Validate as a billing address; email is not required.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingFields`] naming each blank field.
    pub fn to_billing(&self) -> Result<Address, FormError> {
        let missing = self.blank_address_fields();
        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }
        Ok(self.address_unchecked())
    }

    fn blank_address_fields(&self) -> Vec<Field> {
        [
            (Field::FirstName, &self.first_name),
            (Field::LastName, &self.last_name),
            (Field::Address, &self.address),
            (Field::City, &self.city),
            (Field::State, &self.state),
            (Field::ZipCode, &self.zip_code),
            (Field::Phone, &self.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    fn address_unchecked(&self) -> Address {
        let country = self.country.trim();
        Address {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zip_code: self.zip_code.trim().to_owned(),
            country: if country.is_empty() {
                DEFAULT_COUNTRY.to_owned()
            } else {
                country.to_owned()
            },
            phone: self.phone.trim().to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn filled() -> AddressForm {
        AddressForm {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            address: "12 Marylebone Rd".to_owned(),
            city: "Springfield".to_owned(),
            state: "IL".to_owned(),
            zip_code: "62701".to_owned(),
            phone: "555-0100".to_owned(),
            email: "Ada@Example.com".to_owned(),
            ..AddressForm::default()
        }
    }

    #[test]
    fn test_complete_form_is_accepted() {
        let shipping = filled().to_shipping().unwrap();
        assert_eq!(shipping.address.country, DEFAULT_COUNTRY);
        assert_eq!(shipping.email.as_str(), "ada@example.com");
    }

    #[test]
    fn test_blank_fields_are_named() {
        let form = AddressForm {
            city: "  ".to_owned(),
            email: String::new(),
            ..filled()
        };
        let err = form.to_shipping().unwrap_err();
        assert_eq!(err, FormError::MissingFields(vec![Field::City, Field::Email]));
        assert_eq!(
            err.to_string(),
            "Please fill in all required fields (missing: city, email)"
        );
    }

    #[test]
    fn test_billing_does_not_need_email() {
        let form = AddressForm {
            email: String::new(),
            ..filled()
        };
        assert!(form.to_billing().is_ok());
    }

    #[test]
    fn test_bad_email_is_rejected() {
        let form = AddressForm {
            email: "not-an-email".to_owned(),
            ..filled()
        };
        assert!(matches!(
            form.to_shipping().unwrap_err(),
            FormError::InvalidEmail(_)
        ));
    }
}
