//! Shipping and billing address snapshots.
//!
//! Orders store addresses by value, not by reference: the address on an order
//! is the one the buyer entered at checkout, unaffected by later edits to any
//! address book.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Required address fields, in the order they are reported to clients.
pub const REQUIRED_ADDRESS_FIELDS: &[&str] = &[
    "firstName",
    "lastName",
    "addressLine1",
    "city",
    "state",
    "postalCode",
];

/// Error validating an address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is missing or blank.
    #[error("missing required address field: {0}")]
    MissingField(&'static str),
}

/// A postal address snapshotted onto an order.
///
/// All fields deserialize with defaults so that a partially filled payload
/// parses and is then rejected by [`Address::validate`] with a field-level
/// error, rather than failing opaquely at the deserialization layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    /// Check that every required field is present and non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MissingField`] naming the first missing field.
    pub fn validate(&self) -> Result<(), AddressError> {
        let required: [(&'static str, &str); 6] = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("addressLine1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AddressError::MissingField(name));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn complete() -> Address {
        Address {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            address_line1: "12 Ocean Ave".into(),
            address_line2: None,
            city: "Port Townsend".into(),
            state: "WA".into(),
            postal_code: "98368".into(),
            country: Some("US".into()),
        }
    }

    #[test]
    fn test_complete_address_validates() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn test_each_required_field_is_enforced() {
        let blank_one = |f: fn(&mut Address)| {
            let mut addr = complete();
            f(&mut addr);
            addr.validate()
        };

        assert_eq!(
            blank_one(|a| a.first_name.clear()),
            Err(AddressError::MissingField("firstName"))
        );
        assert_eq!(
            blank_one(|a| a.last_name.clear()),
            Err(AddressError::MissingField("lastName"))
        );
        assert_eq!(
            blank_one(|a| a.address_line1.clear()),
            Err(AddressError::MissingField("addressLine1"))
        );
        assert_eq!(
            blank_one(|a| a.city.clear()),
            Err(AddressError::MissingField("city"))
        );
        assert_eq!(
            blank_one(|a| a.state.clear()),
            Err(AddressError::MissingField("state"))
        );
        assert_eq!(
            blank_one(|a| a.postal_code.clear()),
            Err(AddressError::MissingField("postalCode"))
        );
    }

    #[test]
    fn test_whitespace_only_is_missing() {
        let mut addr = complete();
        addr.city = "   ".into();
        assert_eq!(addr.validate(), Err(AddressError::MissingField("city")));
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let mut addr = complete();
        addr.address_line2 = None;
        addr.country = None;
        assert!(addr.validate().is_ok());
    }

    #[test]
    fn test_partial_payload_parses_then_fails_validation() {
        let addr: Address = serde_json::from_str(r#"{"firstName": "Ada"}"#).unwrap();
        assert_eq!(
            addr.validate(),
            Err(AddressError::MissingField("lastName"))
        );
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = serde_json::to_value(complete()).unwrap();
        assert!(json.get("firstName").is_some());
        assert!(json.get("postalCode").is_some());
        assert!(json.get("first_name").is_none());
    }
}
