//! Shared types for the formcall workspace.
//!
//! This crate holds the data model every other crate agrees on: the
//! [`FormState`] record collected during a call, the [`FormField`]
//! selector used by both the tool surface and the frontend, and the
//! data-channel packet types that carry state between participants.
//!
//! The serialized shape of [`FormState`] is the outbound broadcast message
//! consumed by the frontend, so field renames here are wire changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod packet;
pub use packet::{DataPacket, FieldUpdate, Reliability};

/// One of the three fields collected from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    /// The caller's name.
    Name,
    /// The caller's phone number.
    Phone,
    /// The caller's email address.
    Email,
}

impl FormField {
    /// All fields in submission priority order.
    pub const ALL: [FormField; 3] = [FormField::Name, FormField::Phone, FormField::Email];

    /// Returns the selector used on the wire (`"name"`, `"phone"`, `"email"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }

    /// Returns the spoken label used in confirmations and prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone number",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown field selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field: {0}")]
pub struct ParseFormFieldError(pub String);

impl FromStr for FormField {
    type Err = ParseFormFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "phone" => Ok(Self::Phone),
            "email" => Ok(Self::Email),
            _ => Err(ParseFormFieldError(s.to_string())),
        }
    }
}

/// The form collected during a single session.
///
/// Serializes to the broadcast message shape:
///
/// ```json
/// {"customer_name": null, "customer_phone": null, "customer_email": null, "should_submit": false}
/// ```
///
/// Unset fields serialize as `null` rather than being omitted, so every
/// broadcast is a complete snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(rename = "customer_name")]
    pub name: Option<String>,
    #[serde(rename = "customer_phone")]
    pub phone: Option<String>,
    #[serde(rename = "customer_email")]
    pub email: Option<String>,
    /// Set once a submission observed all three fields. Never cleared.
    #[serde(rename = "should_submit")]
    pub submitted: bool,
}

impl FormState {
    /// Returns the current value of `field`, if set.
    pub fn get(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Name => self.name.as_deref(),
            FormField::Phone => self.phone.as_deref(),
            FormField::Email => self.email.as_deref(),
        }
    }

    /// Overwrites `field` with `value`.
    pub fn set(&mut self, field: FormField, value: String) {
        let slot = match field {
            FormField::Name => &mut self.name,
            FormField::Phone => &mut self.phone,
            FormField::Email => &mut self.email,
        };
        *slot = Some(value);
    }

    /// Returns the first unset field in priority order (name, phone, email).
    pub fn first_missing(&self) -> Option<FormField> {
        FormField::ALL
            .into_iter()
            .find(|field| self.get(*field).is_none())
    }

    /// Whether all three fields are set.
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }
}
