use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// Customer details as submitted on the checkout page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub requested_delivery_date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutForm {
    /// A blank form with the delivery date preset to the day after `today`.
    pub fn blank(today: NaiveDate) -> Self {
        let tomorrow = today.succ_opt().unwrap_or(today);
        Self {
            requested_delivery_date: tomorrow.format("%Y-%m-%d").to_string(),
            ..Self::default()
        }
    }

    /// Checks every field, returning the cleaned values or all failures.
    pub fn validate(&self) -> Result<ValidCheckout, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.customer_name.trim();
        if name.is_empty() {
            errors.add("customer_name", "Your name is required");
        }

        let email = self.customer_email.trim();
        if email.is_empty() {
            errors.add("customer_email", "Your email is required");
        } else if !is_valid_email(email) {
            errors.add("customer_email", "Enter a valid email address");
        }

        let phone = self.customer_phone.trim();
        if phone.is_empty() {
            errors.add("customer_phone", "Your phone number is required");
        } else if !is_valid_phone(phone) {
            errors.add("customer_phone", "Enter a valid phone number");
        }

        let date = self.requested_delivery_date.trim();
        let requested_delivery_date = if date.is_empty() {
            errors.add(
                "requested_delivery_date",
                "Please tell us when you need your order",
            );
            None
        } else {
            match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("requested_delivery_date", "Enter a date as YYYY-MM-DD");
                    None
                }
            }
        };

        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        match requested_delivery_date {
            Some(requested_delivery_date) if errors.is_empty() => Ok(ValidCheckout {
                customer_name: name.to_string(),
                customer_email: email.to_string(),
                customer_phone: phone.to_string(),
                requested_delivery_date,
                notes,
            }),
            _ => Err(errors),
        }
    }
}

/// A checkout form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCheckout {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub requested_delivery_date: NaiveDate,
    pub notes: Option<String>,
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn is_valid_phone(phone: &str) -> bool {
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' ');
    if !phone.chars().all(allowed) {
        return false;
    }
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
}
