//! Customer domain model.
//!
//! # Responsibility
//! - Define the canonical customer record and its field rules.
//! - Guarantee that a `Customer` value is valid from construction on.
//!
//! # Invariants
//! - `id` is never changed after construction.
//! - `name` and `email` are stored trimmed.
//! - `name` is longer than 3 characters, `cpf` is exactly 11 ASCII digits,
//!   `email` is a syntactically valid mail address.
//! - There are no setters: any change produces a new validated instance.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a customer record.
pub type CustomerId = Uuid;

const NAME_MIN_EXCLUSIVE_CHARS: usize = 3;

static CPF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{11}$").expect("valid cpf regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    // Printable ASCII minus specials, plus any non-ASCII scalar.
    let atext = r#"[^\x00-\x20\x7F()<>\[\]:;@\\,".]"#;
    let dot_atom = format!(r"{atext}+(?:\.{atext}+)*");
    let quoted = r#""(?:[^"\\\r\n]|\\.)*""#;
    let domain_literal = r"\[[^\[\]\\\s]*\]";
    let addr_spec =
        format!(r"(?:{dot_atom}|{quoted})@[ \t]*(?:{dot_atom}|{domain_literal})");
    let comment = r"\((?:[^()\\]|\\.|\((?:[^()\\]|\\.)*\))*\)";
    let cfws = format!(r"(?:[ \t]|{comment})*");
    let display_name = r#"(?:"(?:[^"\\\r\n]|\\.)*"|[^<>"@,;:\\\[\]\r\n])*"#;
    Regex::new(&format!(
        r"^(?:{addr_spec}|{display_name}<[ \t]*{addr_spec}>){cfws}$"
    ))
    .expect("valid email regex")
});

/// Generates a fresh customer identifier.
pub fn new_customer_id() -> CustomerId {
    Uuid::new_v4()
}

/// Parses a textual customer identifier.
pub fn parse_customer_id(value: &str) -> Result<CustomerId, CustomerValidationError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| CustomerValidationError::InvalidId(value.to_string()))
}

/// Field-level validation failure for customer construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerValidationError {
    /// Name is empty after trimming.
    NameRequired,
    /// Name has 3 or fewer characters after trimming.
    NameTooShort,
    /// CPF is not exactly 11 digits.
    InvalidCpf,
    /// Email does not parse as a mail address.
    InvalidEmail,
    /// Textual identifier is not a valid UUID.
    InvalidId(String),
}

impl Display for CustomerValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameRequired => write!(f, "name must not be empty"),
            Self::NameTooShort => write!(
                f,
                "name must be longer than {NAME_MIN_EXCLUSIVE_CHARS} characters"
            ),
            Self::InvalidCpf => write!(f, "invalid cpf format"),
            Self::InvalidEmail => write!(f, "invalid e-mail format"),
            Self::InvalidId(value) => write!(f, "invalid customer id `{value}`"),
        }
    }
}

impl Error for CustomerValidationError {}

/// Validated customer record.
///
/// Serialized as `{id, name, cpf, email, active}`. Deserialization runs the
/// same validation as [`Customer::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CustomerFields")]
pub struct Customer {
    id: CustomerId,
    name: String,
    cpf: String,
    email: String,
    active: bool,
}

/// Unvalidated wire shape used as the deserialization source.
#[derive(Deserialize)]
struct CustomerFields {
    id: CustomerId,
    name: String,
    cpf: String,
    email: String,
    active: bool,
}

impl TryFrom<CustomerFields> for Customer {
    type Error = CustomerValidationError;

    fn try_from(value: CustomerFields) -> Result<Self, Self::Error> {
        Customer::new(value.id, value.name, value.cpf, value.email, value.active)
    }
}

impl Customer {
    /// Builds a customer, trimming `name`/`email` and validating every field.
    ///
    /// # Errors
    /// Rules are checked in order and the first failure is returned:
    /// `NameRequired`, `NameTooShort`, `InvalidCpf`, `InvalidEmail`.
    pub fn new(
        id: CustomerId,
        name: impl AsRef<str>,
        cpf: impl Into<String>,
        email: impl AsRef<str>,
        active: bool,
    ) -> Result<Self, CustomerValidationError> {
        let customer = Self {
            id,
            name: name.as_ref().trim().to_string(),
            cpf: cpf.into(),
            email: email.as_ref().trim().to_string(),
            active,
        };
        customer.validate()?;
        Ok(customer)
    }

    /// Re-checks all field rules against the stored values.
    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        if self.name.is_empty() {
            return Err(CustomerValidationError::NameRequired);
        }
        if self.name.chars().count() <= NAME_MIN_EXCLUSIVE_CHARS {
            return Err(CustomerValidationError::NameTooShort);
        }
        if !CPF_RE.is_match(&self.cpf) {
            return Err(CustomerValidationError::InvalidCpf);
        }
        if !is_valid_email(&self.email) {
            return Err(CustomerValidationError::InvalidEmail);
        }
        Ok(())
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cpf(&self) -> &str {
        &self.cpf
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn active(&self) -> bool {
        self.active
    }
}

/// Returns whether `value` parses as a single mail address.
///
/// Accepts a bare `local@domain` or the `Display Name <local@domain>` form,
/// UTF-8 atoms, blanks after `@`, and trailing comments such as
/// `fulano@email.com (Fulano)`.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}
