//! # Validation Module
//!
//! Input validation gating every create/update before persistence.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE - field and entity rules                         │
//! │  ├── Required fields, formats, ranges                                  │
//! │  └── First failure wins; its message is shown to the user              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (invoice_number)                               │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: both layers catch different errors                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{CustomerInput, FactoryInput, ProductInput};
use crate::MAX_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an entity display name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a GSTIN (tax id).
///
/// Required on both customers and factories; no format rule beyond
/// non-emptiness is enforced.
pub fn validate_gstin(gstin: &str) -> ValidationResult<()> {
    if gstin.trim().is_empty() {
        return Err(ValidationError::required("gstin"));
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - Must not be empty
/// - Must contain at least 10 digits once punctuation is stripped
///
/// ## Example
/// ```rust
/// use factura_core::validation::validate_phone;
///
/// assert!(validate_phone("(987) 654-3210").is_ok());
/// assert!(validate_phone("12345").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    if phone.trim().is_empty() {
        return Err(ValidationError::required("phone"));
    }

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if digits < 10 {
        return Err(ValidationError::invalid_format(
            "phone",
            "must have at least 10 digits",
        ));
    }

    Ok(())
}

/// Validates an optional email address.
///
/// ## Rules
/// An absent email is fine; a present one must have the
/// `local@domain.tld` shape: no whitespace, exactly one `@`, and a dot
/// with content on both sides in the domain.
///
/// ## Example
/// ```rust
/// use factura_core::validation::validate_email;
///
/// assert!(validate_email(None).is_ok());
/// assert!(validate_email(Some("billing@adhunik.in")).is_ok());
/// assert!(validate_email(Some("not-an-email")).is_err());
/// ```
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email else {
        return Ok(());
    };
    let email = email.trim();
    if email.is_empty() {
        return Ok(());
    }

    let invalid = || ValidationError::invalid_format("email", "must look like name@example.com");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    // Domain needs a dot with something on both sides: "b.c" yes, "b." no.
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(invalid());
    };
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a product price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a frozen unit price on an invoice line.
pub fn validate_unit_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "unit price".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================
// One entry point per entity form; invoice drafts validate themselves
// (see `InvoiceDraft::validate`). First failure wins.

/// Validates customer fields before create/update.
pub fn validate_customer(input: &CustomerInput) -> ValidationResult<()> {
    validate_name(&input.name)?;
    validate_gstin(&input.gstin)?;
    validate_phone(&input.phone)?;
    validate_email(input.email.as_deref())?;
    Ok(())
}

/// Validates factory fields before create/update.
pub fn validate_factory(input: &FactoryInput) -> ValidationResult<()> {
    validate_name(&input.name)?;
    validate_gstin(&input.gstin)?;
    validate_phone(&input.phone)?;
    validate_email(input.email.as_deref())?;
    Ok(())
}

/// Validates product fields before create/update.
pub fn validate_product(input: &ProductInput) -> ValidationResult<()> {
    validate_name(&input.name)?;
    if input.factory_id.trim().is_empty() {
        return Err(ValidationError::required("factory"));
    }
    validate_price_cents(input.price_cents)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
