//! Client-side input checks run before any request is sent.

use crate::session::SessionError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// `local@domain.tld` shape: non-empty local part of `[A-Za-z0-9_.+-]`,
/// a domain with at least one dot, and no whitespace.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-'));
    let Some((host, tld)) = domain.split_once('.') else {
        return false;
    };
    let host_ok = !host.is_empty() && host.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    let tld_ok = !tld.is_empty()
        && tld
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.'));
    local_ok && host_ok && tld_ok
}

#[must_use]
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Check a registration form.
///
/// # Errors
///
/// Returns [`SessionError::Validation`] naming the first invalid field.
pub fn validate_registration(email: &str, password: &str, name: &str) -> Result<(), SessionError> {
    if !is_valid_email(email) {
        return Err(SessionError::Validation(format!("'{email}' is not a valid email address")));
    }
    if !is_valid_password(password) {
        return Err(SessionError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if name.trim().is_empty() {
        return Err(SessionError::Validation("name must not be empty".into()));
    }
    Ok(())
}

/// `"250 g"`; whole quantities print without decimals.
#[must_use]
pub fn format_quantity(quantity: f64, unit: &str) -> String {
    let unit = unit.trim();
    let amount = if quantity.fract().abs() < f64::EPSILON { format!("{quantity:.0}") } else { format!("{quantity}") };
    if unit.is_empty() { amount } else { format!("{amount} {unit}") }
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
