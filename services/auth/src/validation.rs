//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AuthError, AuthResult};

fn invalid(message: &str) -> AuthError {
    AuthError::Validation(message.to_string())
}

/// Validate a display name
pub fn validate_full_name(full_name: &str) -> AuthResult<()> {
    let trimmed = full_name.trim();

    if trimmed.is_empty() {
        return Err(invalid("Full name is required"));
    }

    if trimmed.chars().count() > 120 {
        return Err(invalid("Full name must be at most 120 characters long"));
    }

    if trimmed.chars().any(char::is_control) {
        return Err(invalid("Full name cannot contain control characters"));
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> AuthResult<()> {
    if email.is_empty() {
        return Err(invalid("Email is required"));
    }

    if email.len() > 254 {
        return Err(invalid("Email must be at most 254 characters long"));
    }

    static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
        .ok_or_else(|| AuthError::Internal("email pattern failed to compile".to_string()))?;

    if !regex.is_match(email) {
        return Err(invalid("Invalid email format"));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.is_empty() {
        return Err(invalid("Password is required"));
    }

    if password.len() < 8 {
        return Err(invalid("Password must be at least 8 characters long"));
    }

    if password.len() > 128 {
        return Err(invalid("Password must be at most 128 characters long"));
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if !c.is_alphanumeric() {
            has_special = true;
        }
    }

    if !has_upper {
        return Err(invalid("Password must contain at least one uppercase letter"));
    }

    if !has_lower {
        return Err(invalid("Password must contain at least one lowercase letter"));
    }

    if !has_digit {
        return Err(invalid("Password must contain at least one digit"));
    }

    if !has_special {
        return Err(invalid("Password must contain at least one special character"));
    }

    Ok(())
}
