//! Stateless field validators.
//!
//! Pure predicates, one per field class, plus the form-level
//! aggregation the store runs before any save. Same input always yields
//! same output; nothing here touches state or the network.

use crate::error::ValidationErrors;
use crate::section::{PasswordChange, PreferencesDocument, SectionData};

/// Single `@` with a dot somewhere after it, no whitespace, and
/// non-empty local and domain parts.
pub fn validate_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some(at) = email.find('@') else {
        return false;
    };
    if at == 0 || email[at + 1..].contains('@') {
        return false;
    }
    let domain = &email[at + 1..];
    match domain.find('.') {
        Some(0) => false,
        Some(_) => !domain.ends_with('.'),
        None => false,
    }
}

/// 3-20 characters, alphanumeric plus `.`, `_` and `-`.
pub fn validate_username(username: &str) -> bool {
    let len = username.chars().count();
    (3..=20).contains(&len)
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Phone is optional: empty is always valid. Otherwise an optional
/// leading `+` followed by digits, spaces, parentheses and dashes.
pub fn validate_phone(phone: &str) -> bool {
    if phone.is_empty() {
        return true;
    }
    let rest = phone.strip_prefix('+').unwrap_or(phone);
    !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
}

/// At least 8 characters with one uppercase, one lowercase and one digit.
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Non-empty after trimming.
pub fn validate_required(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Richer check for the password-change flow. Returns the localized
/// failure reasons instead of a bare boolean.
pub fn validate_password_change(change: &PasswordChange) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !validate_required(&change.current_password) {
        errors.insert("currentPassword", "Current password is required");
    }

    if !validate_required(&change.new_password) {
        errors.insert("newPassword", "New password is required");
    } else if change.new_password.chars().count() < 8 {
        errors.insert("newPassword", "Password must be at least 8 characters long");
    } else if !validate_password(&change.new_password) {
        errors.insert(
            "newPassword",
            "Password must contain at least one uppercase letter, one lowercase letter, and one number",
        );
    }

    if change.new_password != change.confirm_password {
        errors.insert("confirmPassword", "Passwords do not match");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one section's values before submission.
///
/// Notifications, theme and privacy are enum- and bool-typed all the
/// way through, so construction already rules out bad values; only the
/// free-text account fields carry real constraints.
pub fn validate_section(data: &SectionData) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let SectionData::Account(account) = data {
        if !validate_required(&account.first_name) {
            errors.insert("firstName", "First name is required");
        }
        if !validate_required(&account.last_name) {
            errors.insert("lastName", "Last name is required");
        }
        if !validate_username(&account.username) {
            errors.insert("username", "Username must be 3-20 characters, alphanumeric only");
        }
        if !validate_email(&account.email) {
            errors.insert("email", "Please enter a valid email address");
        }
        if !account.phone.is_empty() && !validate_phone(&account.phone) {
            errors.insert("phone", "Please enter a valid phone number");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Result of whole-document validation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormValidation {
    pub is_valid: bool,
    pub errors: ValidationErrors,
}

/// Aggregate every per-section check, used before a full-document save.
pub fn validate_form(document: &PreferencesDocument) -> FormValidation {
    let mut errors = ValidationErrors::new();
    for section in crate::section::PreferenceSection::ALL {
        if let Err(section_errors) = validate_section(&document.section(section)) {
            errors.merge(section_errors);
        }
    }
    FormValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
