use std::collections::HashMap;

use crate::error::ApiError;

/// Collects per-field validation failures and turns them into a single 400.
#[derive(Debug, Default)]
pub struct Validator {
    errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for `field`; the first message per field wins.
    pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.error(field, message);
        }
    }

    /// Required text, trimmed length within `min..=max` characters.
    pub fn text(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len == 0 && min > 0 {
            self.error(field, format!("{} is required", field));
        } else if len < min || len > max {
            self.error(field, format!("{} must be between {} and {} characters", field, min, max));
        }
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if v.trim().chars().count() > max {
                self.error(field, format!("{} cannot exceed {} characters", field, max));
            }
        }
    }

    pub fn range<T: PartialOrd + std::fmt::Display>(&mut self, field: &str, value: T, min: T, max: T) {
        if value < min || value > max {
            self.error(field, format!("{} must be between {} and {}", field, min, max));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !is_valid_email(value) {
            self.error(field, "Please provide a valid email");
        }
    }

    pub fn phone(&mut self, field: &str, value: Option<&str>) {
        if let Some(phone) = value {
            if !phone.trim().is_empty() && !is_valid_phone(phone) {
                self.error(field, "Please enter a valid phone number");
            }
        }
    }

    pub fn password(&mut self, field: &str, value: &str) {
        if let Err(msg) = check_password_strength(value) {
            self.error(field, msg);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed", Some(self.errors)))
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Optional leading `+`, then 6 to 20 digits optionally separated by spaces or dashes.
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    let body = phone.strip_prefix('+').unwrap_or(phone);
    if body.is_empty() || !body.starts_with(|c: char| c.is_ascii_digit()) {
        return false;
    }
    if !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return false;
    }
    if body.contains("  ") || body.contains("--") || body.contains(" -") || body.contains("- ") {
        return false;
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    (6..=20).contains(&digits)
}

/// At least 8 characters with upper and lower case letters, a digit and a symbol.
pub fn check_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace());
    if has_lower && has_upper && has_digit && has_symbol {
        Ok(())
    } else {
        Err("Password must contain at least one uppercase letter, one lowercase letter, one number, and one special character")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_keeps_first_error_per_field() {
        let mut v = Validator::new();
        v.text("name", "   ", 1, 100);
        v.check(false, "name", "second message");
        v.range("floors", 0, 1, 50);
        assert!(v.has_errors());

        match v.finish() {
            Err(ApiError::ValidationError { field_errors: Some(errors), .. }) => {
                assert_eq!(errors["name"], "name is required");
                assert_eq!(errors["floors"], "floors must be between 1 and 50");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("admin@ump.ac.za"));
        assert!(is_valid_email("first.last+tag@example.com"));
        assert!(!is_valid_email("admin@localhost"));
        assert!(!is_valid_email("admin@@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ad min@example.com"));
        assert!(!is_valid_email("admin@example..com"));
    }

    #[test]
    fn phone_format() {
        assert!(is_valid_phone("+27 13 002 0001"));
        assert!(is_valid_phone("013-002-0001"));
        assert!(is_valid_phone("0821234567"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+27 (13) 002"));
        assert!(!is_valid_phone("phone"));
    }

    #[test]
    fn password_strength_rules() {
        assert!(check_password_strength("Campus#2024").is_ok());
        assert!(check_password_strength("Sh0rt!").is_err());
        assert!(check_password_strength("alllowercase1!").is_err());
        assert!(check_password_strength("ALLUPPERCASE1!").is_err());
        assert!(check_password_strength("NoDigitsHere!").is_err());
        assert!(check_password_strength("NoSymbols123").is_err());
    }
}
