use std::sync::LazyLock;

use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});

static E164_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+\d{10,15}$").expect("valid phone pattern")
});

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_PATTERN.is_match(email)
}

/// `+` followed by 10 to 15 digits.
pub fn is_e164_phone(phone: &str) -> bool {
    E164_PATTERN.is_match(phone)
}

/// Loose check used for staff numbers: only the international prefix is required.
pub fn is_international_phone(phone: &str) -> bool {
    phone.starts_with('+')
}
