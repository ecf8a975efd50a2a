use lazy_static::lazy_static;
use regex::Regex;

pub mod claims;
pub mod extractors;
pub mod guard;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Emails are compared and stored lowercase; the store enforces nothing.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
