use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Loose international phone shape: optional +, 7 to 15 digits, common
/// separators allowed.
pub static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-()]{5,18}[0-9]$").unwrap());

/// Postal codes: 3 to 10 alphanumerics with optional single space or hyphen.
pub static POSTAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{2,5}[ \-]?[A-Za-z0-9]{1,5}$").unwrap());

/// Card expiry given as month/year; valid when the expiry month has not
/// yet passed.
pub fn card_not_expired(exp_month: u32, exp_year: i32) -> bool {
    if !(1..=12).contains(&exp_month) {
        return false;
    }
    let now = Utc::now();
    match exp_year.cmp(&now.year()) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => exp_month >= now.month(),
    }
}

/// Builds the stored payment descriptor from a raw card number. Only the
/// last four digits survive.
pub fn mask_card_last4(card_number: &str) -> Option<String> {
    let digits: String = card_number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 12 || digits.len() > 19 {
        return None;
    }
    let last4 = &digits[digits.len() - 4..];
    Some(format!("Card ending in {last4}"))
}
