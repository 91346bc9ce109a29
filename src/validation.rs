//! Citizen data validation
//!
//! CPF and Brazilian phone validators used when appointments are booked
//! or edited. All validators accept punctuated input ("529.982.247-25",
//! "(11) 98765-4321") and work on the digits only.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a citizen name
pub const MAX_NAME_LEN: usize = 120;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// Keep only ASCII digits
pub fn only_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Mod-11 check digit over `digits`, weights counting down to 2
fn check_digit(digits: &[u8]) -> u8 {
    let first_weight = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| *d as u32 * (first_weight - i as u32))
        .sum();
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        (11 - remainder) as u8
    }
}

/// Validate a CPF number.
///
/// The number must have 11 digits, not all equal, and both check digits
/// must match.
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits: Vec<u8> = only_digits(cpf).bytes().map(|b| b - b'0').collect();
    if digits.len() != 11 {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

/// Normalize a CPF to 11 digits, or None if invalid
pub fn normalize_cpf(cpf: &str) -> Option<String> {
    if is_valid_cpf(cpf) {
        Some(only_digits(cpf))
    } else {
        None
    }
}

/// Format a CPF as `000.000.000-00`
pub fn format_cpf(cpf: &str) -> Option<String> {
    let d = normalize_cpf(cpf)?;
    Some(format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11]))
}

/// Strip an optional country code and return the national digits
fn national_phone_digits(phone: &str) -> String {
    let digits = only_digits(phone);
    match digits.len() {
        12 | 13 if digits.starts_with("55") => digits[2..].to_string(),
        _ => digits,
    }
}

/// Validate a Brazilian phone number.
///
/// Accepts 10 digits (landline, local part starting with 2..=5) or 11 digits
/// (mobile, local part starting with 9), both prefixed by a two-digit area
/// code without zeros. A leading `+55` is ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = national_phone_digits(phone);
    let bytes = digits.as_bytes();

    if bytes.len() != 10 && bytes.len() != 11 {
        return false;
    }
    if bytes[0] == b'0' || bytes[1] == b'0' {
        return false;
    }
    match bytes.len() {
        11 => bytes[2] == b'9',
        _ => (b'2'..=b'5').contains(&bytes[2]),
    }
}

/// Normalize a phone to its national digits, or None if invalid
pub fn normalize_phone(phone: &str) -> Option<String> {
    if is_valid_phone(phone) {
        Some(national_phone_digits(phone))
    } else {
        None
    }
}

/// Format a phone as `(DD) NNNN-NNNN` or `(DD) NNNNN-NNNN`
pub fn format_phone(phone: &str) -> Option<String> {
    let d = normalize_phone(phone)?;
    let split = d.len() - 4;
    Some(format!("({}) {}-{}", &d[0..2], &d[2..split], &d[split..]))
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Validate a citizen name, returning the trimmed name
pub fn validate_citizen_name(name: &str) -> Result<String, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Citizen name cannot be empty".to_string());
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(format!("Citizen name longer than {} characters", MAX_NAME_LEN));
    }
    Ok(trimmed.to_string())
}
