use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Body the provider returns for a verified payment.
pub const SUCCESS_TOKEN: &str = "1";

/// Whether a provider reply is a bare number rather than an identifier.
///
/// Accepts optional surrounding whitespace, an optional sign, a decimal
/// mantissa (`12`, `1.5`, `.5`, `5.`) and an optional exponent. Hex, `inf` and
/// `NaN` are not numbers here.
pub fn is_numeric(body: &str) -> bool {
    let trimmed = body.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'));
    let bytes = trimmed.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }

    if digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

pub fn is_success_token(body: &str) -> bool {
    body == SUCCESS_TOKEN
}

pub fn compute_sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    let bytes = hasher.finalize();
    hex::encode(bytes)
}

/// Stable fingerprint of an invoice's amount and details for audit trails.
pub fn fingerprint(amount: u64, details: &BTreeMap<String, String>) -> String {
    let mut canonical = amount.to_string();
    for (key, value) in details {
        canonical.push('\n');
        canonical.push_str(key);
        canonical.push('=');
        canonical.push_str(value);
    }
    compute_sha256_hex(&canonical)
}
