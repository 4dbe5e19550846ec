//! Deterministic masking for display and one-way hashing for identifiers
//! that are retained after offboarding but must no longer be readable.

use sha2::{Digest, Sha256};

/// Keeps the first character of the local part and the full domain:
/// `jane.doe@example.com` -> `j***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().unwrap_or('*');
            format!("{first}***@{domain}")
        }
        _ => "***".to_string(),
    }
}

/// Keeps the last four digits; everything else collapses to a fixed prefix.
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return "***".to_string();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("***-{tail}")
}

/// Stable one-way form of an identifier, for joins in retained records.
pub fn anonymize_identifier(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::{anonymize_identifier, mask_email, mask_phone};

    #[test]
    fn email_keeps_first_char_and_domain() {
        assert_eq!(mask_email("jane.doe@example.com"), "j***@example.com");
    }

    #[test]
    fn malformed_email_masks_entirely() {
        assert_eq!(mask_email("not-an-email"), "***");
        assert_eq!(mask_email("@example.com"), "***");
    }

    #[test]
    fn phone_keeps_last_four_digits_regardless_of_formatting() {
        assert_eq!(mask_phone("+1 (555) 867-5309"), "***-5309");
        assert_eq!(mask_phone("555.867.5309"), "***-5309");
    }

    #[test]
    fn short_phone_masks_entirely() {
        assert_eq!(mask_phone("911"), "***");
    }

    #[test]
    fn anonymized_identifier_is_deterministic_and_opaque() {
        let a = anonymize_identifier("emp-0042");
        let b = anonymize_identifier("emp-0042");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, anonymize_identifier("emp-0043"));
    }
}
