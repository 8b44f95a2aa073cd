//! # Voucher Codes
//!
//! Generation and parsing of human-readable voucher codes.
//!
//! ## Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   CORP  -  LK3J2F8Q  -  8X9QRT                                          │
//! │   ────     ────────     ──────                                          │
//! │    │          │           │                                             │
//! │    │          │           └── 6 random base-36 chars (36^6 ≈ 2.2e9)     │
//! │    │          └── Unix time in milliseconds, base 36                    │
//! │    └── category prefix (1-8 alphanumeric chars)                         │
//! │                                                                         │
//! │  Everything uppercase. Pattern: PREFIX-[A-Z0-9]+-[A-Z0-9]{6}            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Generation never fails and never looks at storage. Two codes from the same
//! millisecond differ by their random suffix with overwhelming probability;
//! the `UNIQUE` constraint on `vouchers.code` catches the rest and the issuer
//! regenerates.

use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Digits of the base-36 alphabet, uppercase.
const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of the random suffix.
pub const SUFFIX_LEN: usize = 6;

/// Longest accepted prefix.
pub const MAX_PREFIX_LEN: usize = 8;

/// Separator between the three code segments.
pub const SEPARATOR: char = '-';

// =============================================================================
// Base 36
// =============================================================================

/// Encodes `n` in uppercase base 36.
///
/// ```rust
/// use greenpay_core::code::to_base36;
///
/// assert_eq!(to_base36(0), "0");
/// assert_eq!(to_base36(35), "Z");
/// assert_eq!(to_base36(36), "10");
/// ```
pub fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::with_capacity(13);
    while n > 0 {
        digits.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();

    // Only ASCII digits were pushed
    digits.into_iter().map(char::from).collect()
}

/// Decodes a base-36 string (either case). `None` on empty input, invalid
/// digits or overflow.
pub fn from_base36(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }

    s.chars().try_fold(0u64, |acc, c| {
        let digit = c.to_digit(36)?;
        acc.checked_mul(36)?.checked_add(u64::from(digit))
    })
}

// =============================================================================
// Generation
// =============================================================================

/// Generates a voucher code for `prefix` using the current time and the
/// thread-local RNG.
///
/// ```rust
/// use greenpay_core::code::{generate_voucher_code, is_valid_voucher_code};
///
/// let code = generate_voucher_code("corp");
/// assert!(code.starts_with("CORP-"));
/// assert!(is_valid_voucher_code(&code));
/// ```
pub fn generate_voucher_code(prefix: &str) -> String {
    generate_voucher_code_with(
        prefix,
        Utc::now().timestamp_millis(),
        &mut rand::thread_rng(),
    )
}

/// Deterministic variant of [`generate_voucher_code`]: the caller supplies the
/// timestamp and the random source.
///
/// Timestamps before the Unix epoch are encoded as `0`.
pub fn generate_voucher_code_with<R: Rng + ?Sized>(
    prefix: &str,
    timestamp_millis: i64,
    rng: &mut R,
) -> String {
    let prefix = prefix.trim().to_ascii_uppercase();
    let timestamp = to_base36(u64::try_from(timestamp_millis).unwrap_or(0));

    let mut code = String::with_capacity(prefix.len() + timestamp.len() + SUFFIX_LEN + 2);
    code.push_str(&prefix);
    code.push(SEPARATOR);
    code.push_str(&timestamp);
    code.push(SEPARATOR);
    for _ in 0..SUFFIX_LEN {
        code.push(char::from(BASE36_DIGITS[rng.gen_range(0..BASE36_DIGITS.len())]));
    }
    code
}

// =============================================================================
// Parsing
// =============================================================================

/// The three segments of a well-formed voucher code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoucherCodeParts<'a> {
    pub prefix: &'a str,
    pub timestamp: &'a str,
    pub suffix: &'a str,
}

impl VoucherCodeParts<'_> {
    /// Generation time encoded in the code, if it decodes to a valid instant.
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(from_base36(self.timestamp)?).ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}

fn is_upper_alnum(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
}

fn invalid_code(reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: "voucher_code".to_string(),
        reason: reason.to_string(),
    }
}

/// Splits `code` into its segments, checking
/// `PREFIX-[A-Z0-9]+-[A-Z0-9]{6}`.
///
/// Expects an already normalised (uppercase, trimmed) code; see
/// [`normalize_voucher_code`].
pub fn parse_voucher_code(code: &str) -> ValidationResult<VoucherCodeParts<'_>> {
    let mut segments = code.split(SEPARATOR);
    let (Some(prefix), Some(timestamp), Some(suffix), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(invalid_code("expected PREFIX-TIMESTAMP-SUFFIX"));
    };

    if prefix.is_empty() || prefix.len() > MAX_PREFIX_LEN || !is_upper_alnum(prefix) {
        return Err(invalid_code("prefix must be 1-8 uppercase letters or digits"));
    }
    if timestamp.is_empty() || !is_upper_alnum(timestamp) {
        return Err(invalid_code("timestamp must be uppercase base 36"));
    }
    if suffix.len() != SUFFIX_LEN || !is_upper_alnum(suffix) {
        return Err(invalid_code("suffix must be 6 uppercase letters or digits"));
    }

    Ok(VoucherCodeParts {
        prefix,
        timestamp,
        suffix,
    })
}

/// Whether `code` is a well-formed voucher code.
pub fn is_valid_voucher_code(code: &str) -> bool {
    parse_voucher_code(code).is_ok()
}

/// Trims and uppercases user input (gate scanners and typed codes).
pub fn normalize_voucher_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_base36_round_trip_known_values() {
        assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
        assert_eq!(from_base36("LOYW3V28"), Some(1_700_000_000_000));
        assert_eq!(from_base36("loyw3v28"), Some(1_700_000_000_000));
        assert_eq!(from_base36(""), None);
        assert_eq!(from_base36("AB-C"), None);
        // 36^13 overflows u64
        assert_eq!(from_base36("ZZZZZZZZZZZZZZ"), None);
    }

    #[test]
    fn test_generated_code_layout() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = generate_voucher_code_with("corp", 1_700_000_000_000, &mut rng);

        let parts = parse_voucher_code(&code).unwrap();
        assert_eq!(parts.prefix, "CORP");
        assert_eq!(parts.timestamp, "LOYW3V28");
        assert_eq!(parts.suffix.len(), SUFFIX_LEN);
        assert_eq!(
            parts.generated_at().unwrap().timestamp_millis(),
            1_700_000_000_000
        );
    }

    #[test]
    fn test_generated_codes_match_format() {
        for prefix in ["CORP", "VCH", "IND", "ONL", "A1"] {
            for _ in 0..1_000 {
                let code = generate_voucher_code(prefix);
                assert!(is_valid_voucher_code(&code), "bad code {code}");
                assert!(code.starts_with(&format!("{prefix}-")));
            }
        }
    }

    #[test]
    fn test_same_millisecond_codes_differ() {
        let mut rng = StdRng::seed_from_u64(42);
        let a = generate_voucher_code_with("VCH", 1_700_000_000_000, &mut rng);
        let b = generate_voucher_code_with("VCH", 1_700_000_000_000, &mut rng);
        assert_ne!(a, b);
        assert_eq!(a[..13], b[..13]);
    }

    #[test]
    fn test_no_duplicates_in_tight_loop() {
        const COUNT: usize = 100_000;
        let mut seen = HashSet::with_capacity(COUNT);
        for _ in 0..COUNT {
            let code = generate_voucher_code("CORP");
            assert!(seen.insert(code.clone()), "duplicate code {code}");
        }
        assert_eq!(seen.len(), COUNT);
    }

    #[test]
    fn test_pre_epoch_timestamp_encodes_as_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let code = generate_voucher_code_with("VCH", -5, &mut rng);
        assert!(code.starts_with("VCH-0-"));
    }

    #[test]
    fn test_parse_rejects_malformed_codes() {
        assert!(!is_valid_voucher_code(""));
        assert!(!is_valid_voucher_code("CORP"));
        assert!(!is_valid_voucher_code("CORP-LK3J2F"));
        assert!(!is_valid_voucher_code("CORP-LK3J2F-8X9QR"));
        assert!(!is_valid_voucher_code("CORP-LK3J2F-8X9QRTX"));
        assert!(!is_valid_voucher_code("corp-LK3J2F-8X9QRT"));
        assert!(!is_valid_voucher_code("CORP--8X9QRT"));
        assert!(!is_valid_voucher_code("TOOLONGPFX-LK3J2F-8X9QRT"));
        assert!(!is_valid_voucher_code("CORP-LK3J2F-8X9QRT-EXTRA"));

        assert!(is_valid_voucher_code("CORP-LK3J2F-8X9QRT"));
    }

    #[test]
    fn test_normalize_voucher_code() {
        assert_eq!(normalize_voucher_code("  corp-lk3j2f-8x9qrt \n"), "CORP-LK3J2F-8X9QRT");
    }
}
