//! Phone mask applied to every keystroke in the phone field.

/// Literal prefix carrying the fixed country code.
pub const PHONE_PREFIX: &str = "+7 (";
/// Length of a fully masked number, `+7 (XXX) XXX-XX-XX`.
pub const PHONE_MASK_LEN: usize = 18;

// Leading digits treated as a typed country code and dropped.
const COUNTRY_DIGITS: [char; 2] = ['7', '8'];

/// Rewrites raw input into the canonical mask.
///
/// Non-digits are discarded, a leading `7`/`8` is dropped, and the mask
/// literals are reinserted at fixed breakpoints. The result never exceeds
/// [`PHONE_MASK_LEN`] and re-masking a masked value returns it unchanged.
pub fn format_phone(raw: &str) -> String {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.starts_with(&COUNTRY_DIGITS[..]) {
        digits.remove(0);
    }
    if digits.is_empty() {
        return String::new();
    }

    // Every character below is ASCII, so byte offsets are char offsets.
    let mut value = format!("{PHONE_PREFIX}{digits}");
    if value.len() > 7 {
        value.insert_str(7, ") ");
    }
    if value.len() > 12 {
        value.insert(12, '-');
    }
    if value.len() > 15 {
        value.insert(15, '-');
    }
    value.truncate(PHONE_MASK_LEN);
    value
}
