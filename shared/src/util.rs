use chrono::{DateTime, Utc};

/// Current UTC time
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Keep only the digits of a phone number ("(11) 98765-4321" -> "11987654321")
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize a phone number to international digits for WhatsApp links.
///
/// Numbers without a country code (10 or 11 digits: area code + number)
/// are assumed to be Brazilian and get `55` prepended.
pub fn whatsapp_number(phone: &str) -> Option<String> {
    let digits = digits_only(phone);
    match digits.len() {
        0..=7 => None,
        10 | 11 => Some(format!("55{digits}")),
        _ => Some(digits),
    }
}
