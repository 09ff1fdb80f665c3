//! Representative PII catalog for NDC payloads.

use regex::Regex;
use std::sync::LazyLock;

use super::Detector;

macro_rules! pii_pattern {
    ($name:ident, $regex_str:expr) => {
        pub static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

// ── Email ──────────────────────────────────────────────────────────────────
pii_pattern!(
    RE_EMAIL,
    r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}"
);

// ── Payment card (Visa, MC, Amex, Discover) ────────────────────────────────
pii_pattern!(
    RE_PAYMENT_CARD,
    r"\b(?:4\d{3}|5[1-5]\d{2}|3[47]\d{2}|6(?:011|5\d{2}))[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{3,4}\b"
);

// ── IBAN ───────────────────────────────────────────────────────────────────
pii_pattern!(
    RE_IBAN,
    r"\b[A-Z]{2}\d{2}[A-Z0-9]{4}\d{7}(?:[A-Z0-9]?\d{0,16})\b"
);

// ── SSN ────────────────────────────────────────────────────────────────────
pii_pattern!(RE_SSN, r"\b\d{3}-\d{2}-\d{4}\b");

// ── Phone (E.164 or separated national format) ─────────────────────────────
pii_pattern!(
    RE_PHONE,
    r"\+\d{7,15}\b|(?:\+\d{1,3}[\s.\-]?)?\(?\b\d{3}\)?[\s.\-]\d{3}[\s.\-]\d{4}\b"
);

// ── Date of birth (MM/DD/YYYY) ─────────────────────────────────────────────
pii_pattern!(
    RE_DOB,
    r"\b(?:0[1-9]|1[0-2])/(?:0[1-9]|[12]\d|3[01])/(?:19|20)\d{2}\b"
);

// ── Passport / travel document number ──────────────────────────────────────
pii_pattern!(RE_PASSPORT, r"\b[A-Z]{1,2}\d{6,8}\b");

// ── IPv4 ───────────────────────────────────────────────────────────────────
pii_pattern!(
    RE_IPV4,
    r"\b(?:(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\b"
);

// ── Bare nine-digit identifier ─────────────────────────────────────────────
pii_pattern!(RE_BARE_NINE_DIGIT, r"\b\d{9}\b");

fn compiled(
    name: &str,
    category: &str,
    regex: &LazyLock<Option<Regex>>,
    replacement: &str,
    confidence: f64,
) -> Detector {
    Detector {
        name: name.to_string(),
        category: category.to_string(),
        regex: LazyLock::force(regex).clone(),
        replacement: replacement.to_string(),
        confidence,
        enabled_by_default: true,
    }
}

/// The catalog in detection order, most specific first.
pub fn catalog() -> Vec<Detector> {
    vec![
        compiled("email", "contact", &RE_EMAIL, "[EMAIL]", 0.95),
        compiled("payment_card", "financial", &RE_PAYMENT_CARD, "[PAYMENT_CARD]", 0.90),
        compiled("iban", "financial", &RE_IBAN, "[IBAN]", 0.85),
        compiled("ssn", "national_id", &RE_SSN, "[SSN]", 0.95),
        compiled("phone", "contact", &RE_PHONE, "[PHONE]", 0.80),
        compiled("date_of_birth", "identity", &RE_DOB, "[DOB]", 0.75),
        compiled("passport", "travel_document", &RE_PASSPORT, "[PASSPORT]", 0.60),
        compiled("ipv4", "network", &RE_IPV4, "[IP_ADDRESS]", 0.70),
        compiled("bare_nine_digit", "identifier", &RE_BARE_NINE_DIGIT, "[ID_NUMBER]", 0.40)
            .disabled_by_default(),
    ]
}
