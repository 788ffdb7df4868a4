//! Human-readable labels for discovered links.

/// Known machine keys and their display names.
const KNOWN_KEYS: &[(&str, &str)] = &[
    ("instant_final", "Instant"),
    ("cloud_r2", "Cloud R2"),
    ("zip_final", "ZIP"),
    ("pixeldrain", "Pixeldrain"),
    ("telegram_file", "Telegram"),
    ("gofile_final", "Gofile"),
];

/// Title-cases every alphabetic run: first letter upper, rest lower.
///
/// ```
/// use bypass_relay::normalize::labels::title_case;
/// assert_eq!(title_case("direct_link2go"), "Direct Link2Go");
/// ```
#[must_use]
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;
    for c in raw.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Label for a link found under a JSON key.
///
/// ```
/// use bypass_relay::normalize::labels::label_from_key;
/// assert_eq!(label_from_key("telegram_file"), "Telegram");
/// assert_eq!(label_from_key("custom_field"), "Custom Field");
/// ```
#[must_use]
pub fn label_from_key(key: &str) -> String {
    KNOWN_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map_or_else(|| title_case(key), |(_, label)| (*label).to_string())
}

/// Label for a link that carries an explicit `name`.
///
/// `"Download [720p HEVC]"` → `"720p HEVC"`, `"Download File X"` → `"File X"`,
/// anything else is kept (trimmed).
#[must_use]
pub fn label_from_name(name: &str) -> String {
    let s = name.trim();
    let low = s.to_lowercase();

    if low.contains("download") {
        if let (Some(open), Some(close)) = (s.find('['), s.rfind(']')) {
            if close > open {
                let inner = s[open + 1..close].trim();
                if !inner.is_empty() {
                    return inner.to_string();
                }
            }
        }
    }

    if low.starts_with("download ") {
        // "download " is ASCII, so byte 9 is a char boundary
        let rest = s[9..].trim();
        if !rest.is_empty() {
            return rest.to_string();
        }
    }

    s.to_string()
}
