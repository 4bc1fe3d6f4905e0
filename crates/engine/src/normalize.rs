use std::collections::BTreeMap;

use crate::config::{Comparator, EngineConfig, KindRules};

/// Canonicalize a MAC address to `aa:bb:cc:dd:ee:ff`. Values that don't
/// contain exactly 12 hex digits pass through lower-cased.
pub fn normalize_mac(value: &str) -> String {
    let hex: String = value
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect::<String>()
        .to_ascii_lowercase();

    if hex.len() != 12 {
        return value.trim().to_ascii_lowercase();
    }

    hex.as_bytes()
        .chunks(2)
        .map(|pair| std::str::from_utf8(pair).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(":")
}

/// Produce the comparison view of a record's fields: everything trimmed,
/// identifier fields lower-cased, MAC-like fields canonicalized. The raw
/// map is left untouched so display fields keep their casing.
pub fn normalize_fields(
    rules: &KindRules,
    fields: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();

    for (name, value) in fields {
        let trimmed = value.trim();
        let normalized = match rules.fields.get(name).map(|r| r.comparator) {
            Some(Comparator::Identifier) => {
                if name.contains("mac") {
                    normalize_mac(trimmed)
                } else {
                    trimmed.to_ascii_lowercase()
                }
            }
            // Names compare case-insensitively in the exact/fuzzy tiers.
            Some(Comparator::Fuzzy) => trimmed.to_ascii_lowercase(),
            None => trimmed.to_string(),
        };
        out.insert(name.clone(), normalized);
    }

    out
}

/// Exclusion predicate. Returns the reason a record is ineligible, or None.
///
/// A record is dropped when its status is present but outside the configured
/// valid set, or when any notes field contains an exclusion marker.
pub fn ineligibility_reason(
    config: &EngineConfig,
    fields: &BTreeMap<String, String>,
) -> Option<String> {
    if !config.valid_statuses.is_empty() {
        if let Some(status) = fields.get(&config.status_field) {
            let status = status.trim();
            if !status.is_empty() && !config.valid_statuses.iter().any(|s| s == status) {
                return Some(format!("status '{status}' not in valid set"));
            }
        }
    }

    for notes_field in &config.notes_fields {
        if let Some(notes) = fields.get(notes_field) {
            let notes_lower = notes.to_ascii_lowercase();
            for marker in &config.exclusion_markers {
                if !marker.is_empty() && notes_lower.contains(&marker.to_ascii_lowercase()) {
                    return Some(format!("'{marker}' marker in {notes_field}"));
                }
            }
        }
    }

    None
}
