/// Registry name canonicalization
///
/// Folds case, applies NFC, maps alternate full stops to `.`, and rejects
/// labels that cannot exist in the registry. A canonical name always normalizes to itself.
use crate::error::{AttestError, AttestResult};
use unicode_normalization::UnicodeNormalization;

/// Full stop variants treated as label separators
const ALTERNATE_STOPS: [char; 3] = ['\u{3002}', '\u{FF0E}', '\u{FF61}'];

/// Canonicalize raw input into a registry-valid name
pub fn normalize(raw: &str) -> AttestResult<String> {
    if raw.is_empty() {
        return Err(AttestError::InvalidName("Name cannot be empty".to_string()));
    }

    let folded: String = raw
        .chars()
        .map(|c| if ALTERNATE_STOPS.contains(&c) { '.' } else { c })
        .collect::<String>()
        .to_lowercase()
        .nfc()
        .collect();

    for label in folded.split('.') {
        validate_label(label, raw)?;
    }

    Ok(folded)
}

fn validate_label(label: &str, raw: &str) -> AttestResult<()> {
    if label.is_empty() {
        return Err(AttestError::InvalidName(format!("Empty label in '{}'", raw)));
    }

    let mut leading_underscores = true;
    for c in label.chars() {
        if c == '_' {
            if !leading_underscores {
                return Err(AttestError::InvalidName(format!(
                    "Underscore allowed only at the start of a label: '{}'",
                    raw
                )));
            }
            continue;
        }
        leading_underscores = false;

        if c.is_control() || c.is_whitespace() {
            return Err(AttestError::InvalidName(format!(
                "Disallowed character {:?} in '{}'",
                c, raw
            )));
        }
        if c.is_ascii() && !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '$') {
            return Err(AttestError::InvalidName(format!(
                "Disallowed character {:?} in '{}'",
                c, raw
            )));
        }
    }

    // "xn--" style prefixes are reserved for ASCII labels
    if label.is_ascii() && label.len() >= 4 && &label[2..4] == "--" {
        return Err(AttestError::InvalidName(format!(
            "Label '{}' has hyphens in the third and fourth position",
            label
        )));
    }

    Ok(())
}
