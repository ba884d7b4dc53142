/// Normalizes a distribution name: lowercase, with every run of `-`, `_` and
/// `.` collapsed into a single `-`.
pub fn normalize_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut in_separator = false;

    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !in_separator {
                result.push('-');
                in_separator = true;
            }
            continue;
        }

        in_separator = false;
        result.extend(ch.to_lowercase());
    }

    result
}

/// A valid name starts and ends with an ASCII letter or digit and contains
/// only letters, digits, `-`, `_` and `.` in between.
pub fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();

    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return false;
    }

    bytes
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

pub(crate) fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')
}
