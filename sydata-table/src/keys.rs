//! Mapping between column names and on-disk keys.
//!
//! Keys must be valid child names and must never collide with reserved
//! names, so `%`, `/` and NUL are percent-escaped, and a name that would
//! start with the reserved prefix, or is exactly `.` or `..`, has its first
//! character escaped. The mapping is a bijection.

use sydata_result::{Error, Result};

use crate::reserved::RESERVED_PREFIX;

fn push_escaped(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    for b in c.encode_utf8(&mut buf).bytes() {
        out.push_str(&format!("%{b:02X}"));
    }
}

/// On-disk key for column `name`.
pub fn sanitize_key(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(Error::InvalidArgumentError(
            "column name must not be empty".into(),
        ));
    }
    let escape_first = name.starts_with(RESERVED_PREFIX) || name == "." || name == "..";
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if matches!(c, '%' | '/' | '\0') || (i == 0 && escape_first) {
            push_escaped(&mut out, c);
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// Column name for on-disk `key`.
pub fn unsanitize_key(key: &str) -> Result<String> {
    let bytes = key.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = key
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| {
                    Error::InvalidArgumentError(format!("malformed column key '{key}'"))
                })?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out)
        .map_err(|_| Error::InvalidArgumentError(format!("malformed column key '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reserved::is_reserved_key;

    #[test]
    fn plain_names_are_unchanged() {
        assert_eq!(sanitize_key("speed").unwrap(), "speed");
        assert_eq!(sanitize_key("a b_c").unwrap(), "a b_c");
    }

    #[test]
    fn special_characters_round_trip() {
        for name in ["a/b", "100%", "%2F", "__sy_order__", ".", "..", "...", "x\0y", "ü/ö"] {
            let key = sanitize_key(name).unwrap();
            assert!(!key.contains('/'), "{key}");
            assert!(!is_reserved_key(&key), "{key}");
            assert_ne!(key, ".");
            assert_ne!(key, "..");
            assert_eq!(unsanitize_key(&key).unwrap(), name);
        }
    }

    #[test]
    fn distinct_names_get_distinct_keys() {
        let a = sanitize_key("a/b").unwrap();
        let b = sanitize_key("a%2Fb").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_and_malformed_inputs_are_rejected() {
        assert!(sanitize_key("").is_err());
        assert!(unsanitize_key("abc%2").is_err());
        assert!(unsanitize_key("%zz").is_err());
    }
}
