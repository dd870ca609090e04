//! Rules for editing a customer's extension policy.
//!
//! A policy has two parts: a fixed list of well-known risky extensions that
//! each customer toggles on or off, and a free list of custom extensions
//! that are always blocked.

use crate::error::PolicyEditError;

/// Extensions every customer can toggle
pub const FIXED_EXTENSIONS: [&str; 7] = ["bat", "cmd", "com", "cpl", "exe", "scr", "js"];

pub const MAX_CUSTOM_EXTENSIONS: usize = 200;
pub const MAX_CUSTOM_EXTENSION_LEN: usize = 20;

pub fn is_fixed_extension(ext: &str) -> bool {
    FIXED_EXTENSIONS.contains(&ext)
}

/// Check a fixed-extension toggle target
pub fn validate_fixed_extension(input: &str) -> Result<String, PolicyEditError> {
    let ext = input.trim().to_lowercase();
    if is_fixed_extension(&ext) {
        Ok(ext)
    } else {
        Err(PolicyEditError::NotFixed(ext))
    }
}

/// Clean and check a custom extension against the customer's current
/// policy. Returns the cleaned name.
pub fn validate_custom_extension<'a, I>(
    input: &str,
    existing: I,
) -> Result<String, PolicyEditError>
where
    I: IntoIterator<Item = &'a str>,
{
    let ext = input.trim().to_lowercase();

    if ext.is_empty() {
        return Err(PolicyEditError::Empty);
    }
    let len = ext.chars().count();
    if len > MAX_CUSTOM_EXTENSION_LEN {
        return Err(PolicyEditError::TooLong {
            len,
            max: MAX_CUSTOM_EXTENSION_LEN,
        });
    }
    if !ext.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return Err(PolicyEditError::InvalidCharacters(ext));
    }
    if is_fixed_extension(&ext) {
        return Err(PolicyEditError::FixedExtension(ext));
    }

    let mut count = 0;
    for current in existing {
        if current == ext {
            return Err(PolicyEditError::Duplicate(ext));
        }
        count += 1;
    }
    if count >= MAX_CUSTOM_EXTENSIONS {
        return Err(PolicyEditError::LimitReached {
            max: MAX_CUSTOM_EXTENSIONS,
        });
    }

    Ok(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_extension_cleaned() {
        assert_eq!(validate_custom_extension("  SH ", []).unwrap(), "sh");
        assert_eq!(validate_custom_extension("mp4", ["sh"]).unwrap(), "mp4");
    }

    #[test]
    fn test_custom_extension_rejections() {
        assert_eq!(validate_custom_extension("   ", []), Err(PolicyEditError::Empty));
        assert_eq!(
            validate_custom_extension(&"a".repeat(21), []),
            Err(PolicyEditError::TooLong { len: 21, max: 20 })
        );
        assert!(validate_custom_extension(&"a".repeat(20), []).is_ok());
        assert_eq!(
            validate_custom_extension("tar.gz", []),
            Err(PolicyEditError::InvalidCharacters("tar.gz".into()))
        );
        assert_eq!(
            validate_custom_extension("EXE", []),
            Err(PolicyEditError::FixedExtension("exe".into()))
        );
        assert_eq!(
            validate_custom_extension("sh", ["ju", "sh"]),
            Err(PolicyEditError::Duplicate("sh".into()))
        );
    }

    #[test]
    fn test_custom_extension_limit() {
        let existing: Vec<String> = (0..MAX_CUSTOM_EXTENSIONS).map(|i| format!("x{i}")).collect();
        let result = validate_custom_extension("new", existing.iter().map(String::as_str));
        assert_eq!(result, Err(PolicyEditError::LimitReached { max: 200 }));

        let result = validate_custom_extension("new", existing.iter().skip(1).map(String::as_str));
        assert!(result.is_ok());
    }

    #[test]
    fn test_fixed_extension() {
        assert_eq!(validate_fixed_extension("EXE").unwrap(), "exe");
        assert_eq!(
            validate_fixed_extension("sh"),
            Err(PolicyEditError::NotFixed("sh".into()))
        );
    }
}
