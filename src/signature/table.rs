//! Signature table for upload inspection.
//!
//! Each rule defines magic bytes, the offset they appear at, and the
//! extensions a file carrying them may legitimately use. Rules are tried in
//! declaration order and the first match wins, so a more specific pattern
//! must come before any shorter pattern it overlaps with.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of content a signature identifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Executable,
    Script,
    Image,
    Document,
    Archive,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Executable => "executable",
            Category::Script => "script",
            Category::Image => "image",
            Category::Document => "document",
            Category::Archive => "archive",
        }
    }

    /// Categories whose content runs when opened
    pub fn is_active_content(&self) -> bool {
        matches!(self, Category::Executable | Category::Script)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file format signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRule {
    pub description: &'static str,
    /// Magic bytes
    pub pattern: &'static [u8],
    /// Offset from start where the pattern appears
    pub offset: usize,
    /// Extensions this content may carry; the first is the detected type
    pub candidates: &'static [&'static str],
    pub category: Category,
}

impl SignatureRule {
    /// Extension reported as the detected type when this rule matches
    pub fn detected_extension(&self) -> &'static str {
        // Every rule in the table lists at least one candidate
        self.candidates.first().copied().unwrap_or("unknown")
    }

    /// Whether `buffer` carries this rule's pattern at its offset. Buffers too
    /// short to hold the pattern do not match.
    pub fn matches(&self, buffer: &[u8]) -> bool {
        let end = self.offset + self.pattern.len();
        buffer.get(self.offset..end) == Some(self.pattern)
    }
}

/// All known signatures in match order
pub static SIGNATURES: &[SignatureRule] = &[
    // === Executables ===
    SignatureRule {
        description: "PE Executable (Windows)",
        pattern: &[0x4D, 0x5A],
        offset: 0,
        candidates: &["exe", "dll", "sys"],
        category: Category::Executable,
    },
    SignatureRule {
        description: "ELF Executable (Linux)",
        pattern: &[0x7F, 0x45, 0x4C, 0x46],
        offset: 0,
        candidates: &["elf", "bin", "so"],
        category: Category::Executable,
    },
    SignatureRule {
        description: "Mach-O Executable (macOS, 32-bit)",
        pattern: &[0xFE, 0xED, 0xFA, 0xCE],
        offset: 0,
        candidates: &["macho"],
        category: Category::Executable,
    },
    SignatureRule {
        description: "Mach-O Executable (macOS, 64-bit)",
        pattern: &[0xCF, 0xFA, 0xED, 0xFE],
        offset: 0,
        candidates: &["macho"],
        category: Category::Executable,
    },
    SignatureRule {
        description: "Java Class File",
        pattern: &[0xCA, 0xFE, 0xBA, 0xBE],
        offset: 0,
        candidates: &["class"],
        category: Category::Executable,
    },
    // === Scripts ===
    SignatureRule {
        description: "Script File with Shebang",
        pattern: b"#!",
        offset: 0,
        candidates: &["sh", "bash", "pl", "py"],
        category: Category::Script,
    },
    // === Images ===
    SignatureRule {
        description: "JPEG Image",
        pattern: &[0xFF, 0xD8, 0xFF],
        offset: 0,
        candidates: &["jpg", "jpeg"],
        category: Category::Image,
    },
    SignatureRule {
        description: "PNG Image",
        pattern: &[0x89, 0x50, 0x4E, 0x47],
        offset: 0,
        candidates: &["png"],
        category: Category::Image,
    },
    SignatureRule {
        description: "GIF87a Image",
        pattern: b"GIF87a",
        offset: 0,
        candidates: &["gif"],
        category: Category::Image,
    },
    SignatureRule {
        description: "GIF89a Image",
        pattern: b"GIF89a",
        offset: 0,
        candidates: &["gif"],
        category: Category::Image,
    },
    // === Documents ===
    SignatureRule {
        description: "PDF Document",
        pattern: b"%PDF",
        offset: 0,
        candidates: &["pdf"],
        category: Category::Document,
    },
    SignatureRule {
        // Office Open XML formats are ZIP containers and reach this rule
        // through the zip compatibility group
        description: "ZIP Archive / Office Document",
        pattern: &[0x50, 0x4B, 0x03, 0x04],
        offset: 0,
        candidates: &["zip"],
        category: Category::Archive,
    },
    SignatureRule {
        description: "OLE Compound Document (legacy Office, MSI)",
        pattern: &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1],
        offset: 0,
        candidates: &["doc", "xls", "ppt", "msi"],
        category: Category::Document,
    },
    // === Archives ===
    SignatureRule {
        description: "RAR Archive",
        pattern: &[0x52, 0x61, 0x72, 0x21, 0x1A, 0x07],
        offset: 0,
        candidates: &["rar"],
        category: Category::Archive,
    },
    SignatureRule {
        description: "7-Zip Archive",
        pattern: &[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C],
        offset: 0,
        candidates: &["7z"],
        category: Category::Archive,
    },
    SignatureRule {
        description: "GZIP Archive",
        pattern: &[0x1F, 0x8B],
        offset: 0,
        candidates: &["gz", "tgz"],
        category: Category::Archive,
    },
];

/// Longest `offset + pattern` span in the table
pub fn max_signature_span() -> usize {
    SIGNATURES
        .iter()
        .map(|rule| rule.offset + rule.pattern.len())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::normalize;

    #[test]
    fn test_every_rule_has_candidates() {
        for rule in SIGNATURES {
            assert!(!rule.candidates.is_empty(), "{} has no candidates", rule.description);
            assert!(!rule.pattern.is_empty(), "{} has no pattern", rule.description);
        }
    }

    #[test]
    fn test_detected_extensions_are_normalized() {
        for rule in SIGNATURES {
            let ext = rule.detected_extension();
            assert_eq!(normalize(ext), ext, "{} reports a non-canonical type", rule.description);
        }
    }

    #[test]
    fn test_short_buffer_does_not_match() {
        let ole = SIGNATURES
            .iter()
            .find(|r| r.description.starts_with("OLE"))
            .unwrap();
        assert!(!ole.matches(&[0xD0, 0xCF, 0x11]));
        assert!(!ole.matches(&[]));
    }

    #[test]
    fn test_category_serde() {
        assert_eq!(serde_json::to_string(&Category::Executable).unwrap(), "\"executable\"");
        assert!(Category::Script.is_active_content());
        assert!(!Category::Image.is_active_content());
    }

    #[test]
    fn test_max_span() {
        assert_eq!(max_signature_span(), 8);
    }
}
