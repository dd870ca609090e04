//! Extension normalization and compatibility groups.
//!
//! Every extension comparison in the crate goes through [`normalize`] first.

/// Historical spellings folded onto one canonical form
const ALIASES: &[(&str, &str)] = &[("jpeg", "jpg"), ("tiff", "tif"), ("mpeg", "mpg")];

/// One-off spellings of the same format
const JPEG_GROUP: &[&str] = &["jpg", "jpeg"];
const TIFF_GROUP: &[&str] = &["tif", "tiff"];
const MPEG_GROUP: &[&str] = &["mpg", "mpeg"];
const HTML_GROUP: &[&str] = &["htm", "html"];
const GZIP_GROUP: &[&str] = &["gz", "tgz"];

/// Formats that are ZIP containers on disk
const ZIP_GROUP: &[&str] = &[
    "zip", "docx", "xlsx", "pptx", "odt", "ods", "odp", "jar", "apk", "epub",
];

/// Extensions a plain-text payload may carry. `text` leads because it is the
/// type the text heuristic reports.
///
/// Not a compatibility group: a script named `.txt` is still a disguise.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "text", "txt", "csv", "tsv", "log", "md", "json", "xml", "yaml", "yml", "toml", "ini",
    "cfg", "conf", "html", "htm", "css", "js", "ts", "sh", "bash", "py", "pl", "rb", "sql",
    "svg", "rtf",
];

/// Sets of extensions treated as the same real type
pub const COMPATIBILITY_GROUPS: &[&[&str]] = &[
    JPEG_GROUP, TIFF_GROUP, MPEG_GROUP, HTML_GROUP, ZIP_GROUP, GZIP_GROUP,
];

/// Canonicalize an extension: lower-case, drop leading dots, fold aliases.
///
/// Idempotent for every input; `""` maps to `""`.
pub fn normalize(ext: &str) -> String {
    let lowered = ext.to_lowercase();
    // All of them, so that a second pass has nothing left to strip
    let stripped = lowered.trim_start_matches('.');

    ALIASES
        .iter()
        .find(|(alias, _)| *alias == stripped)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or_else(|| stripped.to_string())
}

/// True iff `a` and `b` share a compatibility group. Inputs are expected to
/// be normalized already.
pub fn are_compatible(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    COMPATIBILITY_GROUPS
        .iter()
        .any(|group| group.contains(&a) && group.contains(&b))
}

/// Normalized extension of a filename, or `""` when there is none.
pub fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => normalize(ext),
        _ => String::new(),
    }
}
