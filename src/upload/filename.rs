//! Filename sanitisation

use unicode_normalization::UnicodeNormalization;

/// Name used when an upload carries no usable filename
pub const DEFAULT_FILENAME: &str = "document.pdf";

/// True when `filename` ends in `.pdf`, ignoring case
pub fn has_pdf_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Reduce a client-supplied filename to a safe ASCII name
///
/// The name is NFKD-normalised and stripped to ASCII, path separators
/// become spaces, whitespace runs are joined with `_`, and anything outside
/// `[A-Za-z0-9_.-]` is dropped. Leading and trailing `.` and `_` are
/// removed. Returns [`DEFAULT_FILENAME`] if nothing is left.
pub fn sanitize_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}
