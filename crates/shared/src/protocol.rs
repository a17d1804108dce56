//! Conventions shared with the document generation endpoint: the request is a
//! JSON object of form fields, the response carries the document bytes with an
//! optional `Content-Disposition` naming the file.

pub const DEFAULT_DOWNLOAD_FILENAME: &str = "generated_paper.docx";

pub const MAX_FILENAME_BYTES: usize = 180;

const ATTACHMENT_TOKEN: &str = "attachment";
const FILENAME_PARAM: &str = "filename=\"";

/// Extracts the quoted filename from a `Content-Disposition` header value.
/// Only `attachment` dispositions count; anything else yields `None`.
pub fn attachment_filename(disposition: &str) -> Option<String> {
    if !disposition.contains(ATTACHMENT_TOKEN) {
        return None;
    }
    let start = disposition.find(FILENAME_PARAM)? + FILENAME_PARAM.len();
    let rest = &disposition[start..];
    let end = rest.find('"')?;
    if end == 0 {
        return None;
    }
    Some(rest[..end].to_string())
}

/// Picks the filename a downloaded document should be saved under. Falls back
/// to `default_filename` when the header is absent, unparseable, or names
/// something unsafe to write locally.
pub fn resolve_download_filename(disposition: Option<&str>, default_filename: &str) -> String {
    disposition
        .and_then(attachment_filename)
        .filter(|name| is_safe_filename(name))
        .unwrap_or_else(|| default_filename.to_string())
}

// Path separators and oversized names are rejected rather than sanitized.
fn is_safe_filename(name: &str) -> bool {
    !name.trim().is_empty()
        && name.len() <= MAX_FILENAME_BYTES
        && !name.contains('/')
        && !name.contains('\\')
}
