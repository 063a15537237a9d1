use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use crate::hex::hex_encode;

/// Number of random bytes prefixed to stored filenames (8 hex characters).
const TOKEN_BYTES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("filename is empty after sanitization")]
pub struct InvalidNameError;

/// Sanitize a user-provided filename so it can be used as a single
/// filesystem leaf name.
///
/// The result only contains `[A-Za-z0-9._-]` and never starts or ends with
/// `.` or `-`. Extension case is preserved.
pub fn sanitize_filename(name: &str) -> Result<String, InvalidNameError> {
    // 1. Trim whitespace
    let name = name.trim();

    // 2. Take only the last path component (strip directories)
    let name = name.trim_end_matches(['/', '\\']);
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);

    // 3. Spaces become underscores
    // 4. Drop everything outside the allowed ASCII set
    let sanitized: String = name
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    // 5. Strip leading/trailing dots and hyphens (hidden files, flag-like names)
    let sanitized = sanitized.trim_matches(['.', '-']);

    if sanitized.is_empty() {
        return Err(InvalidNameError);
    }

    Ok(sanitized.to_string())
}

/// Split a sanitized name into `(stem, extension)`, where the extension keeps
/// its leading dot and is empty when there is none.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name, ""),
    }
}

/// Sanitize `name` and prefix it with a random hex token so concurrent uploads
/// of identically named files do not overwrite each other.
///
/// `"profile.png"` becomes something like `"3fa9c01e_profile.png"`.
pub fn unique_filename(name: &str) -> Result<String, InvalidNameError> {
    let sanitized = sanitize_filename(name)?;
    let (stem, extension) = split_extension(&sanitized);

    let mut token = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut token);

    Ok(format!("{}_{}{}", hex_encode(&token), stem, extension))
}
