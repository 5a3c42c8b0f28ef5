//! Shared path generation for storage backends.
//!
//! Path format: `{category_dir}/{owner_id}/{YYYY}/{MM}/{secure_filename}` with
//! `secure_filename = {prefix}_{owner}_{YYYYmmdd_HHMMSS}_{hash16}.{ext}`.

use chrono::{DateTime, Datelike, Utc};
use sha2::{Digest, Sha256};

/// Whether `segment` may be used verbatim as an owner id or filename prefix.
///
/// Allowed characters are `[A-Za-z0-9._-]`; a leading dot is refused so a
/// segment can never be `.` or `..`.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.len() <= 128
        && !segment.starts_with('.')
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// Generate an unguessable filename for a stored upload.
///
/// `hash16` is the first 16 hex characters of SHA-256 over the original
/// filename, the source content hash, the timestamp and the owner id.
pub fn secure_filename(
    prefix: &str,
    owner_id: &str,
    original_filename: &str,
    source_hash: &str,
    timestamp: DateTime<Utc>,
    extension: &str,
) -> String {
    let stamp = timestamp.format("%Y%m%d_%H%M%S").to_string();
    let owner = sanitize_segment(owner_id);

    let mut hasher = Sha256::new();
    hasher.update(original_filename.as_bytes());
    hasher.update(source_hash.as_bytes());
    hasher.update(stamp.as_bytes());
    hasher.update(owner.as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!(
        "{}_{}_{}_{}.{}",
        sanitize_segment(prefix),
        owner,
        stamp,
        &digest[..16],
        extension.trim_start_matches('.')
    )
}

/// Generate the relative storage path for a file.
pub fn storage_path(
    category_dir: &str,
    owner_id: &str,
    timestamp: DateTime<Utc>,
    filename: &str,
) -> String {
    format!(
        "{}/{}/{:04}/{:02}/{}",
        category_dir,
        sanitize_segment(owner_id),
        timestamp.year(),
        timestamp.month(),
        filename
    )
}

/// Filename of a derived variant: `{variant}_{stem}.{ext}`.
pub fn variant_filename(variant: &str, secure_filename: &str, extension: &str) -> String {
    let stem = secure_filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(secure_filename);
    format!("{}_{}.{}", variant, stem, extension.trim_start_matches('.'))
}
