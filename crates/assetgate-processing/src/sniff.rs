//! Content type sniffing and normalisation
//!
//! The declared content type of an upload is never trusted on its own: the
//! type is derived from the leading magic bytes and compared against the
//! declared one.

pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type derived from the leading bytes of `data`.
pub fn sniff(data: &[u8]) -> &'static str {
    infer::get(data)
        .map(|kind| kind.mime_type())
        .unwrap_or(OCTET_STREAM)
}

/// Lowercase, drop parameters and fold common aliases.
pub fn normalize(mime: &str) -> String {
    let base = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match base.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/x-png" => "image/png".to_string(),
        "application/x-pdf" => "application/pdf".to_string(),
        _ => base,
    }
}

/// Declared and sniffed types are compatible when they normalise to the same
/// type or both belong to the `image/*` family.
pub fn compatible(declared: &str, sniffed: &str) -> bool {
    let declared = normalize(declared);
    let sniffed = normalize(sniffed);
    declared == sniffed || (declared.starts_with("image/") && sniffed.starts_with("image/"))
}

/// Final extension of `filename`, lowercased.
pub fn extension(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}
