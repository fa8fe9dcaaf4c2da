use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Computes the `Content-MD5` value (base64-encoded MD5 digest) for a
/// request body, per RFC 1864. Import is idempotent on this value. Its
/// cryptographic strength is irrelevant here; it's an opaque token, not a
/// security control.
pub fn content_md5_base64(bytes: &[u8]) -> String {
    let digest = md5::compute(bytes);
    STANDARD.encode(digest.0)
}
