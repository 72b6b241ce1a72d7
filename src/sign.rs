//! Self-served download-link signing.
//!
//! The S3 backend delegates link signing to the SDK's presigner.  The local
//! and in-memory backends serve photo bytes themselves, so they mint links
//! of the form
//!
//! ```text
//! {public_url}/photos/{photoId}/content?expires={unix}&signature={hex}
//! ```
//!
//! where the signature is HMAC-SHA256 over `{photoId}\n{expires}` keyed by
//! the configured signing secret.  Verification compares signatures in
//! constant time and rejects links past their expiry.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Compute the hex signature for a download link.
pub fn compute_signature(secret: &str, photo_id: &str, expires_unix: u64) -> String {
    let payload = format!("{photo_id}\n{expires_unix}");
    hex::encode(hmac_sha256(secret.as_bytes(), payload.as_bytes()))
}

/// Compare two signature strings in constant time.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// RFC 3986 unreserved characters stay as-is; everything else is encoded.
const PATH_SEGMENT: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build a complete signed download URL.
///
/// `expires_unix` is the absolute expiry (request time + TTL), embedded in
/// the link so clients and tests can read it back directly.
pub fn signed_url(public_url: &str, secret: &str, photo_id: &str, expires_unix: u64) -> String {
    let base = public_url.trim_end_matches('/');
    let signature = compute_signature(secret, photo_id, expires_unix);
    let encoded_id = percent_encoding::utf8_percent_encode(photo_id, PATH_SEGMENT);
    format!("{base}/photos/{encoded_id}/content?expires={expires_unix}&signature={signature}")
}

/// Verify a presented link signature and expiry.
///
/// Returns true only when the signature matches and `now_unix` has not
/// passed the embedded expiry.
pub fn verify(
    secret: &str,
    photo_id: &str,
    expires_unix: u64,
    signature: &str,
    now_unix: u64,
) -> bool {
    if now_unix > expires_unix {
        return false;
    }
    let expected = compute_signature(secret, photo_id, expires_unix);
    constant_time_eq(&expected, signature)
}

// -- Tests --------------------------------------------------------------------
