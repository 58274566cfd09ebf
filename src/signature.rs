use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Validate the `x-line-signature` header against the channel secret.
///
/// The expected value is the base64-encoded HMAC-SHA256 digest of the raw
/// request body, byte-for-byte as it arrived on the wire. Callers must hand
/// the same untouched bytes to the event extractor afterwards; verifying a
/// re-serialized body breaks the protocol.
pub fn verify(channel_secret: &str, signature: &str, body: &[u8]) -> bool {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());
    expected == signature
}
