use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::constants::FORM_TOKEN_PREFIX;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Anti-Forgery Tokens
// =============================================================================

/// Compute the hex-encoded HMAC-SHA256 of `data` under `secret`
pub fn sign_hmac(data: &str, secret: &str) -> Option<String> {
    let mut mac = match <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return None;
        }
    };
    mac.update(data.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verify HMAC-SHA256 signature
///
/// # Arguments
/// * `data` - The data that was signed
/// * `signature` - The hex-encoded HMAC signature
/// * `secret` - The shared secret key (from environment)
///
/// Comparison is constant-time.
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    // Create HMAC instance with secret key
    let mut mac = match <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    mac.verify_slice(&sig_bytes).is_ok()
}

/// Issue the anti-forgery token embedded in every form for `owner_id`
///
/// The token is bound to the session's owner identifier, so a form rendered
/// for one user cannot be replayed by a page acting on behalf of another.
pub fn form_token(owner_id: &str, secret: &str) -> Option<String> {
    sign_hmac(&format!("{}{}", FORM_TOKEN_PREFIX, owner_id), secret)
}

/// Check a submitted anti-forgery token
pub fn verify_form_token(owner_id: &str, token: &str, secret: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    verify_hmac(&format!("{}{}", FORM_TOKEN_PREFIX, owner_id), token, secret)
}
