//! Canonical action messages and Ed25519 signature handling.
//!
//! Every mutating action is authenticated by an Ed25519 signature over a
//! canonical message: the action name and its fields joined with `/`. The
//! target identity appears in the message exactly as it was written in the
//! URL path, so signer and server never disagree on the bytes being signed.
//!
//! Signatures travel base64-encoded; identities travel base58-encoded.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::Error;
use crate::types::{IdtAmount, Nonce, UserId};

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

// =============================================================================
// CANONICAL MESSAGES
// =============================================================================

/// `vouch/<user>/<nonce>`
pub fn vouch_message(user: &str, nonce: Nonce) -> String {
    format!("vouch/{user}/{nonce}")
}

/// `proof/<user>/<nonce>/<balance>/<proof_id>`
pub fn proof_message(user: &str, nonce: Nonce, balance: IdtAmount, proof_id: &str) -> String {
    format!("proof/{user}/{nonce}/{balance}/{proof_id}")
}

/// `punish/<user>/<nonce>/<balance>/<proof_id>`
pub fn punish_message(user: &str, nonce: Nonce, balance: IdtAmount, proof_id: &str) -> String {
    format!("punish/{user}/{nonce}/{balance}/{proof_id}")
}

/// `moderators/<user>/<nonce>` (shared by add and remove)
pub fn moderators_message(user: &str, nonce: Nonce) -> String {
    format!("moderators/{user}/{nonce}")
}

/// `admins/<user>/<nonce>` (shared by add and remove)
pub fn admins_message(user: &str, nonce: Nonce) -> String {
    format!("admins/{user}/{nonce}")
}

// =============================================================================
// KEYPAIRS
// =============================================================================

/// Generate a fresh Ed25519 keypair. Used by clients and tests; the server
/// itself only verifies.
pub fn generate_keypair() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}

/// Identity of a keypair: its public key.
pub fn keypair_user_id(keypair: &SigningKey) -> UserId {
    UserId::from_bytes(keypair.verifying_key().to_bytes())
}

// =============================================================================
// SIGNING & VERIFICATION
// =============================================================================

/// Sign a canonical message.
pub fn sign_message(keypair: &SigningKey, message: &str) -> [u8; SIGNATURE_LENGTH] {
    keypair.sign(message.as_bytes()).to_bytes()
}

/// Verify a signature over a canonical message against the claimed signer.
pub fn verify_message(
    signer: &UserId,
    message: &str,
    signature: &[u8; SIGNATURE_LENGTH],
) -> Result<(), Error> {
    let key = VerifyingKey::from_bytes(signer.as_bytes()).map_err(|_| Error::BadSignature)?;
    let signature = Signature::from_bytes(signature);
    key.verify(message.as_bytes(), &signature)
        .map_err(|_| Error::BadSignature)
}

/// Decode a base64 wire signature.
pub fn decode_signature(encoded: &str) -> Result<[u8; SIGNATURE_LENGTH], Error> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| Error::BadRequest(format!("invalid base64 signature: {e}")))?;
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(Error::BadRequest(format!(
            "signature must be {SIGNATURE_LENGTH} bytes, got {}",
            bytes.len()
        )));
    }
    let mut raw = [0u8; SIGNATURE_LENGTH];
    raw.copy_from_slice(&bytes);
    Ok(raw)
}

/// Encode a signature for the wire.
pub fn encode_signature(signature: &[u8; SIGNATURE_LENGTH]) -> String {
    BASE64.encode(signature)
}
