//! Domain errors raised by the core.
//!
//! Every error a request can surface maps to exactly one of these kinds;
//! the HTTP layer translates kinds to status codes.

use crate::types::Nonce;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Malformed input: bad JSON shape, undecodable base58/base64, missing
    /// fields.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Signature does not verify against the claimed signer's key.
    #[error("signature verification failed")]
    BadSignature,

    /// Nonce is not strictly above the last consumed one.
    #[error("nonce {0} already consumed")]
    NonceConsumed(Nonce),

    /// Signer lacks the role the action requires.
    #[error("not allowed")]
    NotAllowed,

    /// Request is well-formed and authorized but violates a data invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// No such route or entity.
    #[error("not found")]
    NotFound,

    /// Storage or runtime failure local to the server.
    #[error("internal error: {0}")]
    Internal(String),
}
