//! Replay prevention.
//!
//! Each signer has an independent nonce sequence per action namespace. Only
//! the most recent consumed nonce is stored; a new nonce is accepted iff it
//! is strictly greater, which forces clients to use increasing nonces.
//!
//! Note: `punish` actions consume from the `proof` namespace. This matches
//! the deployed wire behavior and is covered by tests; see DESIGN.md.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Error;
use crate::types::{Nonce, UserId};

/// Independent nonce sequences. There is deliberately no `Punish` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonceNamespace {
    Vouch,
    Proof,
    Moderators,
    Admins,
}

impl NonceNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            NonceNamespace::Vouch => "vouch",
            NonceNamespace::Proof => "proof",
            NonceNamespace::Moderators => "moderators",
            NonceNamespace::Admins => "admins",
        }
    }
}

/// Replay-prevention store.
///
/// Implementations must keep queries fail-safe: if the backing store ever
/// holds conflicting records for one `(namespace, signer)` key, the nonce
/// must read as consumed.
pub trait NonceRegistry: Send + Sync {
    /// True iff a record exists for `(namespace, signer)` with a stored
    /// nonce greater than or equal to `nonce`.
    fn is_consumed(&self, namespace: NonceNamespace, signer: &UserId, nonce: Nonce)
        -> Result<bool, Error>;

    /// Record `nonce` as the latest consumed value for `(namespace, signer)`.
    fn consume(&self, namespace: NonceNamespace, signer: &UserId, nonce: Nonce)
        -> Result<(), Error>;
}

#[derive(Default)]
pub struct InMemoryNonceRegistry {
    used: RwLock<HashMap<(NonceNamespace, UserId), Nonce>>,
}

impl InMemoryNonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NonceRegistry for InMemoryNonceRegistry {
    fn is_consumed(
        &self,
        namespace: NonceNamespace,
        signer: &UserId,
        nonce: Nonce,
    ) -> Result<bool, Error> {
        let used = self
            .used
            .read()
            .map_err(|_| Error::Internal("nonce registry lock poisoned".into()))?;
        Ok(used
            .get(&(namespace, *signer))
            .is_some_and(|stored| *stored >= nonce))
    }

    fn consume(
        &self,
        namespace: NonceNamespace,
        signer: &UserId,
        nonce: Nonce,
    ) -> Result<(), Error> {
        let mut used = self
            .used
            .write()
            .map_err(|_| Error::Internal("nonce registry lock poisoned".into()))?;
        used.insert((namespace, *signer), nonce);
        Ok(())
    }
}
