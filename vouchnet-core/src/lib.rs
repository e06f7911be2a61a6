//! vouchnet-core: trust-graph evaluation and the signed-action pipeline of
//! the vouchnet identity reputation server.
//!
//! The crate is organized around a few narrow capabilities:
//!
//! - [`crypto`]: canonical action messages and Ed25519 verification
//! - [`nonce`]: per-namespace replay prevention
//! - [`roles`]: admin and moderator sets
//! - [`store`]: vouches, proofs and penalties behind a repository trait
//! - [`engine`]: the cycle-safe IDT and penalty evaluator
//! - [`service`]: the verify / authorize / mutate / re-evaluate pipeline
//! - [`genesis`]: startup-only bootstrap ingestion
//!
//! The HTTP surface lives in the `vouchnet-server` crate.

pub mod crypto;
pub mod engine;
pub mod error;
pub mod genesis;
pub mod nonce;
pub mod roles;
pub mod service;
pub mod store;
pub mod types;

pub use error::Error;
pub use types::{IdtAmount, Nonce, ProofId, UserId};

#[cfg(test)]
mod tests;
