//! Bootstrap state applied once at startup.
//!
//! Role files seed the admin and moderator sets without authorization, and
//! genesis balances are written as proof records with the reserved proof id
//! `"0"`, bypassing the per-proof balance limit. None of this is reachable
//! through the signed-action surface.

use serde::Deserialize;

use crate::error::Error;
use crate::roles::RoleStore;
use crate::store::{ProofRecord, TrustStore};
use crate::types::{unix_timestamp, IdtAmount, UserId};

/// Proof id reserved for genesis balances.
pub const GENESIS_PROOF_ID: &str = "0";

/// One entry of `genesis.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenesisBalance {
    pub user: UserId,
    pub idt: IdtAmount,
}

/// Write each genesis balance as a proof record. The proof balance limit
/// does not apply here.
pub fn apply_genesis(trust: &dyn TrustStore, balances: &[GenesisBalance]) -> Result<(), Error> {
    let timestamp = unix_timestamp();
    for entry in balances {
        trust.set_proof(
            entry.user,
            ProofRecord {
                moderator: None,
                balance: entry.idt,
                proof_id: GENESIS_PROOF_ID.to_string(),
                timestamp,
            },
        )?;
    }
    Ok(())
}

/// Seed the admin set.
pub fn apply_admins(roles: &dyn RoleStore, users: &[UserId]) -> Result<(), Error> {
    for user in users {
        roles.bootstrap_admin(*user)?;
    }
    Ok(())
}

/// Seed the moderator set.
pub fn apply_moderators(roles: &dyn RoleStore, users: &[UserId]) -> Result<(), Error> {
    for user in users {
        roles.bootstrap_moderator(*user)?;
    }
    Ok(())
}
