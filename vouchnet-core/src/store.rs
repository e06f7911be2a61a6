//! Trust state: vouches, proofs and penalties.
//!
//! The store is a narrow repository trait so the engine and services do not
//! care what backs it; the shipped implementation is in-memory. Reads used
//! for IDT evaluation go through [`TrustStore::snapshot`], which hands out an
//! owned, logically consistent copy of the whole state, so a walk never
//! observes a half-applied action.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::Error;
use crate::types::{IdtAmount, ProofId, UserId};

/// A moderator-granted balance for a user. `moderator` is `None` only for
/// genesis records loaded at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofRecord {
    pub moderator: Option<UserId>,
    pub balance: IdtAmount,
    pub proof_id: ProofId,
    pub timestamp: u64,
}

/// A moderator-issued penalty, keyed by `proof_id`. A user can accumulate
/// any number of penalties; re-using a `proof_id` overwrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyRecord {
    pub user: UserId,
    pub moderator: UserId,
    pub balance: IdtAmount,
    pub proof_id: ProofId,
    pub timestamp: u64,
}

pub trait TrustStore: Send + Sync {
    /// Upsert a vouch edge `voucher -> vouchee`. Re-vouching only refreshes
    /// the timestamp.
    fn insert_vouch(&self, voucher: UserId, vouchee: UserId, timestamp: u64) -> Result<(), Error>;

    /// All `(voucher, timestamp)` edges pointing at `user`.
    fn incoming_vouches(&self, user: &UserId) -> Result<Vec<(UserId, u64)>, Error>;

    /// All `(vouchee, timestamp)` edges leaving `user`.
    fn outgoing_vouches(&self, user: &UserId) -> Result<Vec<(UserId, u64)>, Error>;

    fn proof_of(&self, user: &UserId) -> Result<Option<ProofRecord>, Error>;

    /// Upsert the proof record for `user`. No balance bound is enforced
    /// here; the action layer enforces it, and genesis loads bypass it.
    fn set_proof(&self, user: UserId, record: ProofRecord) -> Result<(), Error>;

    /// All penalties targeting `user`.
    fn penalties_of(&self, user: &UserId) -> Result<Vec<PenaltyRecord>, Error>;

    /// Upsert a penalty by its `proof_id`.
    fn insert_penalty(&self, record: PenaltyRecord) -> Result<(), Error>;

    /// Owned, consistent copy of the whole trust state.
    fn snapshot(&self) -> Result<TrustSnapshot, Error>;
}

/// Complete trust state. Maps are ordered so iteration, and therefore IDT
/// evaluation, is deterministic for a given state.
#[derive(Debug, Clone, Default)]
pub struct TrustSnapshot {
    // vouchee -> voucher -> timestamp
    vouchers: BTreeMap<UserId, BTreeMap<UserId, u64>>,
    // voucher -> vouchee -> timestamp
    vouchees: BTreeMap<UserId, BTreeMap<UserId, u64>>,
    proofs: BTreeMap<UserId, ProofRecord>,
    penalties: BTreeMap<ProofId, PenaltyRecord>,
}

impl TrustSnapshot {
    /// Users vouching for `user`, in byte order.
    pub fn vouchers_of(&self, user: &UserId) -> Vec<UserId> {
        self.vouchers
            .get(user)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Users `user` vouches for, in byte order.
    pub fn vouchees_of(&self, user: &UserId) -> Vec<UserId> {
        self.vouchees
            .get(user)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn proof(&self, user: &UserId) -> Option<&ProofRecord> {
        self.proofs.get(user)
    }

    /// Sum of all penalty balances recorded directly against `user`.
    pub fn direct_penalty(&self, user: &UserId) -> IdtAmount {
        self.penalties
            .values()
            .filter(|p| p.user == *user)
            .fold(0, |sum, p| sum.saturating_add(p.balance))
    }

    fn vouch(&mut self, voucher: UserId, vouchee: UserId, timestamp: u64) {
        self.vouchers
            .entry(vouchee)
            .or_default()
            .insert(voucher, timestamp);
        self.vouchees
            .entry(voucher)
            .or_default()
            .insert(vouchee, timestamp);
    }
}

#[derive(Default)]
pub struct InMemoryTrustStore {
    inner: RwLock<TrustSnapshot>,
}

impl InMemoryTrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, TrustSnapshot>, Error> {
        self.inner
            .read()
            .map_err(|_| Error::Internal("trust store lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, TrustSnapshot>, Error> {
        self.inner
            .write()
            .map_err(|_| Error::Internal("trust store lock poisoned".into()))
    }
}

impl TrustStore for InMemoryTrustStore {
    fn insert_vouch(&self, voucher: UserId, vouchee: UserId, timestamp: u64) -> Result<(), Error> {
        self.write()?.vouch(voucher, vouchee, timestamp);
        Ok(())
    }

    fn incoming_vouches(&self, user: &UserId) -> Result<Vec<(UserId, u64)>, Error> {
        Ok(self
            .read()?
            .vouchers
            .get(user)
            .map(|m| m.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default())
    }

    fn outgoing_vouches(&self, user: &UserId) -> Result<Vec<(UserId, u64)>, Error> {
        Ok(self
            .read()?
            .vouchees
            .get(user)
            .map(|m| m.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default())
    }

    fn proof_of(&self, user: &UserId) -> Result<Option<ProofRecord>, Error> {
        Ok(self.read()?.proofs.get(user).cloned())
    }

    fn set_proof(&self, user: UserId, record: ProofRecord) -> Result<(), Error> {
        self.write()?.proofs.insert(user, record);
        Ok(())
    }

    fn penalties_of(&self, user: &UserId) -> Result<Vec<PenaltyRecord>, Error> {
        Ok(self
            .read()?
            .penalties
            .values()
            .filter(|p| p.user == *user)
            .cloned()
            .collect())
    }

    fn insert_penalty(&self, record: PenaltyRecord) -> Result<(), Error> {
        self.write()?
            .penalties
            .insert(record.proof_id.clone(), record);
        Ok(())
    }

    fn snapshot(&self) -> Result<TrustSnapshot, Error> {
        Ok(self.read()?.clone())
    }
}
