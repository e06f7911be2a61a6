//! Signed-action pipeline and read-only queries.
//!
//! Every mutating action runs the same pipeline: decode, build the
//! canonical message, check the nonce, verify the signature, authorize,
//! consume the nonce, mutate, then re-evaluate the affected user. A single
//! action mutex covers nonce-check through mutation, so no two accepted
//! actions can share a `(namespace, signer, nonce)` triple and a consumed
//! nonce always implies an applied action.
//!
//! Failures before nonce consumption leave the nonce untouched; a client
//! whose request was rejected may retry with the same nonce.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::crypto::{self, SIGNATURE_LENGTH};
use crate::engine::{TrustEngine, MAX_IDT_BY_PROOF};
use crate::error::Error;
use crate::nonce::{NonceNamespace, NonceRegistry};
use crate::roles::RoleStore;
use crate::store::{PenaltyRecord, ProofRecord, TrustStore};
use crate::types::{unix_timestamp, IdtAmount, Nonce, UserId};

/// The authenticated part of every POST body, decoded from the wire.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub signer: UserId,
    pub signature: [u8; SIGNATURE_LENGTH],
    pub nonce: Nonce,
}

impl SignedRequest {
    /// Decode the wire fields: base58 signer, base64 signature.
    pub fn decode(signer: &str, signature: &str, nonce: Nonce) -> Result<Self, Error> {
        Ok(Self {
            signer: UserId::from_base58(signer)?,
            signature: crypto::decode_signature(signature)?,
            nonce,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VouchReceipt {
    pub from: UserId,
    pub to: UserId,
    pub idt: IdtAmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofReceipt {
    pub from: UserId,
    pub to: UserId,
    pub balance: IdtAmount,
    pub proof_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunishReceipt {
    pub from: UserId,
    pub to: UserId,
    pub idt: IdtAmount,
    pub penalty: IdtAmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleReceipt {
    pub from: UserId,
    pub member: UserId,
}

/// Orchestrates all state-changing actions.
pub struct ActionService {
    trust: Arc<dyn TrustStore>,
    roles: Arc<dyn RoleStore>,
    nonces: Arc<dyn NonceRegistry>,
    // held across nonce check, consumption and mutation
    action_lock: Mutex<()>,
}

impl ActionService {
    pub fn new(
        trust: Arc<dyn TrustStore>,
        roles: Arc<dyn RoleStore>,
        nonces: Arc<dyn NonceRegistry>,
    ) -> Self {
        Self {
            trust,
            roles,
            nonces,
            action_lock: Mutex::new(()),
        }
    }

    /// `POST /vouch/{user}`: record `signer -> user`. Any identity may vouch.
    pub fn vouch(&self, user_path: &str, request: &SignedRequest) -> Result<VouchReceipt, Error> {
        let user = UserId::from_base58(user_path)?;
        let message = crypto::vouch_message(user_path, request.nonce);

        let _guard = self.lock()?;
        self.ensure_fresh(NonceNamespace::Vouch, request)?;
        self.verify(&message, request, "vouch")?;
        self.nonces
            .consume(NonceNamespace::Vouch, &request.signer, request.nonce)?;
        self.trust
            .insert_vouch(request.signer, user, unix_timestamp())?;

        let snapshot = self.trust.snapshot()?;
        let idt = TrustEngine::new(&snapshot).idt(&user);
        info!(action = "vouch", from = %request.signer, to = %user, nonce = request.nonce, idt, "vouch recorded");
        Ok(VouchReceipt {
            from: request.signer,
            to: user,
            idt,
        })
    }

    /// `POST /proof/{user}`: moderator grants a proof-backed balance.
    pub fn set_proof(
        &self,
        user_path: &str,
        request: &SignedRequest,
        balance: IdtAmount,
        proof_id: &str,
    ) -> Result<ProofReceipt, Error> {
        let user = UserId::from_base58(user_path)?;
        let message = crypto::proof_message(user_path, request.nonce, balance, proof_id);

        let _guard = self.lock()?;
        self.ensure_fresh(NonceNamespace::Proof, request)?;
        self.verify(&message, request, "proof")?;
        self.ensure_moderator(request, "proof")?;
        if balance > MAX_IDT_BY_PROOF {
            warn!(action = "proof", signer = %request.signer, nonce = request.nonce, balance,
                "rejected: balance above proof limit");
            return Err(Error::InvariantViolation(format!(
                "proof balance {balance} exceeds maximum {MAX_IDT_BY_PROOF}"
            )));
        }
        self.nonces
            .consume(NonceNamespace::Proof, &request.signer, request.nonce)?;
        self.trust.set_proof(
            user,
            ProofRecord {
                moderator: Some(request.signer),
                balance,
                proof_id: proof_id.to_string(),
                timestamp: unix_timestamp(),
            },
        )?;

        info!(action = "proof", from = %request.signer, to = %user, nonce = request.nonce, balance, proof_id, "proof set");
        Ok(ProofReceipt {
            from: request.signer,
            to: user,
            balance,
            proof_id: proof_id.to_string(),
        })
    }

    /// `POST /punish/{user}`: moderator issues a penalty. The balance is
    /// unbounded; the engine caps propagation, not the record.
    ///
    /// Punish consumes from the `proof` nonce namespace (see `nonce` module
    /// docs).
    pub fn punish(
        &self,
        user_path: &str,
        request: &SignedRequest,
        balance: IdtAmount,
        proof_id: &str,
    ) -> Result<PunishReceipt, Error> {
        let user = UserId::from_base58(user_path)?;
        let message = crypto::punish_message(user_path, request.nonce, balance, proof_id);

        let _guard = self.lock()?;
        self.ensure_fresh(NonceNamespace::Proof, request)?;
        self.verify(&message, request, "punish")?;
        self.ensure_moderator(request, "punish")?;
        self.nonces
            .consume(NonceNamespace::Proof, &request.signer, request.nonce)?;
        self.trust.insert_penalty(PenaltyRecord {
            user,
            moderator: request.signer,
            balance,
            proof_id: proof_id.to_string(),
            timestamp: unix_timestamp(),
        })?;

        let snapshot = self.trust.snapshot()?;
        let engine = TrustEngine::new(&snapshot);
        let idt = engine.idt(&user);
        let penalty = engine.penalty(&user);
        info!(action = "punish", from = %request.signer, to = %user, nonce = request.nonce, balance, proof_id, idt, penalty, "penalty recorded");
        Ok(PunishReceipt {
            from: request.signer,
            to: user,
            idt,
            penalty,
        })
    }

    /// `POST /add_moderator/{user}`
    pub fn add_moderator(
        &self,
        user_path: &str,
        request: &SignedRequest,
    ) -> Result<RoleReceipt, Error> {
        self.role_action(user_path, request, NonceNamespace::Moderators, "add_moderator", |roles, caller, member| {
            roles.add_moderator(caller, member)
        })
    }

    /// `POST /remove_moderator/{user}`
    pub fn remove_moderator(
        &self,
        user_path: &str,
        request: &SignedRequest,
    ) -> Result<RoleReceipt, Error> {
        self.role_action(user_path, request, NonceNamespace::Moderators, "remove_moderator", |roles, caller, member| {
            roles.remove_moderator(caller, &member)
        })
    }

    /// `POST /add_admin/{user}`
    pub fn add_admin(&self, user_path: &str, request: &SignedRequest) -> Result<RoleReceipt, Error> {
        self.role_action(user_path, request, NonceNamespace::Admins, "add_admin", |roles, caller, member| {
            roles.add_admin(caller, member)
        })
    }

    /// `POST /remove_admin/{user}`. An admin may remove itself.
    pub fn remove_admin(
        &self,
        user_path: &str,
        request: &SignedRequest,
    ) -> Result<RoleReceipt, Error> {
        self.role_action(user_path, request, NonceNamespace::Admins, "remove_admin", |roles, caller, member| {
            roles.remove_admin(caller, &member)
        })
    }

    fn role_action(
        &self,
        user_path: &str,
        request: &SignedRequest,
        namespace: NonceNamespace,
        action: &'static str,
        mutate: impl FnOnce(&dyn RoleStore, &UserId, UserId) -> Result<(), Error>,
    ) -> Result<RoleReceipt, Error> {
        let member = UserId::from_base58(user_path)?;
        // add and remove share one canonical message per namespace
        let message = match namespace {
            NonceNamespace::Admins => crypto::admins_message(user_path, request.nonce),
            _ => crypto::moderators_message(user_path, request.nonce),
        };

        let _guard = self.lock()?;
        self.ensure_fresh(namespace, request)?;
        self.verify(&message, request, action)?;
        if !self.roles.is_admin(&request.signer)? {
            warn!(action, signer = %request.signer, nonce = request.nonce, "rejected: signer is not an admin");
            return Err(Error::NotAllowed);
        }
        self.nonces
            .consume(namespace, &request.signer, request.nonce)?;
        mutate(self.roles.as_ref(), &request.signer, member)?;

        info!(action, from = %request.signer, member = %member, nonce = request.nonce, "role set updated");
        Ok(RoleReceipt {
            from: request.signer,
            member,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, Error> {
        self.action_lock
            .lock()
            .map_err(|_| Error::Internal("action lock poisoned".into()))
    }

    fn ensure_fresh(&self, namespace: NonceNamespace, request: &SignedRequest) -> Result<(), Error> {
        if self
            .nonces
            .is_consumed(namespace, &request.signer, request.nonce)?
        {
            warn!(namespace = namespace.as_str(), signer = %request.signer, nonce = request.nonce,
                "rejected: nonce already consumed");
            return Err(Error::NonceConsumed(request.nonce));
        }
        Ok(())
    }

    fn verify(
        &self,
        message: &str,
        request: &SignedRequest,
        action: &'static str,
    ) -> Result<(), Error> {
        crypto::verify_message(&request.signer, message, &request.signature).map_err(|e| {
            warn!(action, signer = %request.signer, nonce = request.nonce, "rejected: bad signature");
            e
        })
    }

    fn ensure_moderator(&self, request: &SignedRequest, action: &'static str) -> Result<(), Error> {
        if !self.roles.is_moderator(&request.signer)? {
            warn!(action, signer = %request.signer, nonce = request.nonce, "rejected: signer is not a moderator");
            return Err(Error::NotAllowed);
        }
        Ok(())
    }
}

/// Unauthenticated reads.
pub struct QueryService {
    trust: Arc<dyn TrustStore>,
    roles: Arc<dyn RoleStore>,
}

impl QueryService {
    pub fn new(trust: Arc<dyn TrustStore>, roles: Arc<dyn RoleStore>) -> Self {
        Self { trust, roles }
    }

    pub fn idt(&self, user_path: &str) -> Result<IdtAmount, Error> {
        let user = UserId::from_base58(user_path)?;
        let snapshot = self.trust.snapshot()?;
        Ok(TrustEngine::new(&snapshot).idt(&user))
    }

    pub fn penalty(&self, user_path: &str) -> Result<IdtAmount, Error> {
        let user = UserId::from_base58(user_path)?;
        let snapshot = self.trust.snapshot()?;
        Ok(TrustEngine::new(&snapshot).penalty(&user))
    }

    pub fn is_admin(&self, user_path: &str) -> Result<bool, Error> {
        self.roles.is_admin(&UserId::from_base58(user_path)?)
    }

    pub fn is_moderator(&self, user_path: &str) -> Result<bool, Error> {
        self.roles.is_moderator(&UserId::from_base58(user_path)?)
    }

    pub fn list_admins(&self) -> Result<Vec<UserId>, Error> {
        self.roles.list_admins()
    }

    pub fn list_moderators(&self) -> Result<Vec<UserId>, Error> {
        self.roles.list_moderators()
    }
}
