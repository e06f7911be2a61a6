//! Cross-module test suites.
//!
//! `invariants` checks the guarantees the server makes regardless of input;
//! `scenarios` replays known graph configurations end to end through the
//! signed-action pipeline.

mod scenarios;

use std::sync::Arc;

use ed25519_dalek::SigningKey;

use crate::crypto::{self, generate_keypair, keypair_user_id, sign_message};
use crate::error::Error;
use crate::nonce::{InMemoryNonceRegistry, NonceRegistry};
use crate::roles::{InMemoryRoleStore, RoleStore};
use crate::service::{ActionService, PunishReceipt, QueryService, SignedRequest};
use crate::store::{InMemoryTrustStore, TrustStore};
use crate::types::{IdtAmount, Nonce, UserId};

/// A keypair plus its wire identity.
pub(crate) struct Actor {
    pub key: SigningKey,
    pub id: UserId,
    pub path: String,
}

pub(crate) fn actor() -> Actor {
    let key = generate_keypair();
    let id = keypair_user_id(&key);
    let path = id.to_base58();
    Actor { key, id, path }
}

/// Full service stack over in-memory stores.
pub(crate) struct TestServer {
    pub actions: ActionService,
    pub queries: QueryService,
    pub roles: Arc<InMemoryRoleStore>,
}

pub(crate) fn test_server() -> TestServer {
    let trust: Arc<dyn TrustStore> = Arc::new(InMemoryTrustStore::new());
    let roles = Arc::new(InMemoryRoleStore::new());
    let nonces: Arc<dyn NonceRegistry> = Arc::new(InMemoryNonceRegistry::new());
    TestServer {
        actions: ActionService::new(trust.clone(), roles.clone() as Arc<dyn RoleStore>, nonces),
        queries: QueryService::new(trust, roles.clone() as Arc<dyn RoleStore>),
        roles,
    }
}

impl TestServer {
    pub fn with_moderator(moderator: &Actor) -> Self {
        let server = test_server();
        server.roles.bootstrap_moderator(moderator.id).unwrap();
        server
    }

    pub fn vouch(&self, signer: &Actor, user: &str, nonce: Nonce) -> Result<IdtAmount, Error> {
        let message = crypto::vouch_message(user, nonce);
        let request = SignedRequest {
            signer: signer.id,
            signature: sign_message(&signer.key, &message),
            nonce,
        };
        Ok(self.actions.vouch(user, &request)?.idt)
    }

    pub fn proof(
        &self,
        signer: &Actor,
        user: &str,
        nonce: Nonce,
        balance: IdtAmount,
        proof_id: &str,
    ) -> Result<(), Error> {
        let message = crypto::proof_message(user, nonce, balance, proof_id);
        let request = SignedRequest {
            signer: signer.id,
            signature: sign_message(&signer.key, &message),
            nonce,
        };
        self.actions.set_proof(user, &request, balance, proof_id)?;
        Ok(())
    }

    pub fn punish(
        &self,
        signer: &Actor,
        user: &str,
        nonce: Nonce,
        balance: IdtAmount,
        proof_id: &str,
    ) -> Result<PunishReceipt, Error> {
        let message = crypto::punish_message(user, nonce, balance, proof_id);
        let request = SignedRequest {
            signer: signer.id,
            signature: sign_message(&signer.key, &message),
            nonce,
        };
        self.actions.punish(user, &request, balance, proof_id)
    }

    pub fn add_moderator(&self, signer: &Actor, user: &str, nonce: Nonce) -> Result<(), Error> {
        let message = crypto::moderators_message(user, nonce);
        let request = SignedRequest {
            signer: signer.id,
            signature: sign_message(&signer.key, &message),
            nonce,
        };
        self.actions.add_moderator(user, &request)?;
        Ok(())
    }

    pub fn add_admin(&self, signer: &Actor, user: &str, nonce: Nonce) -> Result<(), Error> {
        let message = crypto::admins_message(user, nonce);
        let request = SignedRequest {
            signer: signer.id,
            signature: sign_message(&signer.key, &message),
            nonce,
        };
        self.actions.add_admin(user, &request)?;
        Ok(())
    }

    pub fn idt(&self, user: &str) -> IdtAmount {
        self.queries.idt(user).unwrap()
    }

    pub fn penalty(&self, user: &str) -> IdtAmount {
        self.queries.penalty(user).unwrap()
    }
}
