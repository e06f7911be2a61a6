//! IDT and penalty evaluation over the vouch graph.
//!
//! The graph is arbitrary: cyclic, disconnected, self-referential. The
//! engine walks it lazily from the queried user with a path-scoped visited
//! set: a node already on the current path contributes 0, and each node is
//! released when its subtree completes so sibling branches stay independent.
//! As a consequence results depend on the entry point; `idt(A)` is not
//! derivable from `idt(B)` and there is no cross-query cache.
//!
//! IDT and penalty are two separate recursions over opposite edge
//! directions. They never share a visited set: the penalty of a node inside
//! an IDT walk is always a fresh evaluation.

use std::collections::BTreeSet;

use crate::store::TrustSnapshot;
use crate::types::{IdtAmount, UserId};

/// Only the strongest vouchers count towards a balance.
pub const TOP_VOUCHERS_SIZE: usize = 5;

/// Upper bound on a single moderator proof. Genesis records may exceed it.
pub const MAX_IDT_BY_PROOF: IdtAmount = 50_000;

/// Cap on the penalty a single vouchee can propagate to its voucher. A
/// moderator can punish one user without bound, but the damage radiating to
/// each upstream voucher is limited per vouchee.
pub const MAX_VOUCHEE_PENALTY: IdtAmount = 4 * MAX_IDT_BY_PROOF;

/// A voucher's balance is scaled by this before it reaches the vouchee.
pub const IDT_VOUCHER_WEIGHT: f64 = 0.1;

/// A vouchee's penalty is scaled by this before it reaches the voucher.
pub const PENALTY_VOUCHEE_WEIGHT: f64 = 0.1;

/// Evaluator over one consistent snapshot of the trust state.
pub struct TrustEngine<'a> {
    state: &'a TrustSnapshot,
}

impl<'a> TrustEngine<'a> {
    pub fn new(state: &'a TrustSnapshot) -> Self {
        Self { state }
    }

    /// `idt(u) = max(0, balance_by_vouchers(u) + balance_by_proof(u) - penalty(u))`
    pub fn idt(&self, user: &UserId) -> IdtAmount {
        let mut visited = BTreeSet::new();
        self.idt_walk(user, &mut visited)
    }

    /// `penalty(u) = penalty_by_vouchees(u) + penalty_by_proof(u)`
    pub fn penalty(&self, user: &UserId) -> IdtAmount {
        let mut visited = BTreeSet::new();
        self.penalty_walk(user, &mut visited)
    }

    fn idt_walk(&self, user: &UserId, visited: &mut BTreeSet<UserId>) -> IdtAmount {
        if !visited.insert(*user) {
            // already on this path, cycles contribute nothing
            return 0;
        }

        let proven = self.state.proof(user).map(|p| p.balance).unwrap_or(0);

        let mut voucher_balances: Vec<IdtAmount> = self
            .state
            .vouchers_of(user)
            .iter()
            .map(|voucher| self.idt_walk(voucher, visited))
            .collect();
        // rank descending; equal balances are interchangeable, so ordering
        // among them does not matter
        voucher_balances.sort_unstable_by(|a, b| b.cmp(a));
        voucher_balances.truncate(TOP_VOUCHERS_SIZE);
        let from_vouchers = weighted_floor(&voucher_balances, IDT_VOUCHER_WEIGHT);

        // independent recursion with its own visited set
        let penalty = self.penalty(user);

        visited.remove(user);
        proven.saturating_add(from_vouchers).saturating_sub(penalty)
    }

    fn penalty_walk(&self, user: &UserId, visited: &mut BTreeSet<UserId>) -> IdtAmount {
        if !visited.insert(*user) {
            return 0;
        }

        // direct penalties are uncapped
        let direct = self.state.direct_penalty(user);

        let mut from_vouchees: IdtAmount = 0;
        for vouchee in self.state.vouchees_of(user) {
            let child = self.penalty_walk(&vouchee, visited);
            from_vouchees = from_vouchees.saturating_add(child.min(MAX_VOUCHEE_PENALTY));
        }
        let from_vouchees = weighted_floor(&[from_vouchees], PENALTY_VOUCHEE_WEIGHT);

        visited.remove(user);
        direct.saturating_add(from_vouchees)
    }
}

/// Apply `weight` to each balance in floating point, then floor the sum.
fn weighted_floor(balances: &[IdtAmount], weight: f64) -> IdtAmount {
    let sum: f64 = balances.iter().map(|b| *b as f64 * weight).sum();
    sum.floor() as IdtAmount
}
