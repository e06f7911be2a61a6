//! End-to-end graph scenarios driven through the signed-action pipeline
//! with real Ed25519 signatures.

use super::{actor, test_server, TestServer};
use crate::error::Error;
use crate::roles::RoleStore;

#[test]
fn test_basic_proof() {
    let moderator = actor();
    let server = TestServer::with_moderator(&moderator);
    let a = actor();

    server.proof(&moderator, &a.path, 1, 5, "id1").unwrap();
    assert_eq!(server.idt(&a.path), 5);

    let err = server.proof(&moderator, &a.path, 2, 50_001, "id1").unwrap_err();
    assert!(matches!(err, Error::InvariantViolation(_)));
    assert_eq!(server.idt(&a.path), 5);

    // the rejected request did not consume nonce 2
    server.proof(&moderator, &a.path, 2, 50, "id1").unwrap();
    assert_eq!(server.idt(&a.path), 50);
}

#[test]
fn test_single_layer_vouch() {
    let moderator = actor();
    let server = TestServer::with_moderator(&moderator);
    let a = actor();
    let b = actor();

    server.proof(&moderator, &b.path, 1, 50, "id1").unwrap();
    server.vouch(&b, &a.path, 1).unwrap();

    assert_eq!(server.idt(&a.path), 5);
    assert_eq!(server.idt(&b.path), 50);
}

#[test]
fn test_two_layer_vouch() {
    let moderator = actor();
    let server = TestServer::with_moderator(&moderator);
    let a = actor();
    let b = actor();
    let c = actor();

    server.proof(&moderator, &a.path, 1, 10, "id1").unwrap();
    server.proof(&moderator, &b.path, 2, 10, "id1").unwrap();
    server.proof(&moderator, &c.path, 3, 500, "id1").unwrap();
    server.vouch(&c, &b.path, 1).unwrap();
    server.vouch(&b, &a.path, 1).unwrap();

    assert_eq!(server.idt(&b.path), 60);
    assert_eq!(server.idt(&a.path), 16);
}

#[test]
fn test_top_five_saturation() {
    let moderator = actor();
    let server = TestServer::with_moderator(&moderator);
    let a = actor();

    server.proof(&moderator, &a.path, 1, 10, "id1").unwrap();
    for (i, balance) in [10u64, 20, 30, 40, 50, 60].iter().enumerate() {
        let voucher = actor();
        server
            .proof(&moderator, &voucher.path, 2 + i as u64, *balance, "id1")
            .unwrap();
        server.vouch(&voucher, &a.path, 1).unwrap();
    }

    // five strongest vouchers at a tenth each, plus A's own proof
    assert_eq!(server.idt(&a.path), 30);
}

#[test]
fn test_vouch_cycle() {
    let moderator = actor();
    let server = TestServer::with_moderator(&moderator);
    let a = actor();
    let b = actor();
    let c = actor();

    server.proof(&moderator, &a.path, 1, 100, "id1").unwrap();
    server.proof(&moderator, &b.path, 2, 100, "id1").unwrap();
    server.proof(&moderator, &c.path, 3, 200, "id1").unwrap();
    server.vouch(&b, &c.path, 1).unwrap();
    server.vouch(&c, &a.path, 1).unwrap();
    server.vouch(&a, &b.path, 1).unwrap();

    assert_eq!(server.idt(&c.path), 211);
    assert_eq!(server.idt(&a.path), 121);
    assert_eq!(server.idt(&b.path), 112);

    // repeating the same vouches leaves every balance unchanged
    server.vouch(&b, &c.path, 2).unwrap();
    server.vouch(&c, &a.path, 2).unwrap();
    server.vouch(&a, &b.path, 2).unwrap();
    assert_eq!(server.idt(&c.path), 211);
    assert_eq!(server.idt(&a.path), 121);
    assert_eq!(server.idt(&b.path), 112);
}

#[test]
fn test_punish_with_propagation() {
    let moderator = actor();
    let server = TestServer::with_moderator(&moderator);
    let a = actor();
    let b = actor();

    server.proof(&moderator, &a.path, 1, 50_000, "id1").unwrap();
    server.vouch(&a, &b.path, 1).unwrap();
    assert_eq!(server.idt(&b.path), 5_000);

    // punish shares the proof nonce sequence, continue from 2
    let receipt = server.punish(&moderator, &b.path, 2, 10_000, "p1").unwrap();
    assert_eq!(receipt.idt, 0);
    assert_eq!(server.idt(&b.path), 0);

    server.punish(&moderator, &b.path, 3, 100_000, "p3").unwrap();
    assert_eq!(server.idt(&b.path), 0);

    server.punish(&moderator, &b.path, 4, 100_000, "p4").unwrap();
    server.punish(&moderator, &b.path, 5, 100_000, "p5").unwrap();

    // B's own penalty keeps growing without bound
    assert_eq!(server.penalty(&b.path), 310_000);
    // but A's loss per vouchee is clamped: 50000 - 0.1 * 200000
    assert_eq!(server.idt(&a.path), 30_000);
    assert_eq!(server.penalty(&a.path), 20_000);
}

#[test]
fn test_role_promotion_chain() {
    let root = actor();
    let server = test_server();
    server.roles.bootstrap_admin(root.id).unwrap();

    // root promotes an admin, who promotes a moderator, who can then prove
    let admin = actor();
    server.add_admin(&root, &admin.path, 1).unwrap();

    let moderator = actor();
    server.add_moderator(&admin, &moderator.path, 1).unwrap();

    let target = actor();
    server.proof(&moderator, &target.path, 1, 123, "id9").unwrap();
    assert_eq!(server.idt(&target.path), 123);
}
