//! Group lifecycle and sharing tests
//!
//! End-to-end flows over a shared block log: creation, membership updates,
//! key rotation scope, and resource sharing to users and groups.

mod common;

use common::{user_id, TestNet};
use keyseal_core::{Error, RecipientId, ShareTargets};
use keyseal_crypto::SymmetricKey;
use keyseal_proto::{GroupId, ResourceId};

#[test]
fn create_group_rejects_an_empty_member_list() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let mut session = net.session(&alice);

    assert!(matches!(session.create_group(&[], &[]), Err(Error::InvalidGroupSize)));
}

#[test]
fn create_group_reports_exactly_the_unknown_members() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let mut session = net.session(&alice);

    let result = session.create_group(&[user_id(1), user_id(8), user_id(9)], &[]);
    match result {
        Err(Error::RecipientsNotFound { recipient_ids }) => {
            assert_eq!(
                recipient_ids,
                vec![RecipientId::User(user_id(8)), RecipientId::User(user_id(9))]
            );
        }
        other => panic!("expected RecipientsNotFound, got {other:?}"),
    }
}

#[test]
fn update_members_reports_exactly_the_unknown_members() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let _bob = net.register_user(2);
    let mut session = net.session(&alice);

    let (group_id, block) = session.create_group(&[user_id(1)], &[]).unwrap();
    net.publish([block]);

    let result = session.update_members(group_id, &[user_id(2), user_id(9)], &[]);
    match result {
        Err(Error::RecipientsNotFound { recipient_ids }) => {
            assert_eq!(recipient_ids, vec![RecipientId::User(user_id(9))]);
        }
        other => panic!("expected RecipientsNotFound, got {other:?}"),
    }

    // The failed update left the group untouched.
    let group = session.processor().groups().group(&group_id).unwrap();
    assert_eq!(group.epochs().len(), 1);
    assert_eq!(group.members().count(), 1);
}

#[test]
fn group_members_can_unwrap_a_group_share() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let bob = net.register_user(2);
    let mut alice_session = net.session(&alice);
    let mut bob_session = net.session(&bob);

    let (group_id, block) = alice_session.create_group(&[user_id(1), user_id(2)], &[]).unwrap();
    net.publish([block]);
    net.catch_up(&mut bob_session);

    let resource = ResourceId([9; 16]);
    let key = SymmetricKey::generate();
    let blocks = alice_session
        .share_resource_key(
            resource,
            &key,
            &ShareTargets { groups: vec![group_id], ..ShareTargets::default() },
        )
        .unwrap();
    net.publish(blocks);
    net.catch_up(&mut bob_session);

    assert_eq!(bob_session.unwrap_resource_key(resource).unwrap(), key);
    assert_eq!(alice_session.unwrap_resource_key(resource).unwrap(), key);
}

#[test]
fn sharing_with_an_unknown_group_reports_it() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let mut session = net.session(&alice);

    let missing = GroupId([3; 16]);
    let result = session.share_resource_key(
        ResourceId([9; 16]),
        &SymmetricKey::generate(),
        &ShareTargets { groups: vec![missing], ..ShareTargets::default() },
    );
    match result {
        Err(Error::RecipientsNotFound { recipient_ids }) => {
            assert_eq!(recipient_ids, vec![RecipientId::Group(missing)]);
        }
        other => panic!("expected RecipientsNotFound, got {other:?}"),
    }
}

#[test]
fn direct_share_reaches_the_target_user_only() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let bob = net.register_user(2);
    let carol = net.register_user(3);
    let mut alice_session = net.session(&alice);
    let mut bob_session = net.session(&bob);
    let mut carol_session = net.session(&carol);

    let resource = ResourceId([9; 16]);
    let key = SymmetricKey::generate();
    let blocks = alice_session
        .share_resource_key(
            resource,
            &key,
            &ShareTargets { users: vec![user_id(2)], ..ShareTargets::default() },
        )
        .unwrap();
    net.publish(blocks);
    net.catch_up(&mut bob_session);
    net.catch_up(&mut carol_session);

    assert_eq!(bob_session.unwrap_resource_key(resource).unwrap(), key);
    assert!(matches!(
        carol_session.unwrap_resource_key(resource),
        Err(Error::ResourceNotFound(_))
    ));
}

#[test]
fn sharing_with_no_targets_emits_nothing() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let mut session = net.session(&alice);

    let blocks = session
        .share_resource_key(
            ResourceId([9; 16]),
            &SymmetricKey::generate(),
            &ShareTargets::default(),
        )
        .unwrap();
    assert!(blocks.is_empty());
}

#[test]
fn adding_an_existing_member_again_succeeds() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let bob = net.register_user(2);
    let mut alice_session = net.session(&alice);

    let (group_id, block) = alice_session.create_group(&[user_id(1), user_id(2)], &[]).unwrap();
    net.publish([block]);

    let block = alice_session.update_members(group_id, &[user_id(2)], &[]).unwrap();
    net.publish([block]);

    let mut bob_session = net.session(&bob);
    net.catch_up(&mut bob_session);
    let group = bob_session.processor().groups().group(&group_id).unwrap();
    assert_eq!(group.members().count(), 2);
}

#[test]
fn update_members_rejects_an_empty_addition() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let mut session = net.session(&alice);

    let (group_id, block) = session.create_group(&[user_id(1)], &[]).unwrap();
    net.publish([block]);

    assert!(matches!(
        session.update_members(group_id, &[], &[]),
        Err(Error::InvalidGroupSize)
    ));
}

#[test]
fn non_members_cannot_update_a_group() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let bob = net.register_user(2);
    let mut alice_session = net.session(&alice);

    let (group_id, block) = alice_session.create_group(&[user_id(1)], &[]).unwrap();
    net.publish([block]);

    let mut bob_session = net.session(&bob);
    assert!(matches!(
        bob_session.update_members(group_id, &[user_id(2)], &[]),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn new_members_read_new_shares_but_not_old_ones() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let bob = net.register_user(2);
    let mut alice_session = net.session(&alice);
    let mut bob_session = net.session(&bob);

    let (group_id, block) = alice_session.create_group(&[user_id(1)], &[]).unwrap();
    net.publish([block]);

    // Shared while Bob is not yet a member.
    let old_resource = ResourceId([9; 16]);
    let old_key = SymmetricKey::generate();
    let blocks = alice_session
        .share_resource_key(
            old_resource,
            &old_key,
            &ShareTargets { groups: vec![group_id], ..ShareTargets::default() },
        )
        .unwrap();
    net.publish(blocks);

    let block = alice_session.update_members(group_id, &[user_id(2)], &[]).unwrap();
    net.publish([block]);
    net.catch_up(&mut bob_session);

    // Bob holds only the post-addition epoch; the old share stays closed.
    assert!(matches!(
        bob_session.unwrap_resource_key(old_resource),
        Err(Error::ResourceNotFound(_))
    ));

    // A fresh share under the current epoch is readable by both.
    let new_resource = ResourceId([10; 16]);
    let new_key = SymmetricKey::generate();
    let blocks = alice_session
        .share_resource_key(
            new_resource,
            &new_key,
            &ShareTargets { groups: vec![group_id], ..ShareTargets::default() },
        )
        .unwrap();
    net.publish(blocks);
    net.catch_up(&mut bob_session);

    assert_eq!(bob_session.unwrap_resource_key(new_resource).unwrap(), new_key);
    assert_eq!(alice_session.unwrap_resource_key(new_resource).unwrap(), new_key);

    // Re-sharing the old key under the current epoch opens it for Bob.
    let blocks = alice_session
        .share_resource_key(
            old_resource,
            &old_key,
            &ShareTargets { groups: vec![group_id], ..ShareTargets::default() },
        )
        .unwrap();
    net.publish(blocks);
    net.catch_up(&mut bob_session);
    assert_eq!(bob_session.unwrap_resource_key(old_resource).unwrap(), old_key);
}

#[test]
fn group_private_keys_cover_exactly_the_reachable_epochs() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let bob = net.register_user(2);
    let carol = net.register_user(3);
    let mut alice_session = net.session(&alice);

    let (group_id, block) = alice_session.create_group(&[user_id(1)], &[]).unwrap();
    net.publish([block]);
    let block = alice_session.update_members(group_id, &[user_id(2)], &[]).unwrap();
    net.publish([block]);

    // Alice was wrapped into both epochs, Bob only into the rotation.
    assert_eq!(alice_session.group_private_keys(group_id).unwrap().len(), 2);

    let mut bob_session = net.session(&bob);
    net.catch_up(&mut bob_session);
    assert_eq!(bob_session.group_private_keys(group_id).unwrap().len(), 1);

    let carol_session = net.session(&carol);
    assert!(matches!(
        carol_session.group_private_keys(group_id),
        Err(Error::NotAGroupMember(_))
    ));
}

#[test]
fn non_members_can_share_with_a_group() {
    let mut net = TestNet::new();
    let alice = net.register_user(1);
    let bob = net.register_user(2);
    let mut alice_session = net.session(&alice);

    let (group_id, block) = alice_session.create_group(&[user_id(1)], &[]).unwrap();
    net.publish([block]);

    // Bob is not a member but knows the group's public key via the log.
    let mut bob_session = net.session(&bob);
    let resource = ResourceId([9; 16]);
    let key = SymmetricKey::generate();
    let blocks = bob_session
        .share_resource_key(
            resource,
            &key,
            &ShareTargets { groups: vec![group_id], ..ShareTargets::default() },
        )
        .unwrap();
    net.publish(blocks);
    net.catch_up(&mut alice_session);

    assert_eq!(alice_session.unwrap_resource_key(resource).unwrap(), key);
    assert!(matches!(
        bob_session.unwrap_resource_key(resource),
        Err(Error::ResourceNotFound(_))
    ));
}
