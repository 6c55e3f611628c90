//! Provisioning operations against a scripted directory double.

mod common;

use common::{server_entry, MockDirectory, Op};

use exodb_directory::{DirectoryError, Entry};
use exodb_provision::{counter, mailbox, GlobalCount, OrgNames, ProvisionError, TemplateSet};

fn org() -> OrgNames {
    OrgNames::new("CN=First Organization,dc=example,dc=com")
}

#[tokio::test]
async fn global_count_reads_hex_attribute() {
    let directory = MockDirectory::new();
    directory.push_search(vec![server_entry("mdb1", &[("GlobalCount", "0xa4")])]);

    let count = counter::global_count(&directory, "mdb1").await.unwrap();
    assert_eq!(count.value(), 0xa4);

    // Only the named attribute goes over the wire.
    assert_eq!(
        directory.ops(),
        vec![Op::Search {
            base: String::new(),
            filter: "(&(objectClass=server)(cn=mdb1))".to_string(),
            attrs: vec!["GlobalCount".to_string()],
        }]
    );
}

#[tokio::test]
async fn accessor_fails_on_missing_server() {
    let directory = MockDirectory::new();
    directory.push_search(vec![]);

    let err = counter::global_count(&directory, "mdb1").await.unwrap_err();
    assert!(matches!(
        err,
        ProvisionError::Directory(DirectoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn accessor_fails_on_duplicate_server() {
    let directory = MockDirectory::new();
    directory.push_search(vec![
        server_entry("mdb1", &[("GlobalCount", "0x1")]),
        server_entry("mdb1", &[("GlobalCount", "0x2")]),
    ]);

    let err = counter::global_count(&directory, "mdb1").await.unwrap_err();
    assert!(matches!(
        err,
        ProvisionError::Directory(DirectoryError::Ambiguous { count: 2, .. })
    ));
}

#[tokio::test]
async fn accessor_fails_on_absent_attribute() {
    let directory = MockDirectory::new();
    directory.push_search(vec![server_entry("mdb1", &[])]);

    let err = counter::global_count(&directory, "mdb1").await.unwrap_err();
    assert!(matches!(
        err,
        ProvisionError::Directory(DirectoryError::MissingAttribute { .. })
    ));
}

#[tokio::test]
async fn set_global_count_brackets_one_replace_in_one_transaction() {
    let directory = MockDirectory::new();
    directory.push_search(vec![server_entry("mdb1", &[])]);

    counter::set_global_count(&directory, "mdb1", GlobalCount::new(0x12).unwrap())
        .await
        .unwrap();

    let ops = directory.ops();
    assert_eq!(
        ops[1..],
        [
            Op::TransactionStart,
            Op::Replace {
                dn: "CN=mdb1,dc=example,dc=com".to_string(),
                attribute: "GlobalCount".to_string(),
                value: "0x12".to_string(),
            },
            Op::TransactionCommit,
        ]
    );
    // Exactly one of each, nothing re-issued.
    assert_eq!(
        ops.iter().filter(|op| **op == Op::TransactionStart).count(),
        1
    );
    assert_eq!(
        ops.iter()
            .filter(|op| **op == Op::TransactionCommit)
            .count(),
        1
    );
    assert_eq!(
        ops.iter()
            .filter(|op| matches!(op, Op::Replace { .. }))
            .count(),
        1
    );
}

#[tokio::test]
async fn allocate_returns_range_start_and_advances_counter() {
    let directory = MockDirectory::new();
    directory.push_search(vec![server_entry("mdb1", &[("GlobalCount", "0x10")])]);
    directory.push_search(vec![server_entry("mdb1", &[])]);

    let start = counter::allocate(&directory, "mdb1", 4).await.unwrap();
    assert_eq!(start.value(), 0x10);

    let replaced: Vec<_> = directory
        .ops()
        .into_iter()
        .filter_map(|op| match op {
            Op::Replace { value, .. } => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(replaced, vec!["0x14".to_string()]);
}

#[tokio::test]
async fn allocate_zero_is_read_only() {
    let directory = MockDirectory::new();
    directory.push_search(vec![server_entry("mdb1", &[("GlobalCount", "0x10")])]);

    let start = counter::allocate(&directory, "mdb1", 0).await.unwrap();
    assert_eq!(start.value(), 0x10);
    assert!(directory
        .ops()
        .iter()
        .all(|op| matches!(op, Op::Search { .. })));
}

#[tokio::test]
async fn user_exists_is_false_without_a_match() {
    let directory = MockDirectory::new();
    directory.push_search(vec![server_entry("mdb1", &[])]);
    directory.push_search(vec![]);

    let exists = mailbox::user_exists(&directory, "mdb1", "jdoe").await.unwrap();
    assert!(!exists);

    // The user search runs under the server's subtree with the schema's
    // exact filter shape.
    assert_eq!(
        directory.ops()[1],
        Op::Search {
            base: "CN=mdb1,dc=example,dc=com".to_string(),
            filter: "(&(objectClass=user)(cn=jdoe))".to_string(),
            attrs: vec![],
        }
    );
}

#[tokio::test]
async fn user_exists_is_true_with_a_match() {
    let directory = MockDirectory::new();
    directory.push_search(vec![server_entry("mdb1", &[])]);
    directory.push_search(vec![Entry::new(
        "CN=jdoe,CN=First Organization,dc=example,dc=com",
    )]);

    let exists = mailbox::user_exists(&directory, "mdb1", "jdoe").await.unwrap();
    assert!(exists);
}

#[tokio::test]
async fn user_exists_propagates_unresolved_server() {
    let directory = MockDirectory::new();
    directory.push_search(vec![]);

    let err = mailbox::user_exists(&directory, "mdb1", "jdoe")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProvisionError::Directory(DirectoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn add_user_submits_one_rendered_record() {
    let directory = MockDirectory::new();

    let record = mailbox::add_user(&directory, &org(), &TemplateSet::embedded(), "jdoe")
        .await
        .unwrap();

    assert_eq!(record.username, "jdoe");
    assert_eq!(
        directory.ops(),
        vec![Op::Add {
            dn: "CN=jdoe,CN=First Organization,dc=example,dc=com".to_string(),
        }]
    );
}

#[tokio::test]
async fn add_root_folder_keys_entry_by_folder_id() {
    let directory = MockDirectory::new();

    let fid = mailbox::add_root_folder(
        &directory,
        &org(),
        &TemplateSet::embedded(),
        "jdoe",
        "Inbox",
        GlobalCount::new(0x64).unwrap(),
        exodb_provision::ReplicaId::LOCAL,
        4,
    )
    .await
    .unwrap();

    assert_eq!(fid.to_string(), "0x0000000000640001");
    assert_eq!(
        directory.ops(),
        vec![Op::Add {
            dn: "CN=0x0000000000640001,CN=jdoe,CN=First Organization,dc=example,dc=com"
                .to_string(),
        }]
    );
}

#[tokio::test]
async fn provision_mailbox_creates_user_and_all_root_folders() {
    let directory = MockDirectory::new();
    // user_exists: server entry, then no user match
    directory.push_search(vec![server_entry("mdb1", &[])]);
    directory.push_search(vec![]);
    // counter reads
    directory.push_search(vec![server_entry("mdb1", &[("GlobalCount", "0x64")])]);
    directory.push_search(vec![server_entry("mdb1", &[("ReplicaID", "0x1")])]);
    // counter write-back
    directory.push_search(vec![server_entry("mdb1", &[])]);

    let summary = mailbox::provision_mailbox(
        &directory,
        "mdb1",
        &org(),
        &TemplateSet::embedded(),
        "jdoe",
    )
    .await
    .unwrap();

    assert_eq!(summary.folders.len(), 12);
    assert_eq!(summary.next_global_count.value(), 0x64 + 12);

    // Consecutive counter slots under the same replica.
    assert_eq!(summary.folders[0].1.to_string(), "0x0000000000640001");
    assert_eq!(summary.folders[11].1.to_string(), "0x00000000006f0001");

    let adds = directory
        .ops()
        .iter()
        .filter(|op| matches!(op, Op::Add { .. }))
        .count();
    assert_eq!(adds, 1 + 12);

    // The advanced counter is written back once, transactionally.
    let ops = directory.ops();
    assert_eq!(
        ops[ops.len() - 3..],
        [
            Op::TransactionStart,
            Op::Replace {
                dn: "CN=mdb1,dc=example,dc=com".to_string(),
                attribute: "GlobalCount".to_string(),
                value: "0x70".to_string(),
            },
            Op::TransactionCommit,
        ]
    );
}

#[tokio::test]
async fn provision_mailbox_rejects_existing_user() {
    let directory = MockDirectory::new();
    directory.push_search(vec![server_entry("mdb1", &[])]);
    directory.push_search(vec![Entry::new(
        "CN=jdoe,CN=First Organization,dc=example,dc=com",
    )]);

    let err = mailbox::provision_mailbox(
        &directory,
        "mdb1",
        &org(),
        &TemplateSet::embedded(),
        "jdoe",
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ProvisionError::UserAlreadyExists { username } if username == "jdoe"
    ));
    // Nothing was added.
    assert!(directory
        .ops()
        .iter()
        .all(|op| matches!(op, Op::Search { .. })));
}
