//! Mailbox user and root folder provisioning.
//!
//! A mailbox is one user record plus the set of well-known root folders
//! under its subtree. Nothing here is atomic as a unit: the existence
//! check, the user add, and each folder add are separate directory calls,
//! and two provisioners racing on the same username are resolved (or not)
//! by the directory schema's own uniqueness enforcement.

use std::collections::HashMap;

use tracing::{info, instrument};
use uuid::Uuid;

use exodb_directory::{dn, filter, Directory, SearchScope};

use crate::counter;
use crate::error::{ProvisionError, ProvisionResult};
use crate::fid::{FolderId, GlobalCount, ReplicaId};
use crate::templates::TemplateSet;

/// Organizational naming context for a deployment.
#[derive(Debug, Clone)]
pub struct OrgNames {
    /// DN of the first organization container, the parent of every
    /// mailbox user entry.
    pub first_org_dn: String,
}

impl OrgNames {
    pub fn new(first_org_dn: impl Into<String>) -> Self {
        Self {
            first_org_dn: first_org_dn.into(),
        }
    }

    /// DN of a user's mailbox entry.
    pub fn user_dn(&self, username: &str) -> String {
        format!("CN={},{}", dn::escape_value(username), self.first_org_dn)
    }
}

/// The well-known root folders every mailbox carries.
///
/// The system index is a schema-level tag; consumers use it to find a
/// folder by role rather than by display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemFolder {
    DeferredAction,
    SpoolerQueue,
    IpmSubtree,
    Inbox,
    Outbox,
    SentItems,
    DeletedItems,
    CommonViews,
    Schema,
    Search,
    Views,
    Shortcuts,
}

impl SystemFolder {
    /// Every root folder, in provisioning order.
    pub const ALL: [SystemFolder; 12] = [
        SystemFolder::DeferredAction,
        SystemFolder::SpoolerQueue,
        SystemFolder::IpmSubtree,
        SystemFolder::Inbox,
        SystemFolder::Outbox,
        SystemFolder::SentItems,
        SystemFolder::DeletedItems,
        SystemFolder::CommonViews,
        SystemFolder::Schema,
        SystemFolder::Search,
        SystemFolder::Views,
        SystemFolder::Shortcuts,
    ];

    /// Display name stored on the folder entry.
    pub fn display_name(&self) -> &'static str {
        match self {
            SystemFolder::DeferredAction => "Deferred Action",
            SystemFolder::SpoolerQueue => "Spooler Queue",
            SystemFolder::IpmSubtree => "IPM Subtree",
            SystemFolder::Inbox => "Inbox",
            SystemFolder::Outbox => "Outbox",
            SystemFolder::SentItems => "Sent Items",
            SystemFolder::DeletedItems => "Deleted Items",
            SystemFolder::CommonViews => "Common Views",
            SystemFolder::Schema => "Schema",
            SystemFolder::Search => "Search",
            SystemFolder::Views => "Views",
            SystemFolder::Shortcuts => "Shortcuts",
        }
    }

    /// System index tag stored on the folder entry.
    pub fn system_index(&self) -> u32 {
        match self {
            SystemFolder::DeferredAction => 1,
            SystemFolder::SpoolerQueue => 2,
            SystemFolder::IpmSubtree => 3,
            SystemFolder::Inbox => 4,
            SystemFolder::Outbox => 5,
            SystemFolder::SentItems => 6,
            SystemFolder::DeletedItems => 7,
            SystemFolder::CommonViews => 8,
            SystemFolder::Schema => 9,
            SystemFolder::Search => 10,
            SystemFolder::Views => 11,
            SystemFolder::Shortcuts => 12,
        }
    }
}

/// Generated identity of a freshly provisioned mailbox user.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub mailbox_guid: Uuid,
    pub replica_id: ReplicaId,
    pub replica_guid: Uuid,
}

impl UserRecord {
    /// Generate fresh GUIDs for a username. New mailboxes are always
    /// replica 1.
    pub fn generate(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            mailbox_guid: Uuid::new_v4(),
            replica_id: ReplicaId::LOCAL,
            replica_guid: Uuid::new_v4(),
        }
    }

    fn bindings(&self, org: &OrgNames) -> HashMap<&'static str, String> {
        HashMap::from([
            ("USERNAME", self.username.clone()),
            ("FIRSTORGDN", org.first_org_dn.clone()),
            ("MAILBOXGUID", self.mailbox_guid.to_string()),
            ("REPLICAID", self.replica_id.value().to_string()),
            ("REPLICAGUID", self.replica_guid.to_string()),
        ])
    }
}

/// Whether a mailbox user record is already present under the server's
/// subtree.
///
/// Returns `true` when the user exists. Fails with a typed error if the
/// server entry itself cannot be uniquely resolved.
#[instrument(skip(directory))]
pub async fn user_exists<D: Directory + ?Sized>(
    directory: &D,
    server: &str,
    username: &str,
) -> ProvisionResult<bool> {
    let server_entry = counter::resolve_server(directory, server).await?;
    let filter = filter::user_by_name(username);
    let entries = directory
        .search(&server_entry.dn, SearchScope::Subtree, &filter, &[])
        .await?;
    Ok(!entries.is_empty())
}

/// Add a mailbox user record.
///
/// No existence check here; callers run [`user_exists`] first. A duplicate
/// add surfaces as the directory's own uniqueness rejection.
#[instrument(skip(directory, org, templates))]
pub async fn add_user<D: Directory + ?Sized>(
    directory: &D,
    org: &OrgNames,
    templates: &TemplateSet,
    username: &str,
) -> ProvisionResult<UserRecord> {
    let record = UserRecord::generate(username);

    info!(username, "adding user record");

    let entries = templates.user.render_entries(&record.bindings(org))?;
    for entry in &entries {
        directory.add(entry).await?;
    }

    Ok(record)
}

/// Add one well-known root folder under a user's mailbox subtree.
///
/// The folder identifier is derived from the supplied counter value and
/// replica tag; freshness of the counter value is the caller's problem.
#[instrument(skip(directory, org, templates))]
pub async fn add_root_folder<D: Directory + ?Sized>(
    directory: &D,
    org: &OrgNames,
    templates: &TemplateSet,
    username: &str,
    folder_name: &str,
    global_count: GlobalCount,
    replica_id: ReplicaId,
    system_index: u32,
) -> ProvisionResult<FolderId> {
    let fid = FolderId::generate(global_count, replica_id);

    info!(fid = %fid, folder_name, username, "adding system root folder");

    let bindings = HashMap::from([
        ("USERDN", org.user_dn(username)),
        ("FOLDER_IDX", fid.to_string()),
        ("NAME", folder_name.to_string()),
        ("SYSTEMIDX", system_index.to_string()),
    ]);

    let entries = templates.folder.render_entries(&bindings)?;
    for entry in &entries {
        directory.add(entry).await?;
    }

    Ok(fid)
}

/// Everything a full mailbox provisioning run produced.
#[derive(Debug, Clone)]
pub struct MailboxSummary {
    pub user: UserRecord,
    pub folders: Vec<(SystemFolder, FolderId)>,
    /// Counter value written back after the folder identifiers were taken.
    pub next_global_count: GlobalCount,
}

/// Provision a complete mailbox: the user record plus every well-known
/// root folder, consuming consecutive counter slots, with the advanced
/// counter written back at the end.
///
/// Lookup-then-add is not atomic; concurrent provisioning of the same
/// username is racy by construction.
#[instrument(skip(directory, org, templates))]
pub async fn provision_mailbox<D: Directory + ?Sized>(
    directory: &D,
    server: &str,
    org: &OrgNames,
    templates: &TemplateSet,
    username: &str,
) -> ProvisionResult<MailboxSummary> {
    if user_exists(directory, server, username).await? {
        return Err(ProvisionError::UserAlreadyExists {
            username: username.to_string(),
        });
    }

    let user = add_user(directory, org, templates, username).await?;

    let mut global_count = counter::global_count(directory, server).await?;
    let replica_id = counter::replica_id(directory, server).await?;

    let mut folders = Vec::with_capacity(SystemFolder::ALL.len());
    for folder in SystemFolder::ALL {
        let fid = add_root_folder(
            directory,
            org,
            templates,
            username,
            folder.display_name(),
            global_count,
            replica_id,
            folder.system_index(),
        )
        .await?;
        folders.push((folder, fid));
        global_count = global_count.next()?;
    }

    counter::set_global_count(directory, server, global_count).await?;

    info!(
        username,
        folders = folders.len(),
        next_global_count = %global_count,
        "mailbox provisioned"
    );

    Ok(MailboxSummary {
        user,
        folders,
        next_global_count: global_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_dn_escapes_username() {
        let org = OrgNames::new("CN=First Organization,dc=example,dc=com");
        assert_eq!(
            org.user_dn("jdoe"),
            "CN=jdoe,CN=First Organization,dc=example,dc=com"
        );
        assert_eq!(
            org.user_dn("j,doe"),
            "CN=j\\,doe,CN=First Organization,dc=example,dc=com"
        );
    }

    #[test]
    fn test_system_folder_indexes_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for folder in SystemFolder::ALL {
            assert!(seen.insert(folder.system_index()));
        }
    }

    #[test]
    fn test_user_record_guids_are_fresh() {
        let a = UserRecord::generate("jdoe");
        let b = UserRecord::generate("jdoe");
        assert_ne!(a.mailbox_guid, b.mailbox_guid);
        assert_ne!(a.replica_guid, b.replica_guid);
        assert_ne!(a.mailbox_guid, a.replica_guid);
        assert_eq!(a.replica_id, ReplicaId::LOCAL);
    }

    #[test]
    fn test_user_bindings_cover_template() {
        let org = OrgNames::new("CN=First Organization,dc=example,dc=com");
        let record = UserRecord::generate("jdoe");
        let entries = TemplateSet::embedded()
            .user
            .render_entries(&record.bindings(&org))
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].dn,
            "CN=jdoe,CN=First Organization,dc=example,dc=com"
        );
        assert_eq!(entries[0].first("ReplicaID"), Some("1"));
        assert_eq!(
            entries[0].first("MailboxGUID"),
            Some(record.mailbox_guid.to_string().as_str())
        );
    }
}
