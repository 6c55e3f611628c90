//! # exodb mailbox provisioning
//!
//! Provisions mailbox-related records in the directory database backing a
//! groupware messaging system: replica counters on the server entry, user
//! records with their generated GUIDs, and the well-known root folders
//! keyed by derived folder identifiers.
//!
//! The directory service owns all state. Operations run against the
//! [`Directory`](exodb_directory::Directory) seam, open nothing ahead of
//! time, cache nothing across calls, and take no locks; the only
//! transactional step is the global counter replace.
//!
//! ## Example
//!
//! ```ignore
//! use exodb_directory::{DirectoryConfig, LdapDirectory};
//! use exodb_provision::{mailbox, OrgNames, TemplateSet};
//!
//! let directory = LdapDirectory::new(config)?;
//! let org = OrgNames::new("CN=First Organization,dc=example,dc=com");
//! let summary = mailbox::provision_mailbox(
//!     &directory,
//!     "mdb1",
//!     &org,
//!     &TemplateSet::embedded(),
//!     "jdoe",
//! )
//! .await?;
//! ```

pub mod counter;
pub mod error;
pub mod fid;
pub mod mailbox;
pub mod templates;

// Re-exports
pub use error::{ProvisionError, ProvisionResult};
pub use fid::{FolderId, GlobalCount, ReplicaId};
pub use mailbox::{MailboxSummary, OrgNames, SystemFolder, UserRecord};
pub use templates::TemplateSet;
