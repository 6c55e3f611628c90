//! # exodb directory client
//!
//! Client layer for the directory database that backs exodb mailbox
//! provisioning.
//!
//! The directory service owns every record this workspace touches; this
//! crate only opens connections, runs filtered searches, renders LDIF
//! records from templates, and submits add/modify operations. It provides:
//!
//! - LDAP v3 protocol support with STARTTLS
//! - A [`Directory`] trait so provisioning logic can run against an
//!   in-memory double in tests
//! - RFC 5805 transaction bracketing for single-attribute replaces
//! - `${NAME}` template substitution for provisioning records
//!
//! ## Example
//!
//! ```ignore
//! use exodb_directory::{DirectoryConfig, LdapDirectory, SearchScope};
//!
//! let config = DirectoryConfig::new("ldap.example.com", "dc=example,dc=com")
//!     .with_bind("cn=admin,dc=example,dc=com", "secret");
//!
//! let directory = LdapDirectory::new(config)?;
//! let entries = directory
//!     .search("", SearchScope::Subtree, "(objectClass=server)", &["cn"])
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod dn;
pub mod error;
pub mod filter;
pub mod ldif;

// Re-exports
pub use client::{require_one, Directory, Entry, LdapDirectory, SearchScope};
pub use config::DirectoryConfig;
pub use error::{DirectoryError, DirectoryResult};
pub use ldif::{ChangeRecord, Template};
