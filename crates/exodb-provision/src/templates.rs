//! Provisioning record templates.
//!
//! The two LDIF templates are a fixed contract with the message-database
//! schema; the embedded copies ship with the crate and a deployment can
//! override them from a setup directory.

use std::path::Path;

use exodb_directory::{DirectoryResult, Template};

const USER_TEMPLATE: &str = include_str!("../templates/mailbox_user.ldif");
const FOLDER_TEMPLATE: &str = include_str!("../templates/mailbox_folder.ldif");

/// The pair of templates mailbox provisioning renders.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    /// User record template (`USERNAME`, `FIRSTORGDN`, `MAILBOXGUID`,
    /// `REPLICAID`, `REPLICAGUID`).
    pub user: Template,
    /// Root folder template (`USERDN`, `FOLDER_IDX`, `NAME`, `SYSTEMIDX`).
    pub folder: Template,
}

impl TemplateSet {
    /// The templates embedded in the crate.
    pub fn embedded() -> Self {
        Self {
            user: Template::new(USER_TEMPLATE),
            folder: Template::new(FOLDER_TEMPLATE),
        }
    }

    /// Load `mailbox_user.ldif` and `mailbox_folder.ldif` from a setup
    /// directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> DirectoryResult<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            user: Template::from_file(dir.join("mailbox_user.ldif"))?,
            folder: Template::from_file(dir.join("mailbox_folder.ldif"))?,
        })
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::embedded()
    }
}
