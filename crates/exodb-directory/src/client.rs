//! Directory client: the `Directory` trait and its LDAP implementation.
//!
//! Provisioning code talks to the directory only through [`Directory`], so
//! tests can substitute an in-memory double. [`LdapDirectory`] is the real
//! implementation; it holds at most one lazily opened connection, and
//! callers create one instance per provisioning operation so connection
//! lifetime stays scoped to the call.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use ldap3::controls::RawControl;
use ldap3::exop::Exop;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::ldif::ChangeRecord;

/// RFC 5805 Start Transaction extended operation.
const TXN_START_OID: &str = "1.3.6.1.1.21.1";
/// RFC 5805 Transaction Specification control.
const TXN_SPEC_OID: &str = "1.3.6.1.1.21.2";
/// RFC 5805 End Transaction extended operation.
const TXN_END_OID: &str = "1.3.6.1.1.21.3";

/// Search scope for directory queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// The base entry only.
    Base,
    /// Direct children of the base entry.
    OneLevel,
    /// The base entry and its whole subtree.
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

/// A directory entry: a DN plus multi-valued string attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl Entry {
    /// Create an empty entry with the given DN.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    /// Append a value to an attribute.
    pub fn push_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.entry(name.into()).or_default().push(value.into());
    }

    /// Builder form of [`push_attr`](Self::push_attr).
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_attr(name, value);
        self
    }

    /// First value of an attribute. Attribute names compare
    /// case-insensitively, as LDAP attribute names do (RFC 4512).
    pub fn first(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.first())
            .map(String::as_str)
    }
}

/// The directory service seam.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Run a filtered search and return the matching entries.
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attrs: &[&str],
    ) -> DirectoryResult<Vec<Entry>>;

    /// Add one entry.
    async fn add(&self, entry: &Entry) -> DirectoryResult<()>;

    /// Apply a single-attribute replace change record.
    async fn modify_replace(&self, record: &ChangeRecord) -> DirectoryResult<()>;

    /// Begin a transaction.
    async fn transaction_start(&self) -> DirectoryResult<()>;

    /// Commit the current transaction.
    async fn transaction_commit(&self) -> DirectoryResult<()>;
}

/// Reduce a search result to the exactly-one entry the schema guarantees.
///
/// Zero matches is [`DirectoryError::NotFound`]; several is
/// [`DirectoryError::Ambiguous`]. Both are hard precondition failures for
/// the caller, never recovered into a default.
pub fn require_one(mut entries: Vec<Entry>, filter: &str) -> DirectoryResult<Entry> {
    match entries.len() {
        1 => Ok(entries.remove(0)),
        0 => Err(DirectoryError::NotFound {
            filter: filter.to_string(),
        }),
        count => Err(DirectoryError::Ambiguous {
            filter: filter.to_string(),
            count,
        }),
    }
}

/// LDAP-backed directory client.
pub struct LdapDirectory {
    config: DirectoryConfig,

    /// Cached connection (lazily initialized).
    connection: Arc<RwLock<Option<Ldap>>>,

    /// Identifier of the transaction in flight, if any.
    txn_id: Arc<RwLock<Option<Vec<u8>>>>,
}

impl LdapDirectory {
    /// Create a client for the given configuration.
    pub fn new(config: DirectoryConfig) -> DirectoryResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            connection: Arc::new(RwLock::new(None)),
            txn_id: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the connection, opening it on first use.
    async fn get_connection(&self) -> DirectoryResult<Ldap> {
        {
            let guard = self.connection.read().await;
            if let Some(ref conn) = *guard {
                return Ok(conn.clone());
            }
        }

        let conn = self.create_connection().await?;

        {
            let mut guard = self.connection.write().await;
            *guard = Some(conn.clone());
        }

        Ok(conn)
    }

    async fn create_connection(&self) -> DirectoryResult<Ldap> {
        let url = self.config.url();

        debug!(url = %url, "connecting to directory server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(std::time::Duration::from_secs(
                self.config.connect_timeout_secs,
            ))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                DirectoryError::connection_failed_with_source(
                    format!("failed to connect to directory server at {url}"),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "directory connection driver error");
            }
        });

        let bind_dn = &self.config.bind_dn;
        let bind_password = self.config.bind_password.as_deref().unwrap_or("");

        debug!(bind_dn = %bind_dn, "performing bind");

        let result = ldap.simple_bind(bind_dn, bind_password).await.map_err(|e| {
            DirectoryError::connection_failed_with_source(format!("bind failed for {bind_dn}"), e)
        })?;

        if result.rc != 0 {
            if result.rc == 49 {
                return Err(DirectoryError::AuthenticationFailed);
            }
            return Err(DirectoryError::connection_failed(format!(
                "bind failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(host = %self.config.host, "directory connection established");

        Ok(ldap)
    }

    /// Encode the RFC 5805 End Transaction request value.
    ///
    /// `SEQUENCE { commit BOOLEAN DEFAULT TRUE, identifier OCTET STRING }`.
    fn end_txn_request(txn_id: &[u8], commit: bool) -> Vec<u8> {
        let mut inner = Vec::with_capacity(txn_id.len() + 6);
        if !commit {
            inner.extend_from_slice(&[0x01, 0x01, 0x00]);
        }
        inner.push(0x04);
        Self::push_ber_len(&mut inner, txn_id.len());
        inner.extend_from_slice(txn_id);

        let mut out = Vec::with_capacity(inner.len() + 4);
        out.push(0x30);
        Self::push_ber_len(&mut out, inner.len());
        out.extend_from_slice(&inner);
        out
    }

    fn push_ber_len(out: &mut Vec<u8>, len: usize) {
        if len < 0x80 {
            out.push(len as u8);
        } else {
            // Transaction identifiers are short in practice, but encode the
            // long form rather than silently corrupting the request.
            let bytes = len.to_be_bytes();
            let skip = bytes.iter().take_while(|b| **b == 0).count();
            out.push(0x80 | (bytes.len() - skip) as u8);
            out.extend_from_slice(&bytes[skip..]);
        }
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    #[instrument(skip(self))]
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attrs: &[&str],
    ) -> DirectoryResult<Vec<Entry>> {
        let mut ldap = self.get_connection().await?;

        let attrs = if attrs.is_empty() { &["*"][..] } else { attrs };

        let result = ldap
            .search(base, scope.into(), filter, attrs.to_vec())
            .await
            .map_err(|e| DirectoryError::operation_failed_with_source("search failed", e))?;

        let (entries, _res) = result
            .success()
            .map_err(|e| DirectoryError::operation_failed(format!("search failed: {e}")))?;

        let entries: Vec<Entry> = entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(|e| Entry {
                dn: e.dn,
                attrs: e.attrs,
            })
            .collect();

        debug!(filter = %filter, matched = entries.len(), "search completed");

        Ok(entries)
    }

    #[instrument(skip(self, entry), fields(dn = %entry.dn))]
    async fn add(&self, entry: &Entry) -> DirectoryResult<()> {
        let mut ldap = self.get_connection().await?;

        let attrs: Vec<(&str, HashSet<&str>)> = entry
            .attrs
            .iter()
            .map(|(name, values)| (name.as_str(), values.iter().map(String::as_str).collect()))
            .collect();

        let result = ldap.add(&entry.dn, attrs).await.map_err(|e| {
            DirectoryError::operation_failed_with_source(
                format!("failed to add entry {}", entry.dn),
                e,
            )
        })?;

        if result.rc == 68 {
            return Err(DirectoryError::AlreadyExists {
                dn: entry.dn.clone(),
            });
        }
        if result.rc != 0 {
            return Err(DirectoryError::operation_failed(format!(
                "add failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(dn = %entry.dn, "entry added");

        Ok(())
    }

    #[instrument(skip(self, record), fields(dn = %record.dn, attribute = %record.attribute))]
    async fn modify_replace(&self, record: &ChangeRecord) -> DirectoryResult<()> {
        let mut ldap = self.get_connection().await?;

        debug!(ldif = %record.to_ldif(), "applying change record");

        let mods = vec![ldap3::Mod::Replace(
            record.attribute.clone(),
            HashSet::from([record.value.clone()]),
        )];

        // Inside a transaction every modify carries the transaction
        // specification control (RFC 5805).
        let txn_id = self.txn_id.read().await.clone();
        let result = if let Some(txn_id) = txn_id {
            ldap.with_controls(RawControl {
                ctype: TXN_SPEC_OID.to_string(),
                crit: true,
                val: Some(txn_id),
            })
            .modify(&record.dn, mods)
            .await
        } else {
            ldap.modify(&record.dn, mods).await
        }
        .map_err(|e| {
            DirectoryError::operation_failed_with_source(
                format!("failed to modify entry {}", record.dn),
                e,
            )
        })?;

        if result.rc == 32 {
            return Err(DirectoryError::NoSuchObject {
                dn: record.dn.clone(),
            });
        }
        if result.rc != 0 {
            return Err(DirectoryError::operation_failed(format!(
                "modify failed with code {}: {}",
                result.rc, result.text
            )));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn transaction_start(&self) -> DirectoryResult<()> {
        // Starting over an open transaction would orphan it server-side
        // with no identifier left to commit or abort it.
        if self.txn_id.read().await.is_some() {
            return Err(DirectoryError::TransactionFailed {
                message: "transaction already in flight".to_string(),
            });
        }

        let mut ldap = self.get_connection().await?;

        let result = ldap
            .extended(Exop {
                name: Some(TXN_START_OID.to_string()),
                val: None,
            })
            .await
            .map_err(|e| DirectoryError::TransactionFailed {
                message: format!("start transaction failed: {e}"),
            })?;

        let (exop, res) = result
            .success()
            .map_err(|e| DirectoryError::TransactionFailed {
                message: format!("start transaction rejected: {e}"),
            })?;

        if res.rc != 0 {
            return Err(DirectoryError::TransactionFailed {
                message: format!("start transaction failed with code {}: {}", res.rc, res.text),
            });
        }

        let txn_id = exop.val.unwrap_or_default();
        debug!(txn_id_len = txn_id.len(), "transaction started");
        *self.txn_id.write().await = Some(txn_id);

        Ok(())
    }

    #[instrument(skip(self))]
    async fn transaction_commit(&self) -> DirectoryResult<()> {
        let txn_id = self.txn_id.write().await.take().ok_or_else(|| {
            DirectoryError::TransactionFailed {
                message: "commit without a transaction in flight".to_string(),
            }
        })?;

        let mut ldap = self.get_connection().await?;

        let result = ldap
            .extended(Exop {
                name: Some(TXN_END_OID.to_string()),
                val: Some(Self::end_txn_request(&txn_id, true)),
            })
            .await
            .map_err(|e| DirectoryError::TransactionFailed {
                message: format!("commit failed: {e}"),
            })?;

        let (_exop, res) = result
            .success()
            .map_err(|e| DirectoryError::TransactionFailed {
                message: format!("commit rejected: {e}"),
            })?;

        if res.rc != 0 {
            return Err(DirectoryError::TransactionFailed {
                message: format!("commit failed with code {}: {}", res.rc, res.text),
            });
        }

        info!("transaction committed");

        Ok(())
    }
}

impl std::fmt::Debug for LdapDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectory")
            .field("config", &self.config)
            .finish()
    }
}
