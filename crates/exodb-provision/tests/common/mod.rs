//! Shared test double for provisioning tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use exodb_directory::{ChangeRecord, Directory, DirectoryResult, Entry, SearchScope};

/// One recorded directory call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Search {
        base: String,
        filter: String,
        attrs: Vec<String>,
    },
    Add {
        dn: String,
    },
    Replace {
        dn: String,
        attribute: String,
        value: String,
    },
    TransactionStart,
    TransactionCommit,
}

/// In-memory [`Directory`] double: records every call and plays back
/// scripted search results in order. An unscripted search matches nothing.
#[derive(Default)]
pub struct MockDirectory {
    ops: Mutex<Vec<Op>>,
    search_results: Mutex<VecDeque<Vec<Entry>>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next search call.
    pub fn push_search(&self, entries: Vec<Entry>) {
        self.search_results.lock().unwrap().push_back(entries);
    }

    /// Everything the code under test did, in order.
    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    fn record(&self, op: Op) {
        self.ops.lock().unwrap().push(op);
    }
}

#[async_trait]
impl Directory for MockDirectory {
    async fn search(
        &self,
        base: &str,
        _scope: SearchScope,
        filter: &str,
        attrs: &[&str],
    ) -> DirectoryResult<Vec<Entry>> {
        self.record(Op::Search {
            base: base.to_string(),
            filter: filter.to_string(),
            attrs: attrs.iter().map(ToString::to_string).collect(),
        });
        Ok(self
            .search_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn add(&self, entry: &Entry) -> DirectoryResult<()> {
        self.record(Op::Add {
            dn: entry.dn.clone(),
        });
        Ok(())
    }

    async fn modify_replace(&self, record: &ChangeRecord) -> DirectoryResult<()> {
        self.record(Op::Replace {
            dn: record.dn.clone(),
            attribute: record.attribute.clone(),
            value: record.value.clone(),
        });
        Ok(())
    }

    async fn transaction_start(&self) -> DirectoryResult<()> {
        self.record(Op::TransactionStart);
        Ok(())
    }

    async fn transaction_commit(&self) -> DirectoryResult<()> {
        self.record(Op::TransactionCommit);
        Ok(())
    }
}

/// The unique server entry for a message database, with optional counter
/// attributes.
pub fn server_entry(name: &str, attrs: &[(&str, &str)]) -> Entry {
    let mut entry = Entry::new(format!("CN={name},dc=example,dc=com"))
        .with_attr("objectClass", "server")
        .with_attr("cn", name);
    for (attr, value) in attrs {
        entry.push_attr(*attr, *value);
    }
    entry
}
