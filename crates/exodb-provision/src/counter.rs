//! Replica counter access on the message database's server entry.
//!
//! The global counter and replica tag live as attributes of the unique
//! `server` entry in the directory; the directory is their sole owner and
//! nothing is cached across calls. The counter replace is the only
//! transactional operation in this workspace. There is no optimistic
//! concurrency check: a concurrent writer between the search and the
//! commit silently wins or loses, exactly as in the backing store's own
//! semantics.

use tracing::{debug, info, instrument};

use exodb_directory::error::DirectoryError;
use exodb_directory::{filter, require_one, ChangeRecord, Directory, Entry, SearchScope};

use crate::error::ProvisionResult;
use crate::fid::{GlobalCount, ReplicaId};

/// Server-entry attribute holding the global identifier counter.
pub const GLOBAL_COUNT_ATTR: &str = "GlobalCount";
/// Server-entry attribute holding the replica tag.
pub const REPLICA_ID_ATTR: &str = "ReplicaID";

/// Resolve the unique server entry for a message database.
///
/// The schema guarantees one server entry per name; zero or several
/// matches is a precondition failure surfaced as a typed error.
pub(crate) async fn resolve_server<D: Directory + ?Sized>(
    directory: &D,
    server: &str,
) -> ProvisionResult<Entry> {
    let filter = filter::server_by_name(server);
    let entries = directory
        .search("", SearchScope::Subtree, &filter, &[])
        .await?;
    Ok(require_one(entries, &filter)?)
}

/// Read a raw attribute value from the server entry.
///
/// Requests only the named attribute, not the whole entry.
pub async fn message_attribute<D: Directory + ?Sized>(
    directory: &D,
    server: &str,
    attribute: &str,
) -> ProvisionResult<String> {
    let filter = filter::server_by_name(server);
    let entries = directory
        .search("", SearchScope::Subtree, &filter, &[attribute])
        .await?;
    let entry = require_one(entries, &filter)?;
    let value = entry
        .first(attribute)
        .ok_or_else(|| DirectoryError::MissingAttribute {
            dn: entry.dn.clone(),
            attribute: attribute.to_string(),
        })?;
    Ok(value.to_string())
}

/// Current global counter of a message database.
#[instrument(skip(directory))]
pub async fn global_count<D: Directory + ?Sized>(
    directory: &D,
    server: &str,
) -> ProvisionResult<GlobalCount> {
    let value = message_attribute(directory, server, GLOBAL_COUNT_ATTR).await?;
    GlobalCount::from_attribute(&value)
}

/// Replica tag of a message database.
#[instrument(skip(directory))]
pub async fn replica_id<D: Directory + ?Sized>(
    directory: &D,
    server: &str,
) -> ProvisionResult<ReplicaId> {
    let value = message_attribute(directory, server, REPLICA_ID_ATTR).await?;
    ReplicaId::from_attribute(&value)
}

/// Replace the global counter of a message database.
///
/// Exactly one replace, bracketed by one transaction begin and one commit.
/// A failed commit propagates unchanged and leaves the counter as it was.
#[instrument(skip(directory))]
pub async fn set_global_count<D: Directory + ?Sized>(
    directory: &D,
    server: &str,
    value: GlobalCount,
) -> ProvisionResult<()> {
    let entry = resolve_server(directory, server).await?;
    let record = ChangeRecord::replace(entry.dn, GLOBAL_COUNT_ATTR, value.to_attribute());

    debug!(ldif = %record.to_ldif(), "updating global counter");

    directory.transaction_start().await?;
    directory.modify_replace(&record).await?;
    directory.transaction_commit().await?;

    info!(server, value = %value, "global counter updated");

    Ok(())
}

/// Allocate a range of `count` identifier slots.
///
/// Returns the first slot of the range; the counter is advanced past the
/// range and written back. The read and the write are separate directory
/// calls, so two concurrent allocators can hand out overlapping ranges;
/// contention control belongs to the deployment, not this client.
#[instrument(skip(directory))]
pub async fn allocate<D: Directory + ?Sized>(
    directory: &D,
    server: &str,
    count: u64,
) -> ProvisionResult<GlobalCount> {
    let start = global_count(directory, server).await?;
    if count == 0 {
        return Ok(start);
    }
    let next = start.advanced(count)?;
    set_global_count(directory, server, next).await?;
    Ok(start)
}
