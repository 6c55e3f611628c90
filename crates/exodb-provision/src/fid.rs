//! Folder identifier allocation.
//!
//! A folder identifier combines the message database's global counter with
//! the replica tag of the database that produced it: 12 hex digits of
//! counter followed by 4 of replica, `0x`-prefixed. For a fixed replica the
//! identifiers are strictly ordered by counter value, and no two folders
//! share a counter value as long as callers advance the counter between
//! allocations — this module only renders the values it is handed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;

/// Number of hex digits the global counter occupies in a folder id.
const GLOBAL_COUNT_DIGITS: u32 = 12;

/// The message database's global identifier counter.
///
/// Externally-owned state: the live value is an attribute of the server
/// entry in the directory, exchanged as a `0x`-prefixed hex string. This
/// type only carries it between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalCount(u64);

impl GlobalCount {
    /// Largest value that fits the 12-digit field.
    pub const MAX: u64 = (1 << (4 * GLOBAL_COUNT_DIGITS)) - 1;

    /// Wrap a raw counter value, rejecting values past the field width.
    pub fn new(value: u64) -> Result<Self, ProvisionError> {
        if value > Self::MAX {
            return Err(ProvisionError::CounterOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// The raw counter value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The counter advanced by `n` slots.
    pub fn advanced(&self, n: u64) -> Result<Self, ProvisionError> {
        let value = self
            .0
            .checked_add(n)
            .ok_or(ProvisionError::CounterOutOfRange { value: u64::MAX })?;
        Self::new(value)
    }

    /// The next counter value.
    pub fn next(&self) -> Result<Self, ProvisionError> {
        self.advanced(1)
    }

    /// Encoding used for the directory attribute value.
    pub fn to_attribute(&self) -> String {
        format!("0x{:x}", self.0)
    }

    /// Parse a directory attribute value (hex, `0x` prefix optional).
    pub fn from_attribute(value: &str) -> Result<Self, ProvisionError> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        let raw = u64::from_str_radix(digits, 16).map_err(|_| {
            ProvisionError::InvalidCounterValue {
                attribute: "GlobalCount".to_string(),
                value: value.to_string(),
            }
        })?;
        Self::new(raw)
    }
}

impl fmt::Display for GlobalCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_attribute())
    }
}

/// The replica tag of a message database.
///
/// 16 bits by construction, so the folder-id field width is enforced by
/// the type. Newly provisioned mailboxes are always replica 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicaId(u16);

impl ReplicaId {
    /// The replica tag assigned to newly provisioned mailboxes.
    pub const LOCAL: Self = Self(1);

    pub fn new(value: u16) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// Encoding used for the directory attribute value.
    pub fn to_attribute(&self) -> String {
        format!("0x{:x}", self.0)
    }

    /// Parse a directory attribute value (hex, `0x` prefix optional).
    pub fn from_attribute(value: &str) -> Result<Self, ProvisionError> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        let raw = u16::from_str_radix(digits, 16).map_err(|_| {
            ProvisionError::InvalidCounterValue {
                attribute: "ReplicaID".to_string(),
                value: value.to_string(),
            }
        })?;
        Ok(Self(raw))
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_attribute())
    }
}

/// A folder identifier derived from a counter value and a replica tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FolderId {
    global_count: GlobalCount,
    replica_id: ReplicaId,
}

impl FolderId {
    /// Combine a counter value and replica tag into a folder identifier.
    pub fn generate(global_count: GlobalCount, replica_id: ReplicaId) -> Self {
        Self {
            global_count,
            replica_id,
        }
    }

    pub fn global_count(&self) -> GlobalCount {
        self.global_count
    }

    pub fn replica_id(&self) -> ReplicaId {
        self.replica_id
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:012x}{:04x}",
            self.global_count.value(),
            self.replica_id.value()
        )
    }
}

impl FromStr for FolderId {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProvisionError::InvalidCounterValue {
            attribute: "FolderId".to_string(),
            value: s.to_string(),
        };

        let digits = s.strip_prefix("0x").ok_or_else(invalid)?;
        // Hex digits are one byte each, so after this check byte offsets
        // are safe to split at.
        if digits.len() != 16 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let (count, replica) = digits.split_at(12);
        let global_count =
            GlobalCount::new(u64::from_str_radix(count, 16).map_err(|_| invalid())?)?;
        let replica_id = ReplicaId::new(u16::from_str_radix(replica, 16).map_err(|_| invalid())?);
        Ok(Self::generate(global_count, replica_id))
    }
}
