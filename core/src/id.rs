use std::{
    fmt,
    ops::Deref,
    sync::atomic::{AtomicU64, Ordering},
};

use compact_str::{CompactString, ToCompactString};
use serde::{Deserialize, Serialize};

/// Identifies which remote object an event addresses.
///
/// The empty id addresses the bridge itself (process-scoped events) and is
/// omitted on the wire.
#[derive(
    Debug,
    Default,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct ObjectId(CompactString);

impl ObjectId {
    /// The id used for process-scoped events.
    pub const fn app() -> Self {
        Self(CompactString::const_new(""))
    }

    pub fn is_app(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl Deref for ObjectId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Hands out object ids for one bridge.
///
/// Ids increase monotonically and are never reused, so a listener keyed on a
/// destroyed object's id can never observe events meant for a newer object.
#[derive(Debug)]
pub struct Identifier {
    counter: AtomicU64,
}

impl Identifier {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> ObjectId {
        let id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        ObjectId(id.to_compact_string())
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::new()
    }
}
