//! The status taxonomy returned by every [`crate::CuckooMap`] operation.

/// Outcome of a [`crate::CuckooMap`] operation.
///
/// This is a status code, not an error type in the `std::error::Error`
/// sense: `Success` is an expected, non-exceptional variant, and callers are
/// meant to match on the full set rather than propagate it with `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    /// The operation completed as requested.
    Success,
    /// Reserved for internal argument validation; not surfaced by the public API today.
    InvalidArgument,
    /// Internal: a bounded displacement chain exhausted its budget without finding a home.
    InsertFailed,
    /// The map failed to allocate its backing storage and is unusable.
    NotInited,
    /// `insert` found the key already present and `overwrite` was `false`.
    KeyExists,
    /// `get`/`exist`/`erase` found no matching key in either candidate bucket.
    KeyDoesNotExist,
    /// Internal: a single displacement step found no free slot in the victim's alternate bucket.
    ReplaceFailed,
    /// Rehashing could not converge before `capacity` would exceed the hard cap.
    RehashFailed,
    /// Reserved for internal copy-failure bookkeeping; not surfaced by the public API today.
    CopyFailed,
    /// The key has bit 62 or bit 63 set and is therefore not a valid 62-bit payload.
    InvalidKey,
}
