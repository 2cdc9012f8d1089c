//! A bucketized cuckoo hash map for 62-bit integer keys and small, `Copy` values.
//!
//! Built for hot lookup paths — ad-serving feature tables and similar — where
//! keys are already numeric and the win is avoiding a per-slot metadata byte:
//! validity and hash-function origin live inline in the top two bits of the
//! key word instead, so a 4-slot bucket is exactly one cache line.
//!
//! ```
//! use ad_cuckoo_map::{CuckooMap, OpStatus};
//!
//! let mut map: CuckooMap<u64> = CuckooMap::new();
//! assert_eq!(map.insert(42, 7, false), OpStatus::Success);
//! assert_eq!(map.get(42), (OpStatus::Success, Some(7)));
//! ```
//!
//! This is deliberately not a general-purpose `HashMap` replacement: no
//! iteration, no concurrent access, no keys wider than 62 bits, no values
//! wider than one machine word. See each module's documentation for the full
//! contract.

mod config;
mod error;
mod hash;
mod map;

pub use config::CuckooConfig;
pub use error::OpStatus;
pub use hash::{
    ap_hash64, bkdr_hash64, dek_hash64, dek_hash_str, djb2_hash64, fnv_hash64, github_mix_hash64,
    knuth_hash64, murmur3_hash64, rs_hash64, sdbm_hash64, ApHash, BkdrHash, DekHash, Djb2Hash,
    FnvHash, GithubMixHash, HashFn64, KnuthHash, MurmurHash3Finalizer, RsHash, SdbmHash,
};
pub use map::CuckooMap;
