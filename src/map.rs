//! The bucketized cuckoo hash map.
//!
//! Slot validity and hash-function origin are packed into the top two bits
//! of the 64-bit key word rather than kept in a side control array, so a
//! bucket of [`SLOT_WIDE`] slots is exactly one cache line and a probe never
//! costs more than one or two line fetches.

use std::mem::MaybeUninit;

use tracing::{debug, trace, warn};

use crate::config::CuckooConfig;
use crate::error::OpStatus;
use crate::hash::{HashFn64, KnuthHash, MurmurHash3Finalizer};

/// Number of slots per bucket: `64 / size_of::<(u64, u64)>()`.
const SLOT_WIDE: usize = 4;

const VALID_MASK: u64 = 1 << 63;
const HASH_MASK: u64 = 1 << 62;
const FLAG_MASK: u64 = VALID_MASK | HASH_MASK;
const KEY_MASK: u64 = (1 << 62) - 1;

/// Hard ceiling on `capacity`. Past this, rehashing gives up rather than grow forever.
const MAX_CAPACITY: usize = 1 << 29;

#[inline(always)]
const fn is_occupied(tagged_key: u64) -> bool {
    tagged_key & VALID_MASK != 0
}

#[inline(always)]
const fn origin_is_h2(tagged_key: u64) -> bool {
    tagged_key & HASH_MASK != 0
}

#[inline(always)]
const fn payload(tagged_key: u64) -> u64 {
    tagged_key & KEY_MASK
}

#[derive(Clone, Copy)]
struct Slot<V: Copy> {
    tagged_key: u64,
    value: MaybeUninit<V>,
}

impl<V: Copy> Slot<V> {
    const fn empty() -> Self {
        Self {
            tagged_key: 0,
            value: MaybeUninit::uninit(),
        }
    }
}

/// A group of [`SLOT_WIDE`] slots sharing one bucket index. `repr(align(64))`
/// keeps a bucket to one cache line for the common `V: u64`-sized case.
#[derive(Clone, Copy)]
#[repr(align(64))]
struct Bucket<V: Copy>([Slot<V>; SLOT_WIDE]);

impl<V: Copy> Bucket<V> {
    const fn empty() -> Self {
        Self([Slot::empty(); SLOT_WIDE])
    }
}

/// A bucketized cuckoo hash map keyed by 62-bit unsigned integers.
///
/// Generic over the value type `V` (must be `Copy` and no larger than one
/// machine word) and over its two hash functions `H1`/`H2`, defaulting to
/// [`KnuthHash`] and [`MurmurHash3Finalizer`].
///
/// See the crate-level documentation for the full contract. In short: every
/// method returns an [`OpStatus`] rather than a `Result`, because `Success`
/// is itself an expected (non-error) outcome and callers are meant to match
/// on the whole status set.
pub struct CuckooMap<V: Copy, H1: HashFn64 = KnuthHash, H2: HashFn64 = MurmurHash3Finalizer> {
    buckets: Box<[Bucket<V>]>,
    bucket_mask: usize,
    size: usize,
    max_replace_size: u32,
    hf1: H1,
    hf2: H2,
    inited: bool,
}

impl<V: Copy, H1: HashFn64 + Default, H2: HashFn64 + Default> Default for CuckooMap<V, H1, H2> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy, H1: HashFn64 + Default, H2: HashFn64 + Default> CuckooMap<V, H1, H2> {
    /// Constructs a map with `capacity = 1024` and `max_replace_size = 100`.
    pub fn new() -> Self {
        Self::with_config(CuckooConfig::default())
    }

    /// Constructs a map from a [`CuckooConfig`], using the default hash pair.
    pub fn with_config(config: CuckooConfig) -> Self {
        Self::with_hashers(config, H1::default(), H2::default())
    }
}

impl<V: Copy, H1: HashFn64, H2: HashFn64> CuckooMap<V, H1, H2> {
    /// Constructs a map from a [`CuckooConfig`] and an explicit pair of hash functors.
    ///
    /// If the backing allocation fails, the returned instance is left
    /// uninitialized: every operation on it returns [`OpStatus::NotInited`].
    pub fn with_hashers(config: CuckooConfig, hf1: H1, hf2: H2) -> Self {
        let capacity = config.init_capacity.max(1).next_power_of_two();
        match allocate_buckets(capacity) {
            Some(buckets) => Self {
                buckets,
                bucket_mask: capacity - 1,
                size: 0,
                max_replace_size: config.max_replace_size,
                hf1,
                hf2,
                inited: true,
            },
            None => Self {
                buckets: Box::new([]),
                bucket_mask: 0,
                size: 0,
                max_replace_size: config.max_replace_size,
                hf1,
                hf2,
                inited: false,
            },
        }
    }

    /// Current number of buckets. Always a power of two.
    pub fn capacity(&self) -> usize {
        self.bucket_mask.wrapping_add(1)
    }

    /// Number of occupied slots.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Approximate load factor: fraction of buckets whose slot 0 is occupied.
    ///
    /// Intentionally samples only one slot per bucket; it is a cheap O(capacity)
    /// approximation, not a precise occupancy count.
    pub fn load_factor(&self) -> f64 {
        if !self.inited {
            return 0.0;
        }
        let occupied = self
            .buckets
            .iter()
            .filter(|bucket| is_occupied(bucket.0[0].tagged_key))
            .count();
        occupied as f64 / self.capacity() as f64
    }

    /// Resets every slot to empty and `size()` to zero. Capacity and hash functors are preserved.
    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            *bucket = Bucket::empty();
        }
        self.size = 0;
    }

    /// Looks up `key`, returning `(Success, Some(value))` on a hit or
    /// `(KeyDoesNotExist, None)` on a miss.
    pub fn get(&self, key: u64) -> (OpStatus, Option<V>) {
        if !self.inited {
            return (OpStatus::NotInited, None);
        }
        if key & FLAG_MASK != 0 {
            return (OpStatus::InvalidKey, None);
        }

        let idx1 = (self.hf1.hash(key) as usize) & self.bucket_mask;
        if let Some(value) = lookup(&self.buckets, idx1, key) {
            return (OpStatus::Success, Some(value));
        }
        let idx2 = (self.hf2.hash(key) as usize) & self.bucket_mask;
        if let Some(value) = lookup(&self.buckets, idx2, key) {
            return (OpStatus::Success, Some(value));
        }
        (OpStatus::KeyDoesNotExist, None)
    }

    /// `get` with the value discarded.
    pub fn exist(&self, key: u64) -> OpStatus {
        self.get(key).0
    }

    /// Removes `key` if present.
    pub fn erase(&mut self, key: u64) -> OpStatus {
        if !self.inited {
            return OpStatus::NotInited;
        }

        let idx1 = (self.hf1.hash(key) as usize) & self.bucket_mask;
        if let Some(pos) = find_matching_slot(&self.buckets, idx1, key) {
            self.buckets[idx1].0[pos] = Slot::empty();
            self.size -= 1;
            return OpStatus::Success;
        }
        let idx2 = (self.hf2.hash(key) as usize) & self.bucket_mask;
        if let Some(pos) = find_matching_slot(&self.buckets, idx2, key) {
            self.buckets[idx2].0[pos] = Slot::empty();
            self.size -= 1;
            return OpStatus::Success;
        }
        OpStatus::KeyDoesNotExist
    }

    /// Inserts `key -> value`.
    ///
    /// If `key` is already present: overwrites it and returns `Success` when
    /// `overwrite` is `true`, otherwise returns `KeyExists` without mutating
    /// the table.
    pub fn insert(&mut self, key: u64, value: V, overwrite: bool) -> OpStatus {
        if !self.inited {
            return OpStatus::NotInited;
        }
        if key & FLAG_MASK != 0 {
            return OpStatus::InvalidKey;
        }

        let bucket_mask = self.bucket_mask;
        let idx1 = (self.hf1.hash(key) as usize) & bucket_mask;
        let idx2 = (self.hf2.hash(key) as usize) & bucket_mask;

        if overwrite {
            if overwrite_matching(&mut self.buckets, idx1, key, value)
                || overwrite_matching(&mut self.buckets, idx2, key, value)
            {
                return OpStatus::Success;
            }
        } else if find_matching_slot(&self.buckets, idx1, key).is_some()
            || find_matching_slot(&self.buckets, idx2, key).is_some()
        {
            return OpStatus::KeyExists;
        }

        if let Some(pos) = first_free_slot(&self.buckets, idx1) {
            write_slot(&mut self.buckets, idx1, pos, key | VALID_MASK, value);
            self.size += 1;
            return OpStatus::Success;
        }
        if let Some(pos) = first_free_slot(&self.buckets, idx2) {
            write_slot(&mut self.buckets, idx2, pos, key | VALID_MASK | HASH_MASK, value);
            self.size += 1;
            return OpStatus::Success;
        }

        trace!(key, idx1, idx2, "both candidate buckets full, entering displacement chain");
        let mut seed = self.hf1.hash(idx1 as u64 + idx2 as u64 + key);
        let random_pos = (seed % (SLOT_WIDE as u64 * 2)) as usize;
        let (mut victim_key, mut victim_value) = if random_pos < SLOT_WIDE {
            evict(&mut self.buckets, idx1, random_pos, key | VALID_MASK, value)
        } else {
            evict(
                &mut self.buckets,
                idx2,
                random_pos - SLOT_WIDE,
                key | VALID_MASK | HASH_MASK,
                value,
            )
        };

        let mut tries = 0u32;
        while tries < self.max_replace_size {
            tries += 1;
            if replace_in(
                &mut self.buckets,
                bucket_mask,
                &self.hf1,
                &self.hf2,
                &mut victim_key,
                &mut victim_value,
                &mut seed,
            ) == OpStatus::Success
            {
                self.size += 1;
                return OpStatus::Success;
            }
        }

        debug!(
            capacity = self.capacity(),
            tries, "displacement budget exhausted, rehashing"
        );
        self.rehash_and_retry(payload(victim_key), victim_value)
    }

    /// Doubles `capacity` until the pending victim and every live entry fit
    /// without a chained displacement, or `MAX_CAPACITY` is exceeded.
    fn rehash_and_retry(&mut self, victim_key: u64, victim_value: V) -> OpStatus {
        let mut new_capacity = self.capacity();
        loop {
            new_capacity *= 2;
            if new_capacity > MAX_CAPACITY {
                warn!(capacity = self.capacity(), "rehash failed: MAX_CAPACITY exceeded");
                return OpStatus::RehashFailed;
            }

            let Some(mut new_buckets) = allocate_buckets(new_capacity) else {
                warn!(new_capacity, "rehash failed: allocation error");
                return OpStatus::RehashFailed;
            };
            let new_mask = new_capacity - 1;

            let mut ok = insert_new(
                &mut new_buckets,
                new_mask,
                self.max_replace_size,
                &self.hf1,
                &self.hf2,
                victim_key,
                victim_value,
            ) == OpStatus::Success;

            if ok {
                'copy: for bucket in self.buckets.iter() {
                    for slot in bucket.0.iter() {
                        if !is_occupied(slot.tagged_key) {
                            continue;
                        }
                        let k = payload(slot.tagged_key);
                        let v = unsafe { slot.value.assume_init() };
                        if insert_new(
                            &mut new_buckets,
                            new_mask,
                            self.max_replace_size,
                            &self.hf1,
                            &self.hf2,
                            k,
                            v,
                        ) != OpStatus::Success
                        {
                            ok = false;
                            break 'copy;
                        }
                    }
                }
            }

            if ok {
                self.buckets = new_buckets;
                self.bucket_mask = new_mask;
                self.size += 1;
                debug!(new_capacity, "rehash succeeded");
                return OpStatus::Success;
            }
            // This trial size didn't converge; double again and retry from scratch.
        }
    }
}

fn allocate_buckets<V: Copy>(capacity: usize) -> Option<Box<[Bucket<V>]>> {
    let mut buckets: Vec<Bucket<V>> = Vec::new();
    buckets.try_reserve_exact(capacity).ok()?;
    buckets.resize(capacity, Bucket::empty());
    Some(buckets.into_boxed_slice())
}

fn find_matching_slot<V: Copy>(data: &[Bucket<V>], idx: usize, key: u64) -> Option<usize> {
    data[idx]
        .0
        .iter()
        .position(|slot| is_occupied(slot.tagged_key) && payload(slot.tagged_key) == key)
}

fn first_free_slot<V: Copy>(data: &[Bucket<V>], idx: usize) -> Option<usize> {
    data[idx].0.iter().position(|slot| !is_occupied(slot.tagged_key))
}

fn write_slot<V: Copy>(data: &mut [Bucket<V>], idx: usize, pos: usize, tagged_key: u64, value: V) {
    data[idx].0[pos] = Slot {
        tagged_key,
        value: MaybeUninit::new(value),
    };
}

fn lookup<V: Copy>(data: &[Bucket<V>], idx: usize, key: u64) -> Option<V> {
    let pos = find_matching_slot(data, idx, key)?;
    Some(unsafe { data[idx].0[pos].value.assume_init() })
}

fn overwrite_matching<V: Copy>(data: &mut [Bucket<V>], idx: usize, key: u64, value: V) -> bool {
    match find_matching_slot(data, idx, key) {
        Some(pos) => {
            data[idx].0[pos].value = MaybeUninit::new(value);
            true
        }
        None => false,
    }
}

fn evict<V: Copy>(data: &mut [Bucket<V>], idx: usize, pos: usize, new_tagged_key: u64, new_value: V) -> (u64, V) {
    let slot = &mut data[idx].0[pos];
    let old_key = slot.tagged_key;
    let old_value = unsafe { slot.value.assume_init() };
    slot.tagged_key = new_tagged_key;
    slot.value = MaybeUninit::new(new_value);
    (old_key, old_value)
}

/// A single displacement step: re-homes the victim to its alternate bucket,
/// or swaps it with a random occupant of that bucket and reports failure so
/// the caller can retry with the newly-displaced victim.
fn replace_in<V: Copy, H1: HashFn64, H2: HashFn64>(
    data: &mut [Bucket<V>],
    bucket_mask: usize,
    hf1: &H1,
    hf2: &H2,
    key: &mut u64,
    value: &mut V,
    seed: &mut u64,
) -> OpStatus {
    let idx = if origin_is_h2(*key) {
        (hf1.hash(payload(*key)) as usize) & bucket_mask
    } else {
        (hf2.hash(payload(*key)) as usize) & bucket_mask
    };
    *key ^= HASH_MASK;

    if let Some(pos) = first_free_slot(data, idx) {
        write_slot(data, idx, pos, *key, *value);
        return OpStatus::Success;
    }

    *seed = hf1.hash(seed.wrapping_add(*key).wrapping_add(idx as u64));
    let random_pos = (*seed % SLOT_WIDE as u64) as usize;
    let slot = &mut data[idx].0[random_pos];
    std::mem::swap(&mut slot.tagged_key, key);
    let mut swapped_value = unsafe { slot.value.assume_init() };
    std::mem::swap(&mut swapped_value, value);
    slot.value = MaybeUninit::new(swapped_value);
    OpStatus::ReplaceFailed
}

/// Inserts a known-fresh `(key, value)` pair with no duplicate check. Used
/// only while rebuilding a table during rehash, where the new table is by
/// construction free of the key already. Reads and writes only through
/// `data`/`bucket_mask`, never through an enclosing map's own fields, so a
/// rehash in progress can never accidentally alias its own old table.
fn insert_new<V: Copy, H1: HashFn64, H2: HashFn64>(
    data: &mut [Bucket<V>],
    bucket_mask: usize,
    max_replace_size: u32,
    hf1: &H1,
    hf2: &H2,
    key: u64,
    value: V,
) -> OpStatus {
    let idx1 = (hf1.hash(key) as usize) & bucket_mask;
    let idx2 = (hf2.hash(key) as usize) & bucket_mask;

    if let Some(pos) = first_free_slot(data, idx1) {
        write_slot(data, idx1, pos, key | VALID_MASK, value);
        return OpStatus::Success;
    }
    if let Some(pos) = first_free_slot(data, idx2) {
        write_slot(data, idx2, pos, key | VALID_MASK | HASH_MASK, value);
        return OpStatus::Success;
    }

    let mut seed = hf1.hash(idx1 as u64 + idx2 as u64 + key);
    let random_pos = (seed % (SLOT_WIDE as u64 * 2)) as usize;
    let (mut victim_key, mut victim_value) = if random_pos < SLOT_WIDE {
        evict(data, idx1, random_pos, key | VALID_MASK, value)
    } else {
        evict(data, idx2, random_pos - SLOT_WIDE, key | VALID_MASK | HASH_MASK, value)
    };

    let mut tries = 0u32;
    while tries < max_replace_size {
        tries += 1;
        if replace_in(data, bucket_mask, hf1, hf2, &mut victim_key, &mut victim_value, &mut seed) == OpStatus::Success {
            return OpStatus::Success;
        }
    }
    OpStatus::InsertFailed
}
