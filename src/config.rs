//! Construction-time tuning knobs for [`crate::CuckooMap`].

/// Tuning parameters consumed at construction time.
///
/// There is no file, environment, or CLI surface for this subsystem (see the
/// crate's design notes), so this is a plain struct rather than something
/// wired up to a config-loading crate: there is nothing external to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CuckooConfig {
    /// Caller's capacity hint. Rounded up to the next power of two.
    pub init_capacity: usize,
    /// Maximum consecutive displacement steps attempted before escalating to a rehash.
    pub max_replace_size: u32,
}

impl Default for CuckooConfig {
    fn default() -> Self {
        Self {
            init_capacity: 1024,
            max_replace_size: 100,
        }
    }
}

impl CuckooConfig {
    /// Shorthand for `CuckooConfig { init_capacity, max_replace_size: 100 }`.
    pub fn with_capacity(init_capacity: usize) -> Self {
        Self {
            init_capacity,
            ..Self::default()
        }
    }
}
