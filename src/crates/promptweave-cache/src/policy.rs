//! Eviction policy selection.

use std::fmt;

/// Which entry to evict once the cache is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Evict the entry that has gone longest without being read.
    #[default]
    Lru,
    /// Evict the entry with the fewest reads, ties broken by staleness.
    Lfu,
    /// Evict the entry that was inserted first, regardless of reads.
    Fifo,
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Fifo => "fifo",
        };
        write!(f, "{label}")
    }
}

impl From<&str> for EvictionPolicy {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "lfu" => EvictionPolicy::Lfu,
            "fifo" => EvictionPolicy::Fifo,
            _ => EvictionPolicy::Lru,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(EvictionPolicy::from("LFU"), EvictionPolicy::Lfu);
        assert_eq!(EvictionPolicy::from("Fifo"), EvictionPolicy::Fifo);
        assert_eq!(EvictionPolicy::from("lru"), EvictionPolicy::Lru);
    }

    #[test]
    fn unknown_values_default_to_lru() {
        assert_eq!(EvictionPolicy::from("bogus"), EvictionPolicy::Lru);
    }

    #[test]
    fn default_is_lru() {
        assert_eq!(EvictionPolicy::default(), EvictionPolicy::Lru);
    }
}
