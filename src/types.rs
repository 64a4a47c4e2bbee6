// Fast hash maps / sets using AHash instead of the default SipHash.
// Only for lookups; anything iterated into output goes through BTreeMap/BTreeSet.
// Also import `HashMapExt` / `HashSetExt` when you need `::new()` or `::with_capacity()`.
pub type HashMap<K, V> = ahash::HashMap<K, V>;
pub type HashSet<K> = ahash::HashSet<K>;
pub use ahash::HashMapExt;
pub use ahash::HashSetExt;

/// Separator between gene ids (and gene names) in a fusion identifier.
pub const FUSION_SEP: &str = "::";
