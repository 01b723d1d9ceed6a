//! Compressed rune trie with prefix, fuzzy, wildcard, range, contains/suffix
//! and random-walk lookups. Grounded on `original_source/src/trie/`.

pub mod dfa;
pub mod iter;
pub mod node;
pub mod rune;
pub mod wildcard;

pub use dfa::{distance, distance_weight, LevenshteinAutomaton, LevenshteinRow};
pub use iter::{
    contains_search, fuzzy_search, prefix_search, random_walk, range_search, wildcard_search, FoundEntry,
    TraversalCtx, MAX_DEPTH,
};
pub use node::{AddOp, SortMode, TrieNode};
pub use rune::{fold, fold_runes, runes_to_string, str_to_runes, Rune};
pub use wildcard::{match_rune, remove_escape, trim_pattern, MatchResult};
