//! Result merger: search (top-K heap merge), aggregate (RPNet streaming),
//! and the shard-window-ratio KNN rewrite.

pub mod aggregate;
pub mod knn;
pub mod search;

pub use aggregate::{AggregateRow, RpNet};
pub use knn::effective_k;
pub use search::{cmp_results, merge_top_k, parse_shard_reply, ReplyLayout, SearchResult, SortByCtx};
