//! Search result merging: reply-offset derivation, comparator, and top-K
//! merge. Generalized from
//! `prism-cluster/src/federation/merger.rs`'s `ResultMerger::merge_simple`
//! (sort-then-truncate over a flat `Vec`, HashSet-based dedup) to the full
//! comparator. The streaming per-shard early-stop optimization ("once a
//! candidate is not kept, scanning the current shard can stop") is not
//! implemented here; like `merge_simple`, this collects all per-shard
//! candidates into one `Vec` and sorts, which is simpler and produces
//! identical output.

use crate::resp::Reply;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct SortByCtx {
    pub key: String,
    pub asc: bool,
    pub offset: usize,
}

/// A single merged document (`SearchResult`).
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub doc_id: Vec<u8>,
    pub score: f64,
    pub fields: Option<Reply>,
    pub payload: Option<Reply>,
    pub sort_key: Option<Vec<u8>>,
    pub sort_key_num: f64,
}

/// Flags needed to derive the per-document reply offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyLayout {
    pub with_scores: bool,
    pub with_sortby: bool,
    pub with_payload: bool,
    pub required_fields: usize,
    pub with_sorting_keys: bool,
    pub no_content: bool,
}

impl ReplyLayout {
    /// `step = 2 + (with_scores|no_sortby ? 1 : 0) + (with_payload ? 1 : 0)
    /// + #required_fields + (with_sorting_keys && !required_fields ? 1 : 0)
    /// - (no_content ? 1 : 0)` (verbatim formula).
    pub fn step(&self) -> usize {
        let mut step = 2usize;
        if self.with_scores || !self.with_sortby {
            step += 1;
        }
        if self.with_payload {
            step += 1;
        }
        step += self.required_fields;
        if self.with_sorting_keys && self.required_fields == 0 {
            step += 1;
        }
        if self.no_content {
            step -= 1;
        }
        step
    }

    fn effective_with_scores(&self) -> bool {
        self.with_scores || !self.with_sortby
    }

    fn has_inline_sort_key(&self) -> bool {
        self.with_sorting_keys && self.required_fields == 0
    }
}

/// The sort key is numeric if it begins with `#` and the remainder parses
/// as a valid `f64`; the literal `none` (any case) is a missing sort key
///.
fn parse_sort_key(raw: &[u8]) -> (Option<Vec<u8>>, f64) {
    if raw.eq_ignore_ascii_case(b"none") {
        return (None, f64::NAN);
    }
    if let Some(rest) = raw.strip_prefix(b"#") {
        if let Ok(s) = std::str::from_utf8(rest) {
            if let Ok(num) = s.parse::<f64>() {
                return (Some(raw.to_vec()), num);
            }
        }
    }
    (Some(raw.to_vec()), f64::NAN)
}

/// Parses one shard's search reply array into `(total, results)`. The
/// reply is `[total, doc1..., doc2..., ...]` where each document occupies
/// `layout.step()` consecutive elements.
pub fn parse_shard_reply(reply: &Reply, layout: &ReplyLayout) -> Option<(i64, Vec<SearchResult>)> {
    let items = reply.as_array()?;
    let total = items.first()?.as_integer()?;
    let step = layout.step();
    let mut results = Vec::new();
    let mut idx = 1;
    while idx + step <= items.len() + 1 && idx < items.len() {
        let doc_id = match &items[idx] {
            Reply::BulkString(b) => b.clone(),
            Reply::SimpleString(s) => s.as_bytes().to_vec(),
            _ => return None,
        };
        let mut cursor = idx + 1;
        let score = if layout.effective_with_scores() {
            let s = match items.get(cursor) {
                Some(Reply::Double(d)) => *d,
                Some(Reply::BulkString(b)) => std::str::from_utf8(b).ok()?.parse().ok()?,
                Some(Reply::SimpleString(s)) => s.parse().ok()?,
                Some(Reply::Integer(i)) => *i as f64,
                _ => 0.0,
            };
            cursor += 1;
            s
        } else {
            0.0
        };
        let payload = if layout.with_payload {
            let p = items.get(cursor).cloned();
            cursor += 1;
            p
        } else {
            None
        };
        let (sort_key, sort_key_num) = if layout.has_inline_sort_key() {
            let raw = match items.get(cursor) {
                Some(Reply::BulkString(b)) => b.clone(),
                Some(Reply::SimpleString(s)) => s.as_bytes().to_vec(),
                _ => Vec::new(),
            };
            cursor += 1;
            parse_sort_key(&raw)
        } else {
            (None, f64::NAN)
        };
        cursor += layout.required_fields;
        let fields = if !layout.no_content { items.get(cursor).cloned() } else { None };

        results.push(SearchResult { doc_id, score, fields, payload, sort_key, sort_key_num });
        idx += step;
    }
    Some((total, results))
}

/// Byte-string comparator with a length tie-break for equal-prefix keys.
fn cmp_bytes_len_tiebreak(a: &[u8], b: &[u8]) -> Ordering {
    match a.cmp(b) {
        Ordering::Equal => a.len().cmp(&b.len()),
        other => other,
    }
}

/// Orders two results for the merged top-K. `Less` means `a` ranks ahead
/// of `b`. With `sort_ctx` present: numeric sort key comparison if both are
/// present and finite; else direct string comparison (memcmp); missing sort
/// keys sort to the end regardless of direction; ties fall back to doc_id
/// order. Without `sort_ctx`: higher score first, ties broken by ascending
/// doc_id.
pub fn cmp_results(a: &SearchResult, b: &SearchResult, sort_ctx: Option<&SortByCtx>) -> Ordering {
    match sort_ctx {
        Some(ctx) => {
            let a_missing = a.sort_key.is_none();
            let b_missing = b.sort_key.is_none();
            if a_missing != b_missing {
                return if a_missing { Ordering::Greater } else { Ordering::Less };
            }
            if a_missing && b_missing {
                return a.doc_id.cmp(&b.doc_id);
            }
            let ordering = if a.sort_key_num.is_finite() && b.sort_key_num.is_finite() {
                a.sort_key_num.partial_cmp(&b.sort_key_num).unwrap_or(Ordering::Equal)
            } else {
                cmp_bytes_len_tiebreak(a.sort_key.as_deref().unwrap_or(&[]), b.sort_key.as_deref().unwrap_or(&[]))
            };
            let directed = if ctx.asc { ordering } else { ordering.reverse() };
            if directed == Ordering::Equal {
                a.doc_id.cmp(&b.doc_id)
            } else {
                directed
            }
        }
        None => {
            let by_score = b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal);
            if by_score == Ordering::Equal {
                a.doc_id.cmp(&b.doc_id)
            } else {
                by_score
            }
        }
    }
}

/// Merges every shard's parsed results into one top-`(offset+limit)` list,
/// already ordered, suitable for applying `LIMIT offset limit` to.
pub fn merge_top_k(
    mut all_results: Vec<SearchResult>,
    offset: usize,
    limit: usize,
    sort_ctx: Option<&SortByCtx>,
) -> Vec<SearchResult> {
    all_results.sort_by(|a, b| cmp_results(a, b, sort_ctx));
    all_results.into_iter().skip(offset).take(limit).collect()
}
