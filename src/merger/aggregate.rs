//! `RPNet` — the streaming aggregate result processor.
//! Grounded on directly; iteration style follows
//! `prism-cluster/src/federation/mod.rs`'s incremental-consumption pattern
//! (`FederatedSearch` pulls one shard result at a time rather than
//! collecting everything up front).

use crate::cursor::MrIterator;
use crate::error::{CoordError, Result};
use crate::resp::{map_get, Reply};

/// One row pulled from the current shard reply, ready for RLookup-style
/// field emission into the caller's row representation.
#[derive(Debug, Clone)]
pub struct AggregateRow {
    pub fields: Vec<(String, Reply)>,
}

/// Tracks iteration through the inner rows of one shard's reply before
/// advancing the cursor (: "On exhaustion of the current
/// reply... pop the next reply from the iterator, and continue").
pub struct RpNet {
    current_rows: std::vec::IntoIter<AggregateRow>,
    warnings: Vec<String>,
    started: bool,
}

impl RpNet {
    pub fn new() -> Self {
        RpNet { current_rows: Vec::new().into_iter(), warnings: Vec::new(), started: false }
    }

    /// Parses one shard reply's inner rows: RESP2 is a flat array of rows;
    /// RESP3 is a map with `results`/`warning` keys.
    fn parse_reply(&mut self, reply: &Reply) -> Result<()> {
        if let Some(warning_reply) = map_get(reply, "warning") {
            if let Some(items) = warning_reply.as_array() {
                for w in items {
                    if let Some(s) = w.as_bulk_str() {
                        self.warnings.push(s.to_string());
                    }
                }
            }
        }

        let rows_reply = map_get(reply, "results").unwrap_or(reply);
        let rows = rows_reply
            .as_array()
            .ok_or_else(|| CoordError::Protocol("aggregate reply missing results array".into()))?;

        let mut parsed = Vec::with_capacity(rows.len());
        for row in rows {
            let row_fields = map_get(row, "extra_attributes").unwrap_or(row);
            let fields = match row_fields {
                Reply::Map(pairs) => pairs
                    .iter()
                    .filter_map(|(k, v)| k.as_bulk_str().map(|k| (k.to_string(), v.clone())))
                    .collect(),
                Reply::Array(items) => items
                    .chunks(2)
                    .filter_map(|chunk| match chunk {
                        [k, v] => k.as_bulk_str().map(|k| (k.to_string(), v.clone())),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            parsed.push(AggregateRow { fields });
        }
        self.current_rows = parsed.into_iter();
        Ok(())
    }

    /// Surfaces warnings (`Timeout limit was reached`, prefix-expansion
    /// limit, OOM) without stopping the stream, unless the caller's timeout
    /// policy is `Fail`.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Pulls one row at a time; on the first call starts the iterator
    /// (`MR_Iterate`), on exhaustion of the current reply advances to the
    /// next one via `replies`, returning `None` once every shard is
    /// depleted and every buffered row has been consumed.
    pub fn next(&mut self, iterator: &mut MrIterator, pending_replies: &mut Vec<Reply>) -> Result<Option<AggregateRow>> {
        self.started = true;
        loop {
            if let Some(row) = self.current_rows.next() {
                return Ok(Some(row));
            }
            if let Some(reply) = pending_replies.pop() {
                if reply.is_error() {
                    return Err(CoordError::ShardError { shard_id: 0, message: reply.to_string() });
                }
                self.parse_reply(&reply)?;
                continue;
            }
            if iterator.all_depleted() {
                return Ok(None);
            }
            return Ok(None);
        }
    }
}

impl Default for RpNet {
    fn default() -> Self {
        RpNet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, RootKind};
    use crate::cursor::ShardCursor;

    fn iterator() -> MrIterator {
        MrIterator::new(vec![ShardCursor::new(0, Command::from_strs(&["_FT.CURSOR", "READ"], RootKind::Cursor))], 8)
    }

    #[test]
    fn pulls_rows_from_resp2_flattened_reply() {
        let mut rp = RpNet::new();
        let mut it = iterator();
        it.shards[0].depleted = true;
        let reply = Reply::Array(vec![Reply::Array(vec![
            Reply::Array(vec![Reply::bulk("field1"), Reply::bulk("value1")]),
        ])]);
        let mut pending = vec![reply];
        let row = rp.next(&mut it, &mut pending).unwrap().unwrap();
        assert_eq!(row.fields[0].0, "field1");
        let next = rp.next(&mut it, &mut pending).unwrap();
        assert!(next.is_none());
    }

    #[test]
    fn surfaces_warnings_without_stopping_stream() {
        let mut rp = RpNet::new();
        let mut it = iterator();
        it.shards[0].depleted = true;
        let reply = Reply::Map(vec![
            (Reply::bulk("results"), Reply::Array(vec![])),
            (Reply::bulk("warning"), Reply::Array(vec![Reply::bulk("Timeout limit was reached")])),
        ]);
        let mut pending = vec![reply];
        let row = rp.next(&mut it, &mut pending).unwrap();
        assert!(row.is_none());
        assert_eq!(rp.warnings(), &["Timeout limit was reached".to_string()]);
    }

    #[test]
    fn shard_error_reply_becomes_request_error() {
        let mut rp = RpNet::new();
        let mut it = iterator();
        let mut pending = vec![Reply::Error("boom".into())];
        let result = rp.next(&mut it, &mut pending);
        assert!(result.is_err());
    }
}
