//! `Reply`, a RESP2/RESP3-shaped sum type for shard replies and client
//! replies alike. Grounded on `dahomey-technologies-redis-client-rs`'s
//! `resp::value::Value`, trimmed to what this coordinator needs (no
//! Boolean/Set/Push variants, since shards never emit them here) and with
//! `Map` kept as an ordered `Vec` of pairs rather than a `HashMap` since
//! RESP3 map key order matters for `CLUSTERINFO`.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    SimpleString(String),
    Error(String),
    Integer(i64),
    Double(f64),
    BulkString(Vec<u8>),
    Nil,
    Array(Vec<Reply>),
    Map(Vec<(Reply, Reply)>),
}

impl Reply {
    pub fn bulk(s: impl Into<Vec<u8>>) -> Reply {
        Reply::BulkString(s.into())
    }

    pub fn as_bulk_str(&self) -> Option<&str> {
        match self {
            Reply::BulkString(b) => std::str::from_utf8(b).ok(),
            Reply::SimpleString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Reply::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::SimpleString(s) => write!(f, "{s}"),
            Reply::Error(e) => write!(f, "-{e}"),
            Reply::Integer(i) => write!(f, "{i}"),
            Reply::Double(d) => write!(f, "{d}"),
            Reply::BulkString(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Reply::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Looks up a key by bulk-string/simple-string equality in a RESP3 map
/// reply, used when parsing shard replies that may arrive as RESP2 arrays
/// (`["results", [...], "warning", [...]]`) or RESP3 maps.
pub fn map_get<'a>(reply: &'a Reply, key: &str) -> Option<&'a Reply> {
    match reply {
        Reply::Map(pairs) => pairs.iter().find(|(k, _)| k.as_bulk_str() == Some(key)).map(|(_, v)| v),
        Reply::Array(items) => items.chunks(2).find_map(|pair| match pair {
            [k, v] if k.as_bulk_str() == Some(key) => Some(v),
            _ => None,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_string_round_trips_as_str() {
        let r = Reply::bulk("hello");
        assert_eq!(r.as_bulk_str(), Some("hello"));
    }

    #[test]
    fn map_get_works_on_resp3_map() {
        let reply = Reply::Map(vec![
            (Reply::bulk("results"), Reply::Array(vec![Reply::Integer(1)])),
            (Reply::bulk("warning"), Reply::Array(vec![])),
        ]);
        assert_eq!(map_get(&reply, "results"), Some(&Reply::Array(vec![Reply::Integer(1)])));
    }

    #[test]
    fn map_get_works_on_resp2_flattened_array() {
        let reply = Reply::Array(vec![
            Reply::bulk("results"),
            Reply::Array(vec![Reply::Integer(2)]),
            Reply::bulk("warning"),
            Reply::Array(vec![]),
        ]);
        assert_eq!(map_get(&reply, "warning"), Some(&Reply::Array(vec![])));
    }

    #[test]
    fn is_error_detects_error_variant() {
        assert!(Reply::Error("boom".into()).is_error());
        assert!(!Reply::Nil.is_error());
    }
}
