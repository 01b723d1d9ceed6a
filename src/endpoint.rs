//! Endpoint parsing: `[password@]host:port`, IPv6 bracket form, `unix:/path`.

use crate::error::{CoordError, Result};
use std::fmt;

/// A shard node's network address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub unix_socket: Option<String>,
}

impl Endpoint {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Endpoint { host: host.into(), port, password: None, unix_socket: None }
    }

    /// Parse `[password@]host:port`, `[password@][ipv6]:port`, or
    /// `unix:/path` (password not applicable to unix sockets).
    pub fn parse(s: &str) -> Result<Endpoint> {
        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(parse_err(s, "empty unix socket path"));
            }
            return Ok(Endpoint {
                host: String::new(),
                port: 0,
                password: None,
                unix_socket: Some(path.to_string()),
            });
        }

        let (password, rest) = match s.rsplit_once('@') {
            // A bare IPv6 literal without auth can itself contain `@`-free
            // brackets; rsplit_once is safe here since passwords cannot
            // contain unescaped `@` in this simplified grammar.
            Some((pass, rest)) => (Some(pass.to_string()), rest),
            None => (None, s),
        };

        if let Some(stripped) = rest.strip_prefix('[') {
            let close = stripped
                .find(']')
                .ok_or_else(|| parse_err(s, "unterminated IPv6 bracket"))?;
            let host = &stripped[..close];
            let after = &stripped[close + 1..];
            let port_str = after
                .strip_prefix(':')
                .ok_or_else(|| parse_err(s, "missing port after IPv6 bracket"))?;
            let port: u16 = port_str
                .parse()
                .map_err(|_| parse_err(s, "invalid port"))?;
            return Ok(Endpoint { host: host.to_string(), port, password, unix_socket: None });
        }

        let (host, port_str) = rest
            .rsplit_once(':')
            .ok_or_else(|| parse_err(s, "missing port"))?;
        if host.is_empty() {
            return Err(parse_err(s, "missing host"));
        }
        let port: u16 = port_str.parse().map_err(|_| parse_err(s, "invalid port"))?;
        Ok(Endpoint { host: host.to_string(), port, password, unix_socket: None })
    }
}

fn parse_err(input: &str, message: &str) -> CoordError {
    CoordError::ParseArgs { offset: 0, message: format!("{message} in endpoint {input:?}") }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.unix_socket {
            return write!(f, "unix:{path}");
        }
        if let Some(pass) = &self.password {
            write!(f, "{pass}@")?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
