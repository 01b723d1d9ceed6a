//! `Command`, a heap-owned argv with typed mutation helpers

/// What top-level kind of request a command represents, so the fanout
/// engine and merger know how to dispatch and reduce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Search,
    Agg,
    Cursor,
    CursorDel,
    Debug,
}

/// A per-shard (or pre-sharding, user-facing) command argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub args: Vec<Vec<u8>>,
    /// -1 means infer the slot from arg 1.
    pub target_slot: i32,
    pub protocol: u8,
    pub for_cursor: bool,
    pub root_kind: RootKind,
    pub depleted: bool,
}

impl Command {
    pub fn new(args: Vec<Vec<u8>>, root_kind: RootKind) -> Self {
        Command { args, target_slot: -1, protocol: 2, for_cursor: false, root_kind, depleted: false }
    }

    pub fn from_strs(args: &[&str], root_kind: RootKind) -> Self {
        Command::new(args.iter().map(|s| s.as_bytes().to_vec()).collect(), root_kind)
    }

    pub fn name(&self) -> &[u8] {
        self.args.get(0).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// The sharding key: arg 1, unless `target_slot` overrides it.
    pub fn key(&self) -> Option<&[u8]> {
        self.args.get(1).map(|v| v.as_slice())
    }

    pub fn append(&mut self, arg: impl Into<Vec<u8>>) {
        self.args.push(arg.into());
    }

    pub fn replace(&mut self, index: usize, arg: impl Into<Vec<u8>>) {
        self.args[index] = arg.into();
    }

    pub fn insert(&mut self, index: usize, arg: impl Into<Vec<u8>>) {
        self.args.insert(index, arg.into());
    }

    /// Rewrites arg 0 from `FT.*` to `_FT.*` in place. Idempotent: calling
    /// twice leaves the command unchanged after the first call (spec
    /// section 8, "CommandSetPrefix is idempotent").
    pub fn set_prefix(&mut self, prefix: &str) {
        if self.args.is_empty() {
            return;
        }
        let name = &self.args[0];
        let prefix_bytes = prefix.as_bytes();
        if name.starts_with(prefix_bytes) {
            return;
        }
        let mut new_name = Vec::with_capacity(prefix_bytes.len() + name.len());
        new_name.extend_from_slice(prefix_bytes);
        new_name.extend_from_slice(name);
        self.args[0] = new_name;
    }

    /// Replaces the `old_len`-byte substring at `pos` in arg `index` with
    /// `new`. If `new` fits within `old_len`, the remainder is space-padded
    /// in place (no reallocation); otherwise the arg is rebuilt.
    pub fn replace_substring(&mut self, index: usize, pos: usize, old_len: usize, new: &[u8]) {
        let arg = &mut self.args[index];
        assert!(pos + old_len <= arg.len(), "replace_substring out of bounds");
        if new.len() <= old_len {
            arg[pos..pos + new.len()].copy_from_slice(new);
            for byte in &mut arg[pos + new.len()..pos + old_len] {
                *byte = b' ';
            }
        } else {
            let mut rebuilt = Vec::with_capacity(arg.len() - old_len + new.len());
            rebuilt.extend_from_slice(&arg[..pos]);
            rebuilt.extend_from_slice(new);
            rebuilt.extend_from_slice(&arg[pos + old_len..]);
            *arg = rebuilt;
        }
    }
}
