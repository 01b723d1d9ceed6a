//! Compressed radix node: insert, delete, `optimize_children`. Grounded on
//! `original_source/src/trie/trie.c`.

use super::rune::{common_prefix_len, Rune};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Children sorted by descending `max_child_score`, ties by rune value.
    Score,
    /// Children sorted by rune value; enables exact range scans.
    Lex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOp {
    Replace,
    Increment,
}

#[derive(Debug, Clone)]
pub struct TrieNode {
    pub runes: Vec<Rune>,
    pub children: Vec<TrieNode>,
    pub score: f32,
    pub max_child_score: f32,
    pub payload: Option<Vec<u8>>,
    pub terminal: bool,
    pub deleted: bool,
    pub sort_mode: SortMode,
}

impl TrieNode {
    pub fn root(sort_mode: SortMode) -> Self {
        TrieNode {
            runes: Vec::new(),
            children: Vec::new(),
            score: 0.0,
            max_child_score: 0.0,
            payload: None,
            terminal: false,
            deleted: false,
            sort_mode,
        }
    }

    fn leaf(runes: Vec<Rune>, score: f32, payload: Option<Vec<u8>>, sort_mode: SortMode) -> Self {
        TrieNode {
            runes,
            children: Vec::new(),
            score,
            max_child_score: score,
            payload,
            terminal: true,
            deleted: false,
            sort_mode,
        }
    }

    fn own_score(&self) -> f32 {
        if self.terminal && !self.deleted {
            self.score
        } else {
            f32::MIN
        }
    }

    /// Invariant (a): `max_child_score = max(self.score, max(child.max_child_score))`.
    pub fn recompute_max_child_score(&mut self) {
        let mut max = self.own_score();
        for child in &self.children {
            if child.max_child_score > max {
                max = child.max_child_score;
            }
        }
        self.max_child_score = if max == f32::MIN { 0.0 } else { max };
    }

    fn sort_children(&mut self) {
        match self.sort_mode {
            SortMode::Score => self.children.sort_by(|a, b| {
                b.max_child_score
                    .partial_cmp(&a.max_child_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.runes[0].cmp(&b.runes[0]))
            }),
            SortMode::Lex => self.children.sort_by(|a, b| a.runes[0].cmp(&b.runes[0])),
        }
    }

    /// Splits `self` at `common`: the first `common` runes remain on
    /// `self`, everything after becomes a new child carrying `self`'s old
    /// score/terminal/children/payload.
    fn split_at(&mut self, common: usize) {
        let suffix: Vec<Rune> = self.runes[common..].to_vec();
        self.runes.truncate(common);
        let moved = TrieNode {
            runes: suffix,
            children: std::mem::take(&mut self.children),
            score: self.score,
            max_child_score: self.max_child_score,
            payload: self.payload.take(),
            terminal: self.terminal,
            deleted: self.deleted,
            sort_mode: self.sort_mode,
        };
        self.children = vec![moved];
        self.terminal = false;
        self.deleted = false;
        self.score = 0.0;
    }

    fn apply_score(&mut self, score: f32, op: AddOp) {
        self.score = match op {
            AddOp::Replace => score,
            AddOp::Increment => self.score + score,
        };
    }

    /// Walk matching prefix; at divergence split into (common prefix) +
    /// two children; if insertion ends exactly at an existing node, apply
    /// `op`. Ancestors' `max_child_score` is recomputed on the return path.
    pub fn insert(&mut self, key: &[Rune], score: f32, payload: Option<Vec<u8>>, op: AddOp) {
        if self.runes.is_empty() && self.children.is_empty() && !self.terminal {
            // Empty root special case: first insertion.
            if key.is_empty() {
                self.apply_score(score, op);
                self.terminal = true;
                self.payload = payload;
            } else {
                self.children.push(TrieNode::leaf(key.to_vec(), score, payload, self.sort_mode));
            }
            self.recompute_max_child_score();
            return;
        }

        let common = common_prefix_len(&self.runes, key);
        if common < self.runes.len() {
            self.split_at(common);
        }
        let remaining = &key[common..];
        if remaining.is_empty() {
            self.apply_score(score, op);
            self.terminal = true;
            self.deleted = false;
            if payload.is_some() {
                self.payload = payload;
            }
        } else if let Some(child) = self.children.iter_mut().find(|c| c.runes[0] == remaining[0]) {
            child.insert(remaining, score, payload, op);
        } else {
            self.children.push(TrieNode::leaf(remaining.to_vec(), score, payload, self.sort_mode));
        }
        self.sort_children();
        self.recompute_max_child_score();
    }

    /// Sets the `Deleted` flag on the terminal matching `key`, if found,
    /// then runs `optimize_children` on the return path. Returns whether a
    /// terminal was found and marked.
    pub fn delete(&mut self, key: &[Rune]) -> bool {
        let common = common_prefix_len(&self.runes, key);
        if common != self.runes.len() {
            return false;
        }
        let remaining = &key[common..];
        let found = if remaining.is_empty() {
            if self.terminal && !self.deleted {
                self.deleted = true;
                true
            } else {
                false
            }
        } else if let Some(child) = self.children.iter_mut().find(|c| !c.runes.is_empty() && c.runes[0] == remaining[0]) {
            child.delete(remaining)
        } else {
            false
        };
        if found {
            self.optimize_children();
        }
        found
    }

    /// (a) drops deleted leaves, (b) merges each child with its own single
    /// non-terminal child (concatenating runes), (c) recomputes
    /// `max_child_score`, (d) restores sort order. `self` is never merged
    /// into anything here — only entries in `self.children` are replaced, so
    /// a node with no parent (the root) can never be corrupted by its own
    /// `optimize_children()` call.
    pub fn optimize_children(&mut self) {
        self.children.retain(|c| !(c.deleted && c.children.is_empty()));
        for child in &mut self.children {
            child.optimize_children();
            if child.children.len() == 1 && !child.terminal {
                let only = child.children.remove(0);
                child.runes.extend(only.runes);
                child.children = only.children;
                child.score = only.score;
                child.terminal = only.terminal;
                child.deleted = only.deleted;
                child.payload = only.payload;
            }
        }
        self.sort_children();
        self.recompute_max_child_score();
    }

    /// Exact lookup; returns the node at `key` if present and not deleted.
    pub fn find(&self, key: &[Rune]) -> Option<&TrieNode> {
        let common = common_prefix_len(&self.runes, key);
        if common != self.runes.len() {
            return None;
        }
        let remaining = &key[common..];
        if remaining.is_empty() {
            return if self.terminal && !self.deleted { Some(self) } else { None };
        }
        self.children.iter().find(|c| !c.runes.is_empty() && c.runes[0] == remaining[0])?.find(remaining)
    }

    pub fn len(&self) -> usize {
        let mut count = if self.terminal && !self.deleted { 1 } else { 0 };
        for child in &self.children {
            count += child.len();
        }
        count
    }
}
