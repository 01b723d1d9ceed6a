//! End-to-end scenarios from spec section 8, each exercising more than one
//! module together (fanout + merger, cursor lifecycle, trie fuzzy/wildcard)
//! rather than one unit in isolation.

use ftscoord::command::{Command, RootKind};
use ftscoord::cursor::{MrIterator, ShardCursor};
use ftscoord::endpoint::Endpoint;
use ftscoord::fanout::{mr_fanout, FanoutContext, ShardOutcome};
use ftscoord::io::{FakeShardConn, ShardPool};
use ftscoord::merger::knn::effective_k;
use ftscoord::merger::{merge_top_k, parse_shard_reply, ReplyLayout, SortByCtx};
use ftscoord::resp::Reply;
use ftscoord::router::FanoutStrategy;
use ftscoord::topology::{ClusterNode, ClusterShard, ClusterTopology, HashFunc, NodeFlags};
use ftscoord::trie::{fuzzy_search, wildcard_search, AddOp, SortMode, TraversalCtx, TrieNode};

fn three_shard_topology() -> ClusterTopology {
    ClusterTopology {
        hash_func: HashFunc::Crc16,
        num_slots: 16384,
        shards: (0..3)
            .map(|i| ClusterShard {
                slot_ranges: vec![((i as u32 * 5462) as u16, (((i as u32 + 1) * 5462) - 1).min(16383) as u16)],
                nodes: vec![ClusterNode {
                    id: format!("n{i}"),
                    endpoint: Endpoint::tcp("127.0.0.1", 6400 + i as u16),
                    flags: NodeFlags::MASTER,
                }],
            })
            .collect(),
    }
}

fn doc_reply(entries: &[(&str, f64)]) -> Reply {
    let mut items = vec![Reply::Integer(entries.len() as i64)];
    for (id, score) in entries {
        items.push(Reply::bulk(*id));
        items.push(Reply::Double(*score));
        items.push(Reply::Array(vec![])); // fields
    }
    Reply::Array(items)
}

/// `no_content`-shaped reply: each document is `doc_id, sort_key` only (no
/// fields array), matching `ReplyLayout::step()` when `no_content` is set.
fn sortby_reply(entries: &[(&str, f64)]) -> Reply {
    let mut items = vec![Reply::Integer(entries.len() as i64)];
    for (id, key) in entries {
        items.push(Reply::bulk(*id));
        items.push(Reply::bulk(format!("#{key}")));
    }
    Reply::Array(items)
}

/// Scenario 1: fanout search, 3 shards, no sort. `FT.SEARCH idx hello LIMIT
/// 0 2`; top-2 across all shards is d6 (2.1) then d4 (1.7).
#[tokio::test]
async fn scenario_1_fanout_search_three_shards_no_sort() {
    let topology = three_shard_topology();
    let pool = ShardPool::new(|addr| {
        if addr.ends_with("6400") {
            FakeShardConn::new(vec![doc_reply(&[("d1", 1.5), ("d2", 1.2), ("d3", 0.9)])])
        } else if addr.ends_with("6401") {
            FakeShardConn::new(vec![doc_reply(&[("d4", 1.7), ("d5", 0.4)])])
        } else {
            FakeShardConn::new(vec![doc_reply(&[("d6", 2.1)])])
        }
    });
    let ctx = FanoutContext::new(FanoutStrategy::MastersOnly, 2);
    let cmd = Command::from_strs(&["_FT.SEARCH", "idx", "hello", "LIMIT", "0", "2", "WITHSCORES"], RootKind::Search);
    let outcomes = mr_fanout(&ctx, &topology, &pool, &cmd, 8, None, false).await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(ctx.replied.load(std::sync::atomic::Ordering::Acquire) + ctx.errored.load(std::sync::atomic::Ordering::Acquire), 3);

    let layout = ReplyLayout { with_scores: true, with_sortby: false, with_payload: false, required_fields: 0, with_sorting_keys: false, no_content: false };
    let mut total = 0i64;
    let mut all_results = Vec::new();
    for (_, outcome) in &outcomes {
        if let ShardOutcome::Reply(reply) = outcome {
            let (shard_total, results) = parse_shard_reply(reply, &layout).unwrap();
            total += shard_total;
            all_results.extend(results);
        }
    }
    assert_eq!(total, 6);
    let merged = merge_top_k(all_results, 0, 2, None);
    let ids: Vec<&str> = merged.iter().map(|r| std::str::from_utf8(&r.doc_id).unwrap()).collect();
    assert_eq!(ids, vec!["d6", "d4"]);
}

/// Scenario 2: `FT.SEARCH idx * SORTBY price ASC LIMIT 2 2`. Per-shard
/// WITHSORTKEYS coordinator top-4 is `[a:10, e:20, b:30, f:40]`; after
/// `LIMIT 2 2` the reply is `[b, f]`.
#[test]
fn scenario_2_sortby_numeric_ascending_with_offset() {
    let shard1 = sortby_reply(&[("a", 10.0), ("b", 30.0), ("c", 50.0), ("d", 70.0)]);
    let shard2 = sortby_reply(&[("e", 20.0), ("f", 40.0)]);
    let layout = ReplyLayout { with_scores: false, with_sortby: true, with_payload: false, required_fields: 0, with_sorting_keys: true, no_content: true };

    let (_, r1) = parse_shard_reply(&shard1, &layout).unwrap();
    let (_, r2) = parse_shard_reply(&shard2, &layout).unwrap();
    let mut all = r1;
    all.extend(r2);

    let ctx = SortByCtx { key: "price".into(), asc: true, offset: 0 };
    let merged = merge_top_k(all, 2, 2, Some(&ctx));
    let ids: Vec<&str> = merged.iter().map(|r| std::str::from_utf8(&r.doc_id).unwrap()).collect();
    assert_eq!(ids, vec!["b", "f"]);
}

/// SORTBY on a string field: ASC and DESC must produce opposite orders.
#[test]
fn sortby_string_field_ascending_and_descending() {
    let shard = sortby_reply(&[("x", 0.0), ("y", 0.0)]);
    let layout = ReplyLayout { with_scores: false, with_sortby: true, with_payload: false, required_fields: 0, with_sorting_keys: true, no_content: true };
    let (_, mut results) = parse_shard_reply(&shard, &layout).unwrap();
    results[0].sort_key = Some(b"apple".to_vec());
    results[1].sort_key = Some(b"banana".to_vec());

    let ctx_asc = SortByCtx { key: "name".into(), asc: true, offset: 0 };
    let merged_asc = merge_top_k(results.clone(), 0, 2, Some(&ctx_asc));
    let ids_asc: Vec<&str> = merged_asc.iter().map(|r| std::str::from_utf8(&r.doc_id).unwrap()).collect();
    assert_eq!(ids_asc, vec!["x", "y"]);

    let ctx_desc = SortByCtx { key: "name".into(), asc: false, offset: 0 };
    let merged_desc = merge_top_k(results, 0, 2, Some(&ctx_desc));
    let ids_desc: Vec<&str> = merged_desc.iter().map(|r| std::str::from_utf8(&r.doc_id).unwrap()).collect();
    assert_eq!(ids_desc, vec!["y", "x"]);
}

/// Scenario 3: `shard_window_ratio=0.3, k=100, num_shards=4` ->
/// `effective_k = max(ceil(100/4), ceil(100*0.3)) = max(25, 30) = 30`; the
/// final top-100 is assembled from at most 120 candidates (30 * 4 shards).
#[test]
fn scenario_3_knn_shard_window_ratio_bounds_candidate_pool() {
    let k = 100;
    let num_shards = 4;
    let ek = effective_k(k, 0.3, num_shards);
    assert_eq!(ek, 30);
    assert!(ek * num_shards <= 120);
    assert!(ek * num_shards >= k);
}

/// Scenario 4: cursor read with timeout. S1 has cursor=42 (still
/// producing), S2 has cursor=0 (depleted). On deadline mid-stream, the next
/// trigger rewrites S1's pending command to `CURSOR DEL` and leaves S2
/// alone since it is already depleted.
#[test]
fn scenario_4_cursor_timeout_converts_pending_to_del() {
    let s1 = ShardCursor::new(0, Command::from_strs(&["_FT.CURSOR", "READ", "idx", "42"], RootKind::Cursor));
    let s2 = ShardCursor::new(1, Command::from_strs(&["_FT.CURSOR", "READ", "idx", "7"], RootKind::Cursor));
    let mut it = MrIterator::new(vec![s1, s2], 16);

    it.note_cursor_reply(0, 42);
    it.note_cursor_reply(1, 0);
    assert!(!it.shards[0].depleted);
    assert!(it.shards[1].depleted);

    it.convert_pending_to_del();
    assert!(it.timed_out.load(std::sync::atomic::Ordering::Relaxed));
    assert_eq!(it.shards[0].command.args[1], b"DEL");
    assert_eq!(it.shards[0].command.root_kind, RootKind::CursorDel);
    // The already-depleted shard is never re-dispatched, so its command is
    // left as the original READ.
    assert_eq!(it.shards[1].command.args[1], b"READ");
}

/// Scenario 5: fuzzy search over `{dostoevsky, dostoyevski, cbs, jezebel}`
/// with `max_edits=2`, `prefix=false`. Matches `dostoevsky` (dist 1) and
/// `dostoyevski` (dist 2); weights follow `exp(-2*dist)`.
#[test]
fn scenario_5_trie_fuzzy_search_matches_and_weights() {
    let mut root = TrieNode::root(SortMode::Score);
    for (word, score) in [("dostoevsky", 1.0f32), ("dostoyevski", 0.9), ("cbs", 1.0), ("jezebel", 0.5)] {
        root.insert(&ftscoord::trie::str_to_runes(word), score, None, AddOp::Replace);
    }
    let mut ctx = TraversalCtx::new(None);
    let mut matches = fuzzy_search(&root, "dostoevski", 2, false, &mut ctx);
    matches.sort_by_key(|(e, _, _)| e.key.clone());

    let keys: Vec<&str> = matches.iter().map(|(e, _, _)| e.key.as_str()).collect();
    assert_eq!(keys, vec!["dostoevsky", "dostoyevski"]);

    let (_, dostoevsky_dist, dostoevsky_weight) = matches.iter().find(|(e, _, _)| e.key == "dostoevsky").unwrap();
    assert_eq!(*dostoevsky_dist, 1);
    assert!((*dostoevsky_weight - (-2.0f64).exp()).abs() < 1e-9);

    let (_, dostoyevski_dist, _) = matches.iter().find(|(e, _, _)| e.key == "dostoyevski").unwrap();
    assert_eq!(*dostoyevski_dist, 2);
}

/// Scenario 6: wildcard matching. `dos*sky` matches `dostoevsky` only,
/// `??zebel` full-matches `jezebel`, `*` full-matches every key.
#[test]
fn scenario_6_trie_wildcard_search() {
    let mut root = TrieNode::root(SortMode::Score);
    for word in ["dostoevsky", "dostoyevski", "jezebel"] {
        root.insert(&ftscoord::trie::str_to_runes(word), 1.0, None, AddOp::Replace);
    }

    let mut ctx = TraversalCtx::new(None);
    let dos_sky: Vec<String> = wildcard_search(&root, "dos*sky", &mut ctx).into_iter().map(|e| e.key).collect();
    assert_eq!(dos_sky, vec!["dostoevsky".to_string()]);

    let mut ctx = TraversalCtx::new(None);
    let zebel: Vec<String> = wildcard_search(&root, "??zebel", &mut ctx).into_iter().map(|e| e.key).collect();
    assert_eq!(zebel, vec!["jezebel".to_string()]);

    let mut ctx = TraversalCtx::new(None);
    let mut everything: Vec<String> = wildcard_search(&root, "*", &mut ctx).into_iter().map(|e| e.key).collect();
    everything.sort();
    assert_eq!(everything, vec!["dostoevsky".to_string(), "dostoyevski".to_string(), "jezebel".to_string()]);
}
