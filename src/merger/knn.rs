//! Shard-window-ratio KNN rewrite ("Shard-window-ratio").
//! Exact formula and disable-guard grounded on
//! `original_source/src/shard_window_ratio.h`'s `calculateEffectiveK`.

use crate::command::Command;

/// `effective_k = max(ceil(k/num_shards), ceil(k*ratio))`, floored at 1.
/// Returns `k` unchanged (the optimization disabled) when `ratio` is
/// outside `(0.0, 1.0]` or `num_shards == 0` — this guard is in the C
/// source but not spelled out in the distilled formula, and is load-bearing
///.
pub fn effective_k(original_k: usize, ratio: f64, num_shards: usize) -> usize {
    if ratio <= 0.0 || ratio > 1.0 || num_shards == 0 {
        return original_k;
    }
    let min_k_per_shard = (original_k + num_shards - 1) / num_shards;
    let ratio_k_per_shard = (original_k as f64 * ratio).ceil() as usize;
    let effective = ratio_k_per_shard.max(min_k_per_shard);
    effective.max(1)
}

/// Rewrites a literal `KNN <k>` substring in-place to the effective K,
/// using `Command::replace_substring`'s space-pad/reallocate fast paths
/// (: "Literal-K is replaced by exact substring
/// rewrite").
pub fn rewrite_knn_literal(cmd: &mut Command, arg_index: usize, literal_k: &str, effective_k: usize) {
    let arg = &cmd.args[arg_index];
    let needle = format!("KNN {literal_k}");
    if let Some(pos) = find_subslice(arg, needle.as_bytes()) {
        let replacement = format!("KNN {effective_k}");
        cmd.replace_substring(arg_index, pos, needle.len(), replacement.as_bytes());
    }
}

/// Rewrites a parameterized K (`PARAMS n ... bk <k> ...`) by locating the
/// parameter value following its name and replacing it in place (spec
/// section 4.7: "parameterized K is rewritten in the PARAMS section").
pub fn rewrite_knn_param(cmd: &mut Command, params_arg_index: usize, param_name: &str, effective_k: usize) {
    let arg = &cmd.args[params_arg_index];
    let needle = param_name.as_bytes();
    if let Some(name_pos) = find_subslice(arg, needle) {
        let value_start = name_pos + needle.len() + 1; // skip the separating space
        if value_start >= arg.len() {
            return;
        }
        let value_len = arg[value_start..]
            .iter()
            .position(|&b| b == b' ')
            .unwrap_or(arg.len() - value_start);
        let replacement = effective_k.to_string();
        cmd.replace_substring(params_arg_index, value_start, value_len, replacement.as_bytes());
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
