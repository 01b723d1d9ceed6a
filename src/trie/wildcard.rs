//! Wildcard (`?`/`*`) matcher with NO_MATCH/PARTIAL_MATCH/FULL_MATCH
//! semantics. Grounded on
//! `original_source/src/wildcard.c`'s `Wildcard_MatchRune`: an iterative
//! pointer-walking algorithm with a single backtrack anchor for `*`.

use super::rune::Rune;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    PartialMatch,
    FullMatch,
}

/// Matches `pattern` against `text`. `text` may be a complete key or a
/// prefix accumulated so far during trie descent — a `PartialMatch` result
/// means the match could still complete once more runes of the key are
/// seen; callers continue descending in that case, and stop on `NoMatch`.
pub fn match_rune(pattern: &[Rune], text: &[Rune]) -> MatchResult {
    let mut p = 0usize;
    let mut t = 0usize;
    let mut star_p: Option<usize> = None;
    let mut star_t = 0usize;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star_p = Some(p);
            star_t = t;
            p += 1;
        } else if let Some(sp) = star_p {
            p = sp + 1;
            star_t += 1;
            t = star_t;
        } else {
            return MatchResult::NoMatch;
        }
    }

    let mut pp = p;
    while pp < pattern.len() && pattern[pp] == '*' {
        pp += 1;
    }
    if pp == pattern.len() {
        MatchResult::FullMatch
    } else {
        MatchResult::PartialMatch
    }
}

/// Trims runs of `**` to `*` and reorders `*?` to `?*` so `?` requirements
/// are encountered eagerly. Semantically equivalent to
/// the input (matches the same strings) per the round-trip property in
/// 
pub fn trim_pattern(pattern: &[Rune]) -> Vec<Rune> {
    let mut trimmed: Vec<Rune> = Vec::with_capacity(pattern.len());
    for &r in pattern {
        if r == '*' && trimmed.last() == Some(&'*') {
            continue;
        }
        trimmed.push(r);
    }
    let mut changed = true;
    while changed {
        changed = false;
        let mut i = 0;
        while i + 1 < trimmed.len() {
            if trimmed[i] == '*' && trimmed[i + 1] == '?' {
                trimmed.swap(i, i + 1);
                changed = true;
            }
            i += 1;
        }
    }
    trimmed
}

/// Removes backslash escapes from a pattern (literal-match suffix after
/// `\`), mirroring `Wildcard_RemoveEscape` in the source.
pub fn remove_escape(pattern: &[Rune]) -> Vec<Rune> {
    let mut out = Vec::with_capacity(pattern.len());
    let mut i = 0;
    while i < pattern.len() {
        if pattern[i] == '\\' && i + 1 < pattern.len() {
            out.push(pattern[i + 1]);
            i += 2;
        } else {
            out.push(pattern[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::rune::str_to_runes;

    fn matches(pattern: &str, text: &str) -> MatchResult {
        match_rune(&str_to_runes(pattern), &str_to_runes(text))
    }

    #[test]
    fn scenario_6_dos_star_sky_matches_dostoevsky() {
        assert_eq!(matches("dos*sky", "dostoevsky"), MatchResult::FullMatch);
    }

    #[test]
    fn scenario_6_dos_star_sky_does_not_full_match_dostoyevski() {
        assert_ne!(matches("dos*sky", "dostoyevski"), MatchResult::FullMatch);
    }

    #[test]
    fn scenario_6_double_question_mark_zebel_matches_jezebel() {
        assert_eq!(matches("??zebel", "jezebel"), MatchResult::FullMatch);
    }

    #[test]
    fn scenario_6_bare_star_matches_everything() {
        for key in ["dostoevsky", "cbs", "jezebel", ""] {
            assert_eq!(matches("*", key), MatchResult::FullMatch);
        }
    }

    #[test]
    fn partial_match_continues_prefix_descent() {
        // "hel*" against the prefix "he" (more runes of the key to come).
        assert_eq!(matches("hel*", "he"), MatchResult::PartialMatch);
    }

    #[test]
    fn no_match_when_literal_prefix_diverges() {
        assert_eq!(matches("cat", "dog"), MatchResult::NoMatch);
    }

    #[test]
    fn trim_pattern_collapses_double_star() {
        assert_eq!(trim_pattern(&str_to_runes("a**b")), str_to_runes("a*b"));
    }

    #[test]
    fn trim_pattern_reorders_star_question() {
        assert_eq!(trim_pattern(&str_to_runes("*?")), str_to_runes("?*"));
    }

    #[test]
    fn trim_is_semantically_equivalent_to_original() {
        let cases = [("a**b", "axxxb"), ("*?", "z"), ("a**?b", "acb")];
        for (pattern, text) in cases {
            let original = matches(pattern, text);
            let trimmed_pattern = trim_pattern(&str_to_runes(pattern));
            let trimmed = match_rune(&trimmed_pattern, &str_to_runes(text));
            assert_eq!(original, trimmed, "pattern {pattern:?} diverged after trim");
        }
    }

    #[test]
    fn remove_escape_compacts_backslash_sequences() {
        let out = remove_escape(&str_to_runes("a\\*b"));
        assert_eq!(out, str_to_runes("a*b"));
    }
}
