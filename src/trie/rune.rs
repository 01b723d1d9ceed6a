//! Rune/UTF-8 utilities (component 1, 4.10). Decodes UTF-8
//! to a fixed-width code-point array and case-folds for matching. Grounded
//! on `original_source/src/trie/rune_util.h`, simplified from the full
//! Unicode `SpecialCasing` table to `char::to_lowercase` (documented in
//! DESIGN.md as an explicit simplification — multi-codepoint case
//! expansions like German `ß` → `ss` are not modeled).

pub type Rune = char;

/// Decodes a UTF-8 string into its fixed-width rune (code point) sequence.
pub fn str_to_runes(s: &str) -> Vec<Rune> {
    s.chars().collect()
}

pub fn runes_to_string(runes: &[Rune]) -> String {
    runes.iter().collect()
}

/// Case-folds one rune for matching purposes. Multi-char fold results
/// (e.g. German sharp s) take only the first folded char, matching the
/// fixed-width-per-input-rune invariant the trie relies on.
pub fn fold(r: Rune) -> Rune {
    r.to_lowercase().next().unwrap_or(r)
}

pub fn fold_runes(runes: &[Rune]) -> Vec<Rune> {
    runes.iter().copied().map(fold).collect()
}

/// Longest common prefix length between two rune slices.
pub fn common_prefix_len(a: &[Rune], b: &[Rune]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ascii_and_multibyte() {
        let runes = str_to_runes("héllo");
        assert_eq!(runes.len(), 5);
        assert_eq!(runes_to_string(&runes), "héllo");
    }

    #[test]
    fn fold_lowercases() {
        assert_eq!(fold('A'), 'a');
        assert_eq!(fold('É'), 'é');
        assert_eq!(fold('z'), 'z');
    }

    #[test]
    fn common_prefix_len_finds_shared_prefix() {
        let a = str_to_runes("dostoevsky");
        let b = str_to_runes("dostoyevski");
        assert_eq!(common_prefix_len(&a, &b), 5);
    }
}
