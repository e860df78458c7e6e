//! Normalized string similarity

/// Similarity of two text fragments as a percentage in `0..=100`.
///
/// Both inputs are trimmed and lowercased. Identical strings (including two
/// blank ones) score 100; otherwise the score is the share of the longer
/// string left untouched by the Levenshtein edit script, rounded.
pub fn similarity(a: &str, b: &str) -> u32 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a == b {
        return 100;
    }

    // Non-zero: the strings differ, so at least one is non-empty
    let max_len = a.chars().count().max(b.chars().count());
    let distance = strsim::levenshtein(&a, &b);

    let kept = max_len.saturating_sub(distance) as f64;
    (kept * 100.0 / max_len as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_100() {
        for s in ["", "   ", "a", "Machine Learning", "日本語"] {
            assert_eq!(similarity(s, s), 100, "{s:?}");
        }
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(similarity("ABC", "abc"), 100);
        assert_eq!(similarity("  Design ", "design"), 100);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("kitten", "sitting"),
            ("AI/ML", "Machine Learning"),
            ("", "web"),
            ("Programming", "programing"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_known_values() {
        // distance 3 over 7 chars: round(400 / 7) = 57
        assert_eq!(similarity("kitten", "sitting"), 57);
        // one deletion over 11 chars: round(1000 / 11) = 91
        assert_eq!(similarity("Programming", "programing"), 91);
        assert_eq!(similarity("", "web"), 0);
        assert_eq!(similarity("abc", "xyz"), 0);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // one substitution over 4 chars
        assert_eq!(similarity("café", "cafe"), 75);
    }
}
