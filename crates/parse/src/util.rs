/// Edit distance between two strings, counted in chars so accented letters
/// and currency glyphs in OCR output cost one edit, not one per byte.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let source: Vec<char> = s1.chars().collect();
    let target: Vec<char> = s2.chars().collect();
    if source.is_empty() || target.is_empty() {
        return source.len().max(target.len());
    }

    // Single row; `diagonal` holds the value the row had before this column.
    let mut row: Vec<usize> = (0..=target.len()).collect();
    for (i, &sc) in source.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &tc) in target.iter().enumerate() {
            let substitute = diagonal + usize::from(sc != tc);
            diagonal = row[j + 1];
            row[j + 1] = substitute.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[target.len()]
}

/// Case-insensitive "is `word` an OCR misreading of `canonical`" check.
pub fn fuzzy_eq(word: &str, canonical: &str, max_distance: usize) -> bool {
    let word = word.to_lowercase();
    let canonical = canonical.to_lowercase();
    // Short words get at most one edit, otherwise "tea" would match "the".
    let limit = if canonical.chars().count() <= 3 { max_distance.min(1) } else { max_distance };
    word.chars().count().abs_diff(canonical.chars().count()) <= limit
        && levenshtein_distance(&word, &canonical) <= limit
}

/// Alphabetic words of a line, lowercased. Digits and punctuation split words.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_are_zero() {
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("", ""), 0);
    }

    #[test]
    fn empty_string_is_length_of_other() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
    }

    #[test]
    fn single_substitution() {
        assert_eq!(levenshtein_distance("gel", "get"), 1);
    }

    #[test]
    fn commutative() {
        assert_eq!(
            levenshtein_distance("subrotal", "subtotal"),
            levenshtein_distance("subtotal", "subrotal")
        );
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(levenshtein_distance("café", "cafe"), 1);
    }

    #[test]
    fn fuzzy_eq_tolerates_ocr_typos() {
        assert!(fuzzy_eq("Duy", "buy", 1));
        assert!(fuzzy_eq("ona", "one", 1));
        assert!(fuzzy_eq("SUBROTAL", "subtotal", 2));
        assert!(!fuzzy_eq("bread", "buy", 1));
    }

    #[test]
    fn short_words_capped_at_one_edit() {
        assert!(!fuzzy_eq("the", "tea", 2));
        assert!(!fuzzy_eq("ham", "buy", 2));
    }

    #[test]
    fn words_splits_on_non_letters() {
        assert_eq!(words("M Iced Coffee-Line 8"), vec!["m", "iced", "coffee", "line"]);
        assert_eq!(words("1: 0275"), Vec::<String>::new());
    }
}
