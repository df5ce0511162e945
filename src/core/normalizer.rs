// File: src/core/normalizer.rs
//! Folding of arbitrary Unicode word forms to a canonical lowercase ASCII identifier.
//!
//! Each character goes through, in order: the fold table, the fold table again
//! with the character lowercased, canonical decomposition with combining marks
//! dropped, and finally its own lowercase form. The last step can leave a
//! non-ASCII character behind, which makes [`normalize_and_validate`] reject
//! the whole word.
//!
//! The fold table is always consulted first so that intentional cross-language
//! equivalences ("çare" and "care") are never overridden by generic Unicode
//! behaviour.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fixed multi-language fold table. Returns the ASCII replacement for a
/// character, which may be longer than one character for ligatures.
pub fn fold(c: char) -> Option<&'static str> {
    match c {
        // Turkish
        'ç' | 'Ç' => Some("c"), 'ş' | 'Ş' => Some("s"),
        'ğ' | 'Ğ' => Some("g"), 'ı' | 'İ' => Some("i"),
        // German
        'ä' | 'Ä' => Some("a"), 'ö' | 'Ö' => Some("o"),
        'ü' | 'Ü' => Some("u"), 'ß' => Some("ss"),
        // French
        'à' | 'â' => Some("a"), 'æ' => Some("ae"),
        'é' | 'è' | 'ê' | 'ë' => Some("e"),
        'î' | 'ï' => Some("i"), 'ô' => Some("o"), 'œ' => Some("oe"),
        'ù' | 'û' => Some("u"), 'ÿ' => Some("y"),
        // Spanish
        'á' => Some("a"), 'í' => Some("i"), 'ó' => Some("o"), 'ú' => Some("u"),
        'ñ' | 'Ñ' => Some("n"),
        // Portuguese
        'ã' => Some("a"), 'õ' => Some("o"),
        // Polish
        'ą' => Some("a"), 'ć' => Some("c"), 'ę' => Some("e"), 'ł' => Some("l"),
        'ń' => Some("n"), 'ś' => Some("s"), 'ź' | 'ż' => Some("z"),
        // Czech/Slovak
        'č' => Some("c"), 'ď' => Some("d"), 'ě' => Some("e"), 'ň' => Some("n"),
        'ř' => Some("r"), 'š' => Some("s"), 'ť' => Some("t"), 'ů' => Some("u"),
        'ž' => Some("z"),
        // Nordic
        'å' | 'Å' => Some("a"), 'ø' | 'Ø' => Some("o"),
        // Romanian
        'ă' => Some("a"), 'ț' => Some("t"), 'ș' => Some("s"),
        _ => None,
    }
}

/// Appends the folded form of `c` to `out`.
fn fold_into(c: char, out: &mut String) {
    if let Some(ascii) = fold(c) {
        out.push_str(ascii);
        return;
    }

    // Only single-character lowercase forms can hit the table.
    let mut lower = c.to_lowercase();
    if let (Some(l), None) = (lower.next(), lower.next()) {
        if let Some(ascii) = fold(l) {
            out.push_str(ascii);
            return;
        }
    }

    let start = out.len();
    for d in c.nfd() {
        if !is_combining_mark(d) && d.is_ascii() {
            out.push(d.to_ascii_lowercase());
        }
    }
    if out.len() == start {
        out.extend(c.to_lowercase());
    }
}

/// Normalizes a single character. Ligatures may produce several characters.
pub fn normalize_char(c: char) -> String {
    let mut out = String::with_capacity(2);
    fold_into(c, &mut out);
    out
}

/// Normalizes every character of `word` and concatenates the results.
/// The output is not guaranteed to be a valid identifier.
pub fn normalize_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        fold_into(c, &mut out);
    }
    out
}

/// True when `word` is non-empty and made only of `a`-`z`.
pub fn is_valid_identifier(word: &str) -> bool {
    !word.is_empty() && word.bytes().all(|b| b.is_ascii_lowercase())
}

/// Folds `raw` and returns the canonical identifier, or `None` when the
/// folded form contains anything other than `a`-`z`.
pub fn normalize_and_validate(raw: &str) -> Option<String> {
    let normalized = normalize_word(raw);
    if is_valid_identifier(&normalized) {
        Some(normalized)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turkish_chars_fold() {
        for (c, expected) in [
            ('ç', "c"), ('Ç', "c"), ('ş', "s"), ('Ş', "s"), ('ğ', "g"), ('Ğ', "g"),
            ('ı', "i"), ('İ', "i"), ('ö', "o"), ('Ö', "o"), ('ü', "u"), ('Ü', "u"),
        ] {
            assert_eq!(normalize_char(c), expected, "char {c}");
        }
    }

    #[test]
    fn ligatures_expand() {
        assert_eq!(normalize_char('ß'), "ss");
        assert_eq!(normalize_char('æ'), "ae");
        assert_eq!(normalize_char('œ'), "oe");
        // Uppercase forms reach the table through their lowercase.
        assert_eq!(normalize_char('Æ'), "ae");
        assert_eq!(normalize_char('Œ'), "oe");
        assert_eq!(normalize_char('ẞ'), "ss");
    }

    #[test]
    fn uppercase_falls_back_to_lowercase_table_entry() {
        assert_eq!(normalize_char('Ł'), "l");
        assert_eq!(normalize_char('Ř'), "r");
        assert_eq!(normalize_char('Ă'), "a");
    }

    #[test]
    fn decomposition_handles_unlisted_accents() {
        // Not in the table: decomposed, mark dropped.
        assert_eq!(normalize_char('ǎ'), "a");
        assert_eq!(normalize_char('Ṡ'), "s");
        assert_eq!(normalize_char('ŷ'), "y");
    }

    #[test]
    fn ascii_passes_through_lowercased() {
        assert_eq!(normalize_char('a'), "a");
        assert_eq!(normalize_char('Z'), "z");
        assert_eq!(normalize_char('7'), "7");
        assert_eq!(normalize_char('-'), "-");
    }

    #[test]
    fn undecomposable_chars_survive_and_are_rejected() {
        assert_eq!(normalize_char('đ'), "đ");
        assert_eq!(normalize_and_validate("đak"), None);
        assert_eq!(normalize_and_validate("мир"), None);
    }

    #[test]
    fn words_fold() {
        assert_eq!(normalize_word("çare"), "care");
        assert_eq!(normalize_word("ışık"), "isik");
        assert_eq!(normalize_word("Größe"), "grosse");
        assert_eq!(normalize_word("Mädchen"), "madchen");
        assert_eq!(normalize_word("ÇARE"), "care");
    }

    #[test]
    fn homoglyph_pairs_are_equivalent() {
        for (a, b) in [("care", "çare"), ("uber", "über"), ("seker", "şeker"), ("nino", "niño")] {
            assert_eq!(normalize_word(a), normalize_word(b));
        }
    }

    #[test]
    fn validity_gate() {
        assert!(is_valid_identifier("abcdefghijklmnopqrstuvwxyz"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("Hello"));
        assert!(!is_valid_identifier("hello world"));
        assert!(!is_valid_identifier("abc1"));

        assert_eq!(normalize_and_validate("HELLO").as_deref(), Some("hello"));
        assert_eq!(normalize_and_validate("çare").as_deref(), Some("care"));
        assert_eq!(normalize_and_validate("hello123"), None);
        assert_eq!(normalize_and_validate("hello-world"), None);
        assert_eq!(normalize_and_validate("test@word"), None);
        assert_eq!(normalize_and_validate(" hi"), None);
        assert_eq!(normalize_and_validate(""), None);
    }

    #[test]
    fn accepted_output_is_only_lowercase_ascii() {
        for raw in ["Ærøskøbing", "Żółć", "Příliš", "ĞÜZEL", "Straße"] {
            let id = normalize_and_validate(raw).unwrap();
            assert!(id.bytes().all(|b| b.is_ascii_lowercase()), "{raw} -> {id}");
        }
    }

    #[test]
    fn fold_table_values_are_lowercase_ascii() {
        let sample = "çÇşŞğĞıİäÄöÖüÜßàâæéèêëîïôœùûÿáíóúñÑãõąćęłńśźżčďěňřšťůžåÅøØățș";
        for c in sample.chars() {
            let folded = fold(c).unwrap_or_else(|| panic!("{c} missing from table"));
            assert!(folded.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }
}
