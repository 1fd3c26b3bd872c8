//! Field tokenization and stemming (spec §4.3, §4.5). Grounded on the
//! teacher's `analysis::tokenizer::StandardTokenizer`: Unicode-aware word
//! boundaries via `unicode-segmentation`, lower-cased, with empty and
//! overlong tokens dropped. `stem` lives here rather than in `query` because
//! §4.5's rationale is explicit that query-side stemming only works because
//! it "matches the field indexer's own tokenisation" — both sides of the
//! match must run the same rule, so both go through this module.

use unicode_segmentation::UnicodeSegmentation;

/// Tokenize on Unicode word boundaries (the regex-`[\w]+` equivalent spec
/// §4.3 calls for), lower-casing and dropping empty tokens and tokens
/// longer than `max_word_length`.
pub fn tokenize(text: &str, max_word_length: usize) -> Vec<String> {
    text.unicode_words()
        .map(|w| w.to_lowercase())
        .filter(|w| !w.is_empty() && w.chars().count() <= max_word_length)
        .collect()
}

/// `tokenize` followed by `stem` on every token. What `IndexMapper` actually
/// feeds the trie (spec §8 scenario S3: a stored `"running"` must be
/// reachable by a query for `"run"`), and what term-frequency counting
/// inside a document's text must use for the same reason.
pub fn tokenize_stemmed(text: &str, max_word_length: usize) -> Vec<String> {
    tokenize(text, max_word_length)
        .into_iter()
        .map(|t| stem(&t))
        .collect()
}

const STEM_EXCEPTIONS: &[&str] = &["this", "his", "is", "was", "has", "does", "series", "species"];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Spec §4.5 step 5, verbatim: the one bespoke stemmer this crate implements
/// (spec.md explicitly rejects the source's alternate `optimizeQuery`
/// variant in favor of this rule set — no deviation permitted).
pub fn stem(word: &str) -> String {
    if word.chars().count() <= 3 || STEM_EXCEPTIONS.contains(&word) {
        return word.to_string();
    }

    let chars: Vec<char> = word.chars().collect();
    let len = chars.len();

    let mut stemmed: String = if len >= 4 && word.ends_with("ying") {
        let mut s: String = chars[..len - 4].iter().collect();
        s.push('y');
        s
    } else if word.ends_with("ing") && len >= 5 {
        let before_a = chars[len - 5];
        let before_b = chars[len - 4];
        if !is_vowel(before_a) && !is_vowel(before_b) {
            chars[..len - 4].iter().collect()
        } else {
            chars[..len - 3].iter().collect()
        }
    } else if word.ends_with("ing") {
        chars[..len - 3].iter().collect()
    } else {
        word.to_string()
    };

    if stemmed.ends_with("ies") && stemmed.chars().count() > 3 {
        let n = stemmed.chars().count();
        let mut s: String = stemmed.chars().take(n - 3).collect();
        s.push('y');
        stemmed = s;
    } else if stemmed.ends_with("ss") {
        // preserved
    } else if stemmed.ends_with('s') {
        let n = stemmed.chars().count();
        stemmed = stemmed.chars().take(n - 1).collect();
    }

    if stemmed.ends_with("ed") && stemmed.chars().count() > 2 {
        let n = stemmed.chars().count();
        stemmed = stemmed.chars().take(n - 2).collect();
    }

    stemmed
}
