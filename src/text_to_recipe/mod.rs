//! Turn a free-text recipe caption into structured fields.

pub mod ascii;
pub mod classifier;
pub mod segmenter;

pub use ascii::to_ascii;
pub use classifier::{Classification, Classifier, TagKeywords, TagRule};
pub use segmenter::{Segmented, Segmenter, SegmenterKeywords};

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Words of `text`, split on anything that is not a word character.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c))
        .filter(|word| !word.is_empty())
}

/// Whether `keyword` occurs in `text`.
///
/// Multi-word keywords match as plain substrings. Single words must stand
/// alone (so "rice" does not match "price") and may carry a plural "s".
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    if keyword.contains(' ') {
        return text.contains(keyword);
    }

    let at_boundary = |rest: &str| rest.chars().next().map_or(true, |c| !is_word_char(c));
    text.match_indices(keyword).any(|(start, _)| {
        let starts_word = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let after = &text[start + keyword.len()..];
        let after = after
            .strip_prefix('s')
            .filter(|rest| at_boundary(rest))
            .unwrap_or(after);
        starts_word && at_boundary(after)
    })
}
