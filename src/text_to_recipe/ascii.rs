use unicode_normalization::UnicodeNormalization;

/// Reduce text to ASCII: accented letters lose their marks, anything else
/// without an ASCII form (emoji, symbols) is dropped.
pub fn to_ascii(text: &str) -> String {
    text.nfkd().filter(char::is_ascii).collect()
}
