/// Lowercase `text` and split it on runs of whitespace.
///
/// No stemming, stop-word removal or punctuation stripping: `"Cat,"` and
/// `"cat"` are different terms.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase().split_whitespace().map(str::to_owned).collect()
}
