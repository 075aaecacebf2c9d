//! Tokenizer/Stemmer: normalizes extractor fragments into `(term, field-tag)`
//! pairs by lowercasing, alphanumeric segmentation, and Porter stemming.

use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

use crate::extractor::Fragment;
use crate::model::FieldTag;

/// A stemmed, lowercase alphanumeric term paired with the field-tag of the
/// fragment it was extracted from.
pub type Token = (String, FieldTag);

/// Tokenizes every fragment in order, preserving input order (frequency
/// accounting happens downstream, in the partial-index builder).
pub fn tokenize(fragments: &[Fragment]) -> Vec<Token> {
    let stemmer = Stemmer::create(Algorithm::English);
    fragments
        .iter()
        .flat_map(|(text, field)| tokenize_fragment(text, *field, &stemmer))
        .collect()
}

fn tokenize_fragment(text: &str, field: FieldTag, stemmer: &Stemmer) -> Vec<Token> {
    let lower = text.to_lowercase();
    alphanumeric_runs(&lower)
        .into_iter()
        .map(|run| (stemmer.stem(run).into_owned(), field))
        .collect()
}

/// Returns the maximal runs of ASCII alphanumeric graphemes in `text`,
/// treating everything else as a separator. `text` is expected to already
/// be lowercased.
fn alphanumeric_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, grapheme) in text.grapheme_indices(true) {
        if is_alphanumeric_grapheme(grapheme) {
            if run_start.is_none() {
                run_start = Some(i);
            }
        } else if let Some(start) = run_start.take() {
            runs.push(&text[start..i]);
        }
    }
    if let Some(start) = run_start {
        runs.push(&text[start..]);
    }
    runs
}

fn is_alphanumeric_grapheme(grapheme: &str) -> bool {
    grapheme.chars().count() == 1 && grapheme.chars().next().unwrap().is_ascii_alphanumeric()
}

/// Tokenizes a raw query string the same way document text is tokenized:
/// lowercase, alphanumeric-segment, stem. Used by the query resolver.
pub fn tokenize_query(query: &str) -> Vec<String> {
    let stemmer = Stemmer::create(Algorithm::English);
    let lower = query.to_lowercase();
    alphanumeric_runs(&lower)
        .into_iter()
        .map(|run| stemmer.stem(run).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_and_stems() {
        let tokens = tokenize(&[("Running Dogs!".to_string(), FieldTag::Title)]);
        assert_eq!(
            tokens,
            vec![
                ("run".to_string(), FieldTag::Title),
                ("dog".to_string(), FieldTag::Title),
            ]
        );
    }

    #[test]
    fn non_alphanumeric_characters_are_separators() {
        let tokens = tokenize(&[("foo-bar_42".to_string(), FieldTag::Body)]);
        let terms: Vec<&str> = tokens.iter().map(|(term, _)| term.as_str()).collect();
        assert_eq!(terms, vec!["foo", "bar", "42"]);
    }

    #[test]
    fn query_tokenization_matches_document_tokenization() {
        assert_eq!(tokenize_query("CAT Dogs"), vec!["cat".to_string(), "dog".to_string()]);
    }
}
