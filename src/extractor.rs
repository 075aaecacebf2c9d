//! Content Extractor: parses a document record's HTML into a sequence of
//! `(text, field-tag)` fragments.

use std::collections::HashSet;

use scraper::{Html, Selector};

use crate::document_source::{self, DocumentRecord};
use crate::model::FieldTag;

/// One piece of extracted text, tagged with the structural element it came
/// from (or [`FieldTag::Body`] for everything else).
pub type Fragment = (String, FieldTag);

/// Loads and parses the record at `path`, returning its weighted and body
/// fragments alongside its URL (or `"Not Found"` if absent). A record whose
/// `content` is missing or empty yields no fragments, not an error.
pub fn extract(path: &std::path::Path) -> crate::error::Result<(Vec<Fragment>, String)> {
    let record = document_source::load(path)?;
    let url = record.url_or_sentinel().to_string();
    let fragments = extract_fragments(&record);
    Ok((fragments, url))
}

fn extract_fragments(record: &DocumentRecord) -> Vec<Fragment> {
    let content = match record.content.as_deref() {
        Some(content) if !content.trim().is_empty() => content,
        _ => return Vec::new(),
    };

    let document = Html::parse_document(content);
    let mut fragments = Vec::new();
    let mut weighted_parents: HashSet<ego_tree::NodeId> = HashSet::new();

    // Weighted tags first, mirroring the reference crawler's
    // `for tag in ["b", "strong", "h1", "h2", "h3", "title"]` ordering.
    for tag in FieldTag::WEIGHTED {
        let selector = match Selector::parse(tag.tag_name()) {
            Ok(selector) => selector,
            Err(_) => continue,
        };
        for element in document.select(&selector) {
            let text: String = element.text().collect::<Vec<_>>().join("").trim().to_string();
            if !text.is_empty() {
                fragments.push((text, tag));
                weighted_parents.insert(element.id());
            }
        }
    }

    // Every remaining text node whose immediate parent is not one of the
    // recorded weighted elements becomes a body fragment. Only the
    // immediate parent is checked (not any ancestor), preserving the
    // double-counting of nested weighted elements from the original.
    for node in document.tree.nodes() {
        let text_node = match node.value().as_text() {
            Some(text) => text,
            None => continue,
        };
        let parent_is_weighted = node
            .parent()
            .map(|parent| weighted_parents.contains(&parent.id()))
            .unwrap_or(false);
        if parent_is_weighted {
            continue;
        }
        let trimmed = text_node.trim();
        if !trimmed.is_empty() {
            fragments.push((trimmed.to_string(), FieldTag::Body));
        }
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_record(dir: &std::path::Path, name: &str, url: Option<&str>, content: Option<&str>) -> std::path::PathBuf {
        let path = dir.join(name);
        let body = serde_json::json!({ "url": url, "content": content });
        File::create(&path).unwrap().write_all(body.to_string().as_bytes()).unwrap();
        path
    }

    #[test]
    fn title_only_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(&dir.path(), "a.json", Some("http://a"), Some("<title>Hello World</title>"));

        let (fragments, url) = extract(&path).unwrap();
        assert_eq!(url, "http://a");
        assert_eq!(fragments, vec![("Hello World".to_string(), FieldTag::Title)]);
    }

    #[test]
    fn deduplication_skips_weighted_text_in_body_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(
            &dir.path(),
            "a.json",
            Some("http://a"),
            Some("<h1>Fast</h1><p>Fast lane</p>"),
        );

        let (fragments, _) = extract(&path).unwrap();
        assert_eq!(fragments.len(), 2);
        assert!(fragments.contains(&("Fast".to_string(), FieldTag::H1)));
        assert!(fragments.contains(&("Fast lane".to_string(), FieldTag::Body)));
    }

    #[test]
    fn missing_content_yields_no_fragments() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(&dir.path(), "a.json", Some("http://a"), None);

        let (fragments, url) = extract(&path).unwrap();
        assert!(fragments.is_empty());
        assert_eq!(url, "http://a");
    }

    #[test]
    fn missing_url_uses_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(&dir.path(), "a.json", None, Some("<p>hi</p>"));

        let (_, url) = extract(&path).unwrap();
        assert_eq!(url, "Not Found");
    }
}
