//! Document Source: enumerates candidate document records from an input
//! directory tree, skipping anything that fails to decode.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

/// A single crawled document record as stored on disk: a UTF-8 JSON object
/// with a `url` and `content` field. Both are optional on the wire; a
/// missing `url` is resolved to the sentinel `"Not Found"` by the extractor,
/// and a missing `content` yields no tokens.
#[derive(Debug, Deserialize)]
pub struct DocumentRecord {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

const NOT_FOUND: &str = "Not Found";

impl DocumentRecord {
    pub fn url_or_sentinel(&self) -> &str {
        self.url.as_deref().unwrap_or(NOT_FOUND)
    }
}

/// Walks `root` recursively and returns the paths of every file whose
/// contents decode as a UTF-8 [`DocumentRecord`]. Decode failures (I/O
/// errors, invalid UTF-8, malformed JSON) are skipped silently; this is the
/// sole validation point downstream components rely on to stay total.
pub fn enumerate(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_valid_record(path))
        .collect()
}

fn is_valid_record(path: &Path) -> bool {
    match fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str::<DocumentRecord>(&text) {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "skipping undecodable record");
                false
            }
        },
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "skipping unreadable path");
            false
        }
    }
}

/// Loads and decodes the record at `path`. Callers must only pass paths
/// previously returned by [`enumerate`], so decode failure here would
/// indicate a race (the file changed underfoot) rather than a normal skip
/// condition; it is surfaced as an I/O-flavored error.
pub fn load(path: &Path) -> crate::error::Result<DocumentRecord> {
    use snafu::ResultExt;

    let text = fs::read_to_string(path).context(crate::error::IoSnafu { path: path.to_path_buf() })?;
    serde_json::from_str(&text).context(crate::error::JsonSnafu { path: path.to_path_buf() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn enumerate_skips_undecodable_and_nonexistent() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.json");
        File::create(&good)
            .unwrap()
            .write_all(br#"{"url": "http://a", "content": "<p>hi</p>"}"#)
            .unwrap();

        let bad = dir.path().join("b.json");
        File::create(&bad).unwrap().write_all(b"not json").unwrap();

        let subdir = dir.path().join("nested");
        std::fs::create_dir(&subdir).unwrap();
        let nested = subdir.join("c.json");
        File::create(&nested)
            .unwrap()
            .write_all(br#"{"url": "http://c"}"#)
            .unwrap();

        let mut paths = enumerate(dir.path());
        paths.sort();

        assert_eq!(paths, vec![good, nested]);
    }

    #[test]
    fn url_or_sentinel_defaults_to_not_found() {
        let record = DocumentRecord { url: None, content: None };
        assert_eq!(record.url_or_sentinel(), "Not Found");
    }
}
