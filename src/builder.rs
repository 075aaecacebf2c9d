//! Partial-Index Builder: accumulates an in-memory inverted index until a
//! term-count threshold is crossed, then flushes a sorted run to disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use snafu::ResultExt;

use crate::error::{self, Result};
use crate::model::{DocId, IndexRecord, InMemoryIndex, PostingList, UrlMap};
use crate::{extractor, tokenizer};

/// Tunable knobs for a build, exposed on the CLI rather than hardcoded
/// module constants.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Distinct-term threshold before a partial run is flushed.
    pub token_limit: usize,
    /// Directory partial runs and final artifacts are written to.
    pub output_dir: PathBuf,
    /// Whether to extract/tokenize documents in parallel before folding
    /// them into the shared index sequentially in enumeration order.
    pub parallel_extraction: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            token_limit: 30_000,
            output_dir: PathBuf::from("INDEX"),
            parallel_extraction: true,
        }
    }
}

/// Outcome of the partial-index build phase: the sorted-run files produced
/// and the populated URL map.
pub struct BuildOutput {
    pub run_paths: Vec<PathBuf>,
    pub url_map: UrlMap,
    pub indexed_documents: usize,
}

/// Runs the partial-index builder over every document path, in the order
/// given. Doc-ids are assigned in that same order regardless of whether
/// extraction itself runs in parallel.
pub fn build(paths: &[PathBuf], config: &BuildConfig) -> Result<BuildOutput> {
    let extracted: Vec<Option<(Vec<extractor::Fragment>, String)>> = if config.parallel_extraction {
        paths
            .par_iter()
            .map(|path| extract_or_log(path))
            .collect()
    } else {
        paths.iter().map(|path| extract_or_log(path)).collect()
    };

    let mut index: InMemoryIndex = InMemoryIndex::new();
    let mut url_map = UrlMap::new();
    let mut run_paths = Vec::new();
    let mut doc_id: DocId = 0;
    let mut run_counter: usize = 0;
    let mut indexed_documents = 0;

    for extracted in extracted.into_iter().flatten() {
        let (fragments, url) = extracted;
        url_map.insert(doc_id, url);
        indexed_documents += 1;

        for (term, field) in tokenizer::tokenize(&fragments) {
            index
                .entry(term)
                .or_insert_with(PostingList::new)
                .entry(doc_id)
                .or_default()
                .record(field);
        }

        doc_id += 1;

        if index.len() > config.token_limit {
            let path = flush(&index, &config.output_dir, run_counter)?;
            run_paths.push(path);
            index.clear();
            run_counter += 1;
        }
    }

    if !index.is_empty() {
        // The run counter is bumped before this final flush but was never
        // bumped before any of the intermediate ones above, so numbering
        // may be non-contiguous. Preserved verbatim from the reference
        // behavior this builder mirrors.
        run_counter += 1;
        let path = flush(&index, &config.output_dir, run_counter)?;
        run_paths.push(path);
    }

    Ok(BuildOutput {
        run_paths,
        url_map,
        indexed_documents,
    })
}

fn extract_or_log(path: &Path) -> Option<(Vec<extractor::Fragment>, String)> {
    match extractor::extract(path) {
        Ok(result) => Some(result),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to extract document");
            None
        }
    }
}

fn flush(index: &InMemoryIndex, output_dir: &Path, run_counter: usize) -> Result<PathBuf> {
    let path = output_dir.join(format!("partial_index_{run_counter}"));
    let file = File::create(&path).context(error::IoSnafu { path: path.clone() })?;
    let mut writer = BufWriter::new(file);

    // `index` is a BTreeMap, so terms are already in lexicographic order;
    // no separate sort step is needed before flush.
    for (term, postings) in index {
        let record = IndexRecord::single(term.clone(), postings.clone());
        let line = serde_json::to_string(&record).context(error::JsonSnafu { path: path.clone() })?;
        writeln!(writer, "{line}").context(error::IoSnafu { path: path.clone() })?;
    }
    writer.flush().context(error::IoSnafu { path: path.clone() })?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::BufRead;

    fn write_doc(dir: &Path, name: &str, url: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let body = serde_json::json!({ "url": url, "content": content });
        fs::write(&path, body.to_string()).unwrap();
        path
    }

    #[test]
    fn single_title_document_flushes_one_run_with_correct_postings() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let path = write_doc(input_dir.path(), "a.json", "http://a", "<title>Hello World</title>");

        let config = BuildConfig {
            token_limit: 30_000,
            output_dir: output_dir.path().to_path_buf(),
            parallel_extraction: false,
        };
        let output = build(&[path], &config).unwrap();

        assert_eq!(output.indexed_documents, 1);
        assert_eq!(output.url_map.get(&0), Some(&"http://a".to_string()));
        assert_eq!(output.run_paths.len(), 1);

        let content = fs::read_to_string(&output.run_paths[0]).unwrap();
        let mut lines: Vec<&str> = content.lines().collect();
        lines.sort();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn token_limit_of_one_flushes_one_run_per_distinct_term() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let a = write_doc(input_dir.path(), "a.json", "http://a", "<title>alpha</title>");
        let b = write_doc(input_dir.path(), "b.json", "http://b", "<title>beta</title>");

        let config = BuildConfig {
            token_limit: 1,
            output_dir: output_dir.path().to_path_buf(),
            parallel_extraction: false,
        };
        let output = build(&[a, b], &config).unwrap();

        assert!(output.run_paths.len() >= 2);

        let mut terms = Vec::new();
        for run in &output.run_paths {
            let file = File::open(run).unwrap();
            for line in std::io::BufReader::new(file).lines() {
                let line = line.unwrap();
                let record: IndexRecord = serde_json::from_str(&line).unwrap();
                let (term, _) = record.into_single().unwrap();
                terms.push(term);
            }
        }
        terms.sort();
        assert_eq!(terms, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn missing_content_still_consumes_a_doc_id() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let a = write_doc(input_dir.path(), "a.json", "http://a", "<title>x</title>");
        let path_b = input_dir.path().join("b.json");
        fs::write(&path_b, serde_json::json!({ "url": "http://b" }).to_string()).unwrap();

        let config = BuildConfig {
            token_limit: 30_000,
            output_dir: output_dir.path().to_path_buf(),
            parallel_extraction: false,
        };
        let output = build(&[a, path_b], &config).unwrap();

        assert_eq!(output.indexed_documents, 2);
        assert_eq!(output.url_map.len(), 2);
        assert_eq!(output.url_map.get(&1), Some(&"http://b".to_string()));
    }
}
