//! External-memory inverted-index builder and query tool for a crawled web
//! corpus: field-weighted HTML extraction, bounded-memory partial-index
//! construction with sorted-run spilling, and a k-way streaming merge.

pub mod artifacts;
pub mod builder;
pub mod document_source;
pub mod error;
pub mod extractor;
pub mod merge;
pub mod model;
pub mod query;
pub mod stats;
pub mod tokenizer;

use std::path::{Path, PathBuf};

pub use builder::BuildConfig;
pub use error::{Error, Result};
pub use stats::BuildStats;

/// Conventional default input directory name.
pub const DEFAULT_INPUT_DIR: &str = "DEV";

/// Conventional default output directory name.
pub fn default_output_dir() -> PathBuf {
    PathBuf::from("INDEX")
}

/// Everything produced by a full [`build`]: the statistics a CLI would
/// print, and the artifact paths needed to drive queries afterward.
pub struct BuildResult {
    pub stats: BuildStats,
    pub paths: artifacts::IndexPaths,
}

/// Runs a full build: enumerate documents, build sorted partial runs,
/// merge them, and persist all three artifacts.
pub fn build(input_dir: &Path, config: &BuildConfig) -> Result<BuildResult> {
    let paths = artifacts::IndexPaths::new(config.output_dir.clone());
    paths.ensure_exists()?;

    let document_paths = document_source::enumerate(input_dir);
    tracing::info!(count = document_paths.len(), "enumerated candidate documents");

    let build_output = builder::build(&document_paths, config)?;
    tracing::info!(
        runs = build_output.run_paths.len(),
        documents = build_output.indexed_documents,
        "partial-index build complete"
    );

    let merge_output = merge::merge(&build_output.run_paths, &paths.merged_index())?;
    tracing::info!(terms = merge_output.offsets.len(), "merge complete");

    artifacts::write_offsets_and_urls(&paths, &merge_output.offsets, &build_output.url_map)?;

    let merged_index_kb = artifacts::merged_index_size_kb(&paths.merged_index())?;

    let stats = BuildStats {
        indexed_documents: build_output.indexed_documents,
        unique_terms: merge_output.offsets.len(),
        merged_index_kb,
        partial_run_count: build_output.run_paths.len(),
    };

    Ok(BuildResult { stats, paths })
}

/// Runs a query against an already-built index: tokenize, look up each
/// term's offset, seek, intersect, and resolve the winning doc-ids back to
/// URLs.
pub fn query(query_str: &str, paths: &artifacts::IndexPaths, limit: usize) -> Result<Vec<String>> {
    let offsets = artifacts::load_offsets(paths)?;
    let url_map = artifacts::load_url_map(paths)?;
    let doc_ids = query::search(query_str, &offsets, &paths.merged_index(), limit)?;

    Ok(doc_ids
        .into_iter()
        .map(|doc_id| url_map.get(&doc_id).cloned().unwrap_or_else(|| "Not Found".to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_doc(dir: &Path, name: &str, url: &str, content: &str) {
        let path = dir.join(name);
        let body = serde_json::json!({ "url": url, "content": content });
        fs::write(path, body.to_string()).unwrap();
    }

    #[test]
    fn end_to_end_build_and_query_two_documents_shared_term() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();

        write_doc(input_dir.path(), "d0.json", "http://d0", "<title>cat</title>");
        write_doc(input_dir.path(), "d1.json", "http://d1", "cat cat");

        let config = BuildConfig {
            token_limit: 30_000,
            output_dir: output_dir.path().to_path_buf(),
            parallel_extraction: false,
        };

        let result = build(input_dir.path(), &config).unwrap();
        assert_eq!(result.stats.indexed_documents, 2);
        assert_eq!(result.stats.unique_terms, 1);

        let mut urls = query("CAT", &result.paths, query::DEFAULT_RESULT_LIMIT).unwrap();
        urls.sort();
        assert_eq!(urls, vec!["http://d0".to_string(), "http://d1".to_string()]);

        // "dog" is absent from the index and silently contributes no
        // constraint, so this still matches both documents rather than
        // returning an empty result.
        let urls = query("cat dog", &result.paths, query::DEFAULT_RESULT_LIMIT).unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn empty_input_directory_produces_trivial_artifacts() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();

        let config = BuildConfig {
            token_limit: 30_000,
            output_dir: output_dir.path().to_path_buf(),
            parallel_extraction: false,
        };

        let result = build(input_dir.path(), &config).unwrap();
        assert_eq!(result.stats.indexed_documents, 0);
        assert_eq!(result.stats.unique_terms, 0);
        assert_eq!(result.stats.partial_run_count, 0);
    }
}
