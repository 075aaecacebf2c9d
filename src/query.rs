//! Query Resolver: intersects posting lists for a set of query terms.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use itertools::Itertools;
use snafu::ResultExt;

use crate::error::{self, Result};
use crate::model::{DocId, IndexRecord, OffsetMap};
use crate::tokenizer;

/// Default cap on the number of doc-ids returned by a query.
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Resolves `query` against the merged index at `merged_index_path` using
/// `offsets`. Terms absent from `offsets` contribute no constraint; this
/// makes the search effectively a conjunction over *known* terms only.
pub fn search(query: &str, offsets: &OffsetMap, merged_index_path: &Path, limit: usize) -> Result<Vec<DocId>> {
    // `.unique()` keeps only the first occurrence of each stemmed term, so
    // a repeated query word doesn't shrink the candidate set twice.
    let terms: Vec<String> = tokenizer::tokenize_query(query).into_iter().unique().collect();
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let mut file = File::open(merged_index_path).context(error::IoSnafu {
        path: merged_index_path.to_path_buf(),
    })?;

    let mut doc_sets: Vec<HashSet<DocId>> = Vec::new();
    for term in &terms {
        let Some(&offset) = offsets.get(term) else {
            continue;
        };
        let docs = read_posting_doc_ids(&mut file, merged_index_path, offset, term)?;
        doc_sets.push(docs);
    }

    if doc_sets.is_empty() {
        return Ok(Vec::new());
    }

    doc_sets.sort_by_key(|set| set.len());

    let mut result = doc_sets[0].clone();
    for set in &doc_sets[1..] {
        result.retain(|doc| set.contains(doc));
    }

    let mut result: Vec<DocId> = result.into_iter().collect();
    result.sort_unstable();
    result.truncate(limit);
    Ok(result)
}

fn read_posting_doc_ids(file: &mut File, path: &Path, offset: u64, term: &str) -> Result<HashSet<DocId>> {
    file.seek(SeekFrom::Start(offset)).context(error::IoSnafu { path: path.to_path_buf() })?;
    let mut reader = BufReader::new(&*file);
    let mut line = String::new();
    reader.read_line(&mut line).context(error::IoSnafu { path: path.to_path_buf() })?;

    let record: IndexRecord = serde_json::from_str(line.trim()).context(error::JsonSnafu { path: path.to_path_buf() })?;
    let (found_term, postings) = record.into_single().ok_or_else(|| {
        error::MalformedRunRecordSnafu {
            path: path.to_path_buf(),
            line: 0u64,
        }
        .build()
    })?;
    debug_assert_eq!(found_term, term);
    Ok(postings.keys().copied().collect())
}
