//! K-Way Merger: streams sorted runs through bounded per-run buffers and a
//! min-heap keyed by current term, unions postings per term, and emits one
//! record per term to the final index while recording byte offsets.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::error::{self, Result};
use crate::model::{IndexRecord, OffsetMap, PostingList};

/// Records loaded from a run file are buffered in blocks of up to this many
/// at a time, and reused as the output stream's periodic flush cadence.
const BUFFER_BLOCK_SIZE: usize = 500;

struct RunBuffer {
    reader: BufReader<File>,
    path: PathBuf,
    pending: std::collections::VecDeque<(String, PostingList)>,
    next_line: u64,
}

impl RunBuffer {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).context(error::IoSnafu { path: path.to_path_buf() })?;
        let mut buffer = RunBuffer {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            pending: std::collections::VecDeque::new(),
            next_line: 0,
        };
        buffer.refill()?;
        Ok(buffer)
    }

    fn refill(&mut self) -> Result<()> {
        let mut line = String::new();
        while self.pending.len() < BUFFER_BLOCK_SIZE {
            line.clear();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .context(error::IoSnafu { path: self.path.clone() })?;
            if bytes_read == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: IndexRecord = serde_json::from_str(trimmed).context(error::JsonSnafu { path: self.path.clone() })?;
            let (term, postings) = record.into_single().ok_or_else(|| {
                error::MalformedRunRecordSnafu {
                    path: self.path.clone(),
                    line: self.next_line,
                }
                .build()
            })?;
            self.next_line += 1;
            self.pending.push_back((term, postings));
        }
        Ok(())
    }

    fn head_term(&self) -> Option<&str> {
        self.pending.front().map(|(term, _)| term.as_str())
    }

    fn pop(&mut self) -> Result<(String, PostingList)> {
        let record = self.pending.pop_front().expect("pop called on empty buffer");
        if self.pending.is_empty() {
            self.refill()?;
        }
        Ok(record)
    }
}

/// Result of a successful merge: the path of the merged index file and the
/// term → byte-offset map into it.
pub struct MergeOutput {
    pub merged_index_path: PathBuf,
    pub offsets: OffsetMap,
}

/// Streams `run_paths` through a k-way merge, writing the unioned,
/// globally term-sorted result to `merged_index_path`.
pub fn merge(run_paths: &[PathBuf], merged_index_path: &Path) -> Result<MergeOutput> {
    let mut buffers: Vec<RunBuffer> = run_paths
        .iter()
        .map(|path| RunBuffer::open(path))
        .collect::<Result<_>>()?;

    let mut heap: BinaryHeap<Reverse<(String, usize)>> = BinaryHeap::new();
    for (run_id, buffer) in buffers.iter().enumerate() {
        if let Some(term) = buffer.head_term() {
            heap.push(Reverse((term.to_string(), run_id)));
        }
    }

    let out_file = File::create(merged_index_path).context(error::IoSnafu {
        path: merged_index_path.to_path_buf(),
    })?;
    let mut writer = BufWriter::new(out_file);

    let mut offsets = OffsetMap::new();
    let mut current_term: Option<String> = None;
    let mut accumulator = PostingList::new();
    let mut flush_counter: usize = 0;
    let mut position: u64 = 0;

    while let Some(Reverse((term, run_id))) = heap.pop() {
        if let Some(ref curr) = current_term {
            if *curr != term {
                emit(&mut writer, merged_index_path, &mut offsets, &mut position, curr, &accumulator)?;
                accumulator = PostingList::new();
                flush_counter += 1;
                if flush_counter >= BUFFER_BLOCK_SIZE {
                    writer.flush().context(error::IoSnafu {
                        path: merged_index_path.to_path_buf(),
                    })?;
                    flush_counter = 0;
                }
            }
        }
        current_term = Some(term);

        let (_, postings) = buffers[run_id].pop()?;
        for (doc_id, posting) in postings {
            accumulator.entry(doc_id).or_default().merge_from(&posting);
        }

        if let Some(head) = buffers[run_id].head_term() {
            heap.push(Reverse((head.to_string(), run_id)));
        }
    }

    if let Some(curr) = current_term {
        if !accumulator.is_empty() {
            emit(&mut writer, merged_index_path, &mut offsets, &mut position, &curr, &accumulator)?;
        }
    }

    writer.flush().context(error::IoSnafu {
        path: merged_index_path.to_path_buf(),
    })?;

    Ok(MergeOutput {
        merged_index_path: merged_index_path.to_path_buf(),
        offsets,
    })
}

/// Writes one term's merged record and records its starting byte offset.
/// The offset is tracked by hand rather than via `Seek::stream_position`,
/// since `BufWriter`'s `Seek` impl flushes its buffer on every call, which
/// would force a disk write per term instead of every `BUFFER_BLOCK_SIZE`.
fn emit(
    writer: &mut BufWriter<File>,
    path: &Path,
    offsets: &mut OffsetMap,
    position: &mut u64,
    term: &str,
    postings: &PostingList,
) -> Result<()> {
    offsets.insert(term.to_string(), *position);

    let record = IndexRecord::single(term.to_string(), postings.clone());
    let line = serde_json::to_string(&record).context(error::JsonSnafu { path: path.to_path_buf() })?;
    writeln!(writer, "{line}").context(error::IoSnafu { path: path.to_path_buf() })?;
    *position += line.len() as u64 + 1;
    Ok(())
}
