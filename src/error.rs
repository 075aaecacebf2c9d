use std::path::PathBuf;

use snafu::Snafu;

/// Crate-wide error type. Every fallible operation in this crate returns
/// `Result<T, Error>`; see `Result` below.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to read {}: {source}", path.display()))]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to decode JSON in {}: {source}", path.display()))]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },

    /// A partial-run record didn't decode to the expected single-entry
    /// `{term: postings}` shape. The builder and merger share one process,
    /// so this should never occur; it is treated as fatal, not recoverable.
    #[snafu(display("malformed partial-run record at {}:{line}", path.display()))]
    MalformedRunRecord { path: PathBuf, line: u64 },

    #[snafu(display("failed to write {artifact} artifact: {source}"))]
    ArtifactWrite {
        source: Box<dyn std::error::Error + Send + Sync>,
        artifact: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
