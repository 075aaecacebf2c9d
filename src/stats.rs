//! Build statistics, replacing module-level mutable globals with fields of
//! a build-context object.

use std::fmt;

/// Summary counters reported after a build completes.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub indexed_documents: usize,
    pub unique_terms: usize,
    pub merged_index_kb: f64,
    pub partial_run_count: usize,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----------------###### STATISTICS ######----------------")?;
        writeln!(f, "The number of indexed documents: {}", self.indexed_documents)?;
        writeln!(f, "The number of unique words: {}", self.unique_terms)?;
        writeln!(f, "The total size (in KB) of your index on disk: {:.2}", self.merged_index_kb)?;
        writeln!(f, "The number of partial indexes created: {}", self.partial_run_count)?;
        write!(f, "----------------############################----------------")
    }
}
