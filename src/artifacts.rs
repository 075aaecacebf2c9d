//! Index Artifact Writer: persists the three artifacts a build produces;
//! the merged index, the offset map, and the URL map.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::error::{self, Result};
use crate::model::{url_map_from_wire, url_map_to_wire, OffsetMap, UrlMap};

/// Conventional artifact filenames within an `INDEX` directory.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        IndexPaths { root: root.into() }
    }

    pub fn merged_index(&self) -> PathBuf {
        self.root.join("merged_index")
    }

    pub fn offset_positions(&self) -> PathBuf {
        self.root.join("offset_positions")
    }

    pub fn url_map(&self) -> PathBuf {
        self.root.join("url_map")
    }

    pub fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.root).context(error::IoSnafu { path: self.root.clone() })
    }
}

/// Writes `offset_positions` and `url_map` (the merger already wrote
/// `merged_index` directly while streaming). Write failure is fatal: no
/// partial artifact set is considered valid.
pub fn write_offsets_and_urls(paths: &IndexPaths, offsets: &OffsetMap, urls: &UrlMap) -> Result<()> {
    let offsets_file = File::create(paths.offset_positions())
        .map_err(Box::<dyn std::error::Error + Send + Sync>::from)
        .context(error::ArtifactWriteSnafu {
            artifact: "offset_positions",
        })?;
    serde_json::to_writer(offsets_file, offsets)
        .map_err(Box::<dyn std::error::Error + Send + Sync>::from)
        .context(error::ArtifactWriteSnafu {
            artifact: "offset_positions",
        })?;

    let urls_file = File::create(paths.url_map())
        .map_err(Box::<dyn std::error::Error + Send + Sync>::from)
        .context(error::ArtifactWriteSnafu { artifact: "url_map" })?;
    let wire = url_map_to_wire(urls);
    serde_json::to_writer(urls_file, &wire)
        .map_err(Box::<dyn std::error::Error + Send + Sync>::from)
        .context(error::ArtifactWriteSnafu { artifact: "url_map" })?;

    Ok(())
}

/// Loads the offset map and URL map artifacts written by a prior build.
pub fn load_offsets(paths: &IndexPaths) -> Result<OffsetMap> {
    let path = paths.offset_positions();
    let text = fs::read_to_string(&path).context(error::IoSnafu { path: path.clone() })?;
    serde_json::from_str(&text).context(error::JsonSnafu { path })
}

pub fn load_url_map(paths: &IndexPaths) -> Result<UrlMap> {
    let path = paths.url_map();
    let text = fs::read_to_string(&path).context(error::IoSnafu { path: path.clone() })?;
    let wire: std::collections::HashMap<String, String> = serde_json::from_str(&text).context(error::JsonSnafu { path })?;
    Ok(url_map_from_wire(wire))
}

/// Size of the merged index file in kilobytes, used for build statistics.
pub fn merged_index_size_kb(path: &Path) -> Result<f64> {
    let metadata = fs::metadata(path).context(error::IoSnafu { path: path.to_path_buf() })?;
    Ok(metadata.len() as f64 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocId;
    use std::collections::HashMap;

    #[test]
    fn round_trips_offsets_and_urls() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        paths.ensure_exists().unwrap();

        let mut offsets = OffsetMap::new();
        offsets.insert("cat".to_string(), 0);
        offsets.insert("dog".to_string(), 42);

        let mut urls: UrlMap = HashMap::new();
        urls.insert(0 as DocId, "http://a".to_string());
        urls.insert(1 as DocId, "http://b".to_string());

        write_offsets_and_urls(&paths, &offsets, &urls).unwrap();

        let loaded_offsets = load_offsets(&paths).unwrap();
        let loaded_urls = load_url_map(&paths).unwrap();

        assert_eq!(loaded_offsets, offsets);
        assert_eq!(loaded_urls, urls);
    }
}
