//! On-disk cache of raw batch results
//!
//! Every sampling call is persisted as soon as it returns, keyed by file
//! name on (batch, annealing time, chain strength scale). A rerun loads
//! existing entries instead of sampling again.

use crate::sampler::{format_float, SampleSet};
use crate::topology::Qubit;
use crate::Result;
use log::warn;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of a cached raw batch
pub fn raw_file_name(batch: usize, annealing_time: u64, css: f64) -> String {
    format!(
        "output_raw_part_{}_at_{}_css_{}.json",
        batch,
        annealing_time,
        format_float(css)
    )
}

/// File name of an unembedded result
pub fn output_file_name(annealing_time: u64, css: f64) -> String {
    format!("output_at_{}_css_{}.csv", annealing_time, format_float(css))
}

/// Raw batch cache rooted at one directory
#[derive(Debug, Clone)]
pub struct BatchCache {
    dir: PathBuf,
}

impl BatchCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of one batch entry
    pub fn path(&self, batch: usize, annealing_time: u64, css: f64) -> PathBuf {
        self.dir.join(raw_file_name(batch, annealing_time, css))
    }

    /// Load an entry if it exists and deserializes
    ///
    /// An entry that does not deserialize is reported and treated as missing
    /// so that the batch gets resampled and the entry overwritten. Failing to
    /// read an existing entry is an error.
    pub fn load(&self, path: &Path) -> Result<Option<SampleSet<Qubit>>> {
        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(path)?;
        match SampleSet::from_json(&json) {
            Ok(set) => Ok(Some(set)),
            Err(e) => {
                warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Write an entry atomically
    pub fn store(&self, path: &Path, set: &SampleSet<Qubit>) -> Result<()> {
        let dir = path.parent().unwrap_or(&self.dir);
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(set.to_json()?.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubo::Vartype;
    use crate::sampler::SampleRecord;
    use crate::RcmError;
    use std::collections::HashSet;

    fn batch() -> SampleSet<Qubit> {
        let mut set = SampleSet::new(vec![Qubit(0), Qubit(4)], Vartype::Binary);
        set.push(SampleRecord {
            sample: vec![1, 0],
            energy: -1.5,
            num_occurrences: 1,
            chain_break_fraction: None,
        })
        .unwrap();
        set
    }

    #[test]
    fn test_file_names() {
        assert_eq!(raw_file_name(0, 20, 1.0), "output_raw_part_0_at_20_css_1.0.json");
        assert_eq!(output_file_name(200, 0.5), "output_at_200_css_0.5.csv");
        assert_eq!(output_file_name(5, 1e-5), "output_at_5_css_1e-05.csv");
        assert_eq!(raw_file_name(2, 5, 1e16), "output_raw_part_2_at_5_css_1e+16.json");
    }

    #[test]
    fn test_distinct_keys_distinct_names() {
        let mut names = HashSet::new();
        for batch in 0..3 {
            for at in [1, 10, 100] {
                for css in [0.5, 1.0, 1.5, 10.0] {
                    assert!(names.insert(raw_file_name(batch, at, css)));
                }
            }
        }
        assert_eq!(names.len(), 36);
    }

    #[test]
    fn test_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BatchCache::new(dir.path());
        let path = cache.path(1, 20, 1.0);

        assert_eq!(cache.load(&path).unwrap(), None);
        cache.store(&path, &batch()).unwrap();
        assert_eq!(cache.load(&path).unwrap(), Some(batch()));
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BatchCache::new(dir.path());
        let path = cache.path(0, 20, 1.0);

        std::fs::write(&path, "{\"variables\": [0, 4], \"rec").unwrap();
        assert_eq!(cache.load(&path).unwrap(), None);

        cache.store(&path, &batch()).unwrap();
        assert!(cache.load(&path).unwrap().is_some());
    }

    #[test]
    fn test_unreadable_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BatchCache::new(dir.path());
        let path = cache.path(0, 20, 1.0);

        std::fs::create_dir(&path).unwrap();
        assert!(matches!(cache.load(&path), Err(RcmError::IoError(_))));
    }
}
