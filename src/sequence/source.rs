//! Document stream sources.
//!
//! A stream is an ordered list of documents, each active over
//! `[begin, end)` on the presentation timeline (`end = None` is open-ended).

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::{HrmError, Result};
use crate::time::Time;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEntry {
    pub begin: Time,
    pub end: Option<Time>,
    pub text: String,
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| HrmError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// A single document active from zero, forever.
#[derive(Debug, Clone)]
pub struct SingleDocument {
    path: PathBuf,
}

impl SingleDocument {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        SingleDocument { path: path.into() }
    }
}

impl IntoIterator for SingleDocument {
    type Item = Result<DocumentEntry>;
    type IntoIter = std::iter::Once<Result<DocumentEntry>>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::once(read(&self.path).map(|text| DocumentEntry {
            begin: Time::ZERO,
            end: None,
            text,
        }))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub begin: Time,
    pub end: Option<Time>,
    /// Relative to the manifest's directory.
    pub path: PathBuf,
}

/// A JSON list of documents and their active intervals.
///
/// Documents are read one at a time, as the stream is consumed.
#[derive(Debug, Clone)]
pub struct Manifest {
    root: PathBuf,
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let entries = serde_json::from_str(&read(path)?)?;
        Ok(Manifest {
            root: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            entries,
        })
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }
}

impl IntoIterator for Manifest {
    type Item = Result<DocumentEntry>;
    type IntoIter = Box<dyn Iterator<Item = Result<DocumentEntry>>>;

    fn into_iter(self) -> Self::IntoIter {
        let root = self.root;
        Box::new(self.entries.into_iter().map(move |entry| {
            let path = root.join(&entry.path);
            debug!("opening {} (begins at {})", path.display(), entry.begin);
            Ok(DocumentEntry {
                begin: entry.begin,
                end: entry.end,
                text: read(&path)?,
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hrm-validator-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn manifest_paths_are_relative_to_the_manifest() {
        let dir = scratch_dir("manifest");
        fs::write(dir.join("a.json"), "A").unwrap();
        fs::write(dir.join("b.json"), "B").unwrap();
        fs::write(
            dir.join("manifest.json"),
            r#"[{"begin": 0.5, "end": 3, "path": "a.json"}, {"begin": "5", "end": null, "path": "b.json"}]"#,
        )
        .unwrap();

        let manifest = Manifest::load(dir.join("manifest.json")).unwrap();
        assert_eq!(manifest.entries().len(), 2);

        let entries: Vec<_> = manifest.into_iter().collect::<Result<_>>().unwrap();
        assert_eq!(entries[0].begin, Time::from_ratio(1, 2).unwrap());
        assert_eq!(entries[0].end, Some(Time::from_secs(3)));
        assert_eq!(entries[0].text, "A");
        assert_eq!(entries[1].begin, Time::from_secs(5));
        assert_eq!(entries[1].end, None);
        assert_eq!(entries[1].text, "B");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_document_is_an_io_error() {
        let dir = scratch_dir("missing");
        fs::write(
            dir.join("manifest.json"),
            r#"[{"begin": 0, "end": null, "path": "nowhere.json"}]"#,
        )
        .unwrap();

        let manifest = Manifest::load(dir.join("manifest.json")).unwrap();
        let first = manifest.into_iter().next().unwrap();
        assert!(matches!(first, Err(HrmError::Io { .. })));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn single_document_starts_at_zero() {
        let dir = scratch_dir("single");
        fs::write(dir.join("doc.json"), "{}").unwrap();

        let entries: Vec<_> = SingleDocument::open(dir.join("doc.json")).into_iter().collect();
        assert_eq!(
            entries[0].as_ref().unwrap(),
            &DocumentEntry { begin: Time::ZERO, end: None, text: "{}".into() }
        );

        fs::remove_dir_all(dir).unwrap();
    }
}
