//! Recursive directory loader producing one document per page

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::types::{Document, FileType};

use super::parser::FileParser;

/// A supported file that could not be read or parsed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedFile {
    /// Path relative to the loaded directory
    pub filename: String,
    pub error: String,
}

/// Pages loaded from a directory plus the files that were skipped
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedFile>,
}

/// Loads every supported file below a directory
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
    recursive: bool,
}

impl DirectoryLoader {
    /// Create a recursive loader for `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: true,
        }
    }

    /// Only load files directly inside the root
    pub fn non_recursive(mut self) -> Self {
        self.recursive = false;
        self
    }

    /// Directory this loader reads from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load all pages, ordered by file path then page number.
    ///
    /// Files that fail to parse are logged and left out.
    pub fn load(&self) -> Result<Vec<Document>> {
        Ok(self.load_with_skipped()?.documents)
    }

    /// Like [`load`](Self::load), also reporting which files were skipped
    pub fn load_with_skipped(&self) -> Result<LoadOutcome> {
        if !self.root.is_dir() {
            return Err(Error::DirectoryNotFound(self.root.clone()));
        }

        tracing::info!("Loading documents from {}...", self.root.display());

        let mut walker = WalkDir::new(&self.root).sort_by_file_name();
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut outcome = LoadOutcome::default();

        for entry in walker.into_iter().filter_entry(|e| !is_hidden(e)) {
            let entry = entry.map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let file_type = FileType::from_filename(&path.to_string_lossy());
            if !file_type.is_supported() {
                tracing::debug!("Skipping unsupported file {}", path.display());
                continue;
            }

            match self.load_file(path) {
                Ok(pages) => outcome.documents.extend(pages),
                Err(e) => {
                    tracing::warn!("Failed to load file {}: {}", path.display(), e);
                    outcome.skipped.push(SkippedFile {
                        filename: self.relative(path).to_string_lossy().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Successfully loaded {} document pages ({} files skipped).",
            outcome.documents.len(),
            outcome.skipped.len()
        );

        Ok(outcome)
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    /// Load one file into page documents
    fn load_file(&self, path: &Path) -> Result<Vec<Document>> {
        let data = std::fs::read(path)?;
        let relative = self.relative(path).to_path_buf();
        let filename = relative.to_string_lossy().to_string();

        let parsed = FileParser::parse(&filename, &data)?;
        let mime = mime_guess::from_path(path).first_or_octet_stream().to_string();

        let documents = parsed
            .pages
            .into_iter()
            .enumerate()
            .map(|(index, page)| {
                let mut doc = Document::new(
                    relative.clone(),
                    parsed.file_type.clone(),
                    index,
                    page.page_number,
                    page.content,
                );
                doc.metadata.insert("file_name".into(), doc.filename.clone().into());
                doc.metadata.insert("file_path".into(), filename.clone().into());
                doc.metadata.insert("file_type".into(), mime.clone().into());
                doc.metadata.insert("file_size".into(), (data.len() as u64).into());
                doc.metadata.insert("page_label".into(), doc.page_label.clone().into());
                doc.metadata
                    .insert("content_hash".into(), parsed.content_hash.clone().into());
                doc
            })
            .collect::<Vec<_>>();

        tracing::debug!("Loaded {} pages from {}", documents.len(), filename);

        Ok(documents)
    }
}

/// Load all pages below `dir` recursively
pub fn load_documents(dir: impl AsRef<Path>) -> Result<Vec<Document>> {
    DirectoryLoader::new(dir.as_ref()).load()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_not_found() {
        let err = load_documents("/definitely/not/a/real/dir").unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound(_)));
    }

    #[test]
    fn test_recursive_load_with_stable_ids() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.txt"), "second file").unwrap();
        std::fs::write(dir.path().join("nested/a.md"), "# First\n\nnested file").unwrap();
        std::fs::write(dir.path().join(".hidden.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("image.bin"), [0u8, 1, 2]).unwrap();

        let docs = load_documents(dir.path()).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "b.txt_part_0");
        assert_eq!(docs[1].filename, "a.md");
        assert_eq!(docs[1].metadata["file_path"], "nested/a.md");
        assert_eq!(docs[1].id, "nested/a.md_part_0");
        assert!(docs.iter().all(|d| !d.text.contains("ignored")));

        let again = load_documents(dir.path()).unwrap();
        let ids: Vec<_> = again.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, docs.iter().map(|d| d.id.clone()).collect::<Vec<_>>());
    }

    #[test]
    fn test_unparseable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_good.txt"), "Accuracy of 94.5%.").unwrap();
        std::fs::write(dir.path().join("b_broken.pdf"), "not a pdf").unwrap();

        let outcome = DirectoryLoader::new(dir.path()).load_with_skipped().unwrap();

        assert_eq!(outcome.documents.len(), 1);
        assert_eq!(outcome.documents[0].filename, "a_good.txt");
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].filename, "b_broken.pdf");
        assert!(outcome.skipped[0].error.contains("b_broken.pdf"));

        assert_eq!(load_documents(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_non_recursive_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("top.txt"), "top").unwrap();
        std::fs::write(dir.path().join("nested/deep.txt"), "deep").unwrap();

        let docs = DirectoryLoader::new(dir.path()).non_recursive().load().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "top.txt");
    }

    #[test]
    fn test_empty_directory_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_documents(dir.path()).unwrap().is_empty());
    }
}
