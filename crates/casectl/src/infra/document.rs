//! Reading test documents from disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::collab::DocumentSource;
use crate::domain::model::TestDocument;

/// File name suffixes recognized as test-definition documents.
pub const TEST_EXTENSIONS: &[&str] = &[".test", ".test_disabled", ".test.disabled"];

/// Reads document snapshots straight from the filesystem.
///
/// An editor embedding would flush unsaved buffers before snapshotting; for
/// files on disk the bytes already match what the runner will read.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDocuments;

impl DocumentSource for FsDocuments {
    fn snapshot(&self, path: &Path) -> Result<TestDocument> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read test document {}", path.display()))?;
        Ok(TestDocument {
            path: path.to_path_buf(),
            text,
        })
    }
}

/// Whether the file name carries one of the recognized test suffixes.
pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| TEST_EXTENSIONS.iter().any(|ext| name.ends_with(ext)))
}
