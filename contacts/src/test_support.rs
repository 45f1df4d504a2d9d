//! Test-only helpers for stores backed by temporary directories.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::io::store::ContactStore;

pub const CONTACTS_FILE: &str = "contacts.txt";

/// A `ContactStore` pointing at `contacts.txt` inside a fresh temp dir.
///
/// The file does not exist until a test writes it or the store creates it.
pub struct TestStore {
    temp: TempDir,
    pub path: PathBuf,
    pub store: ContactStore,
}

impl TestStore {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let path = temp.path().join(CONTACTS_FILE);
        let store = ContactStore::for_path(&path);
        Ok(Self { temp, path, store })
    }

    /// Store whose file already holds `contents`.
    pub fn with_contents(contents: &str) -> Result<Self> {
        let fixture = Self::new()?;
        fs::write(&fixture.path, contents)
            .with_context(|| format!("write {}", fixture.path.display()))?;
        Ok(fixture)
    }

    pub fn dir(&self) -> &Path {
        self.temp.path()
    }

    /// Raw file contents; panics if the file is missing.
    pub fn contents(&self) -> String {
        fs::read_to_string(&self.path).expect("read contacts file")
    }
}
