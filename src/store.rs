//! Flat-file study storage.
//!
//! Study files live directly in one data directory. Users see the files whose
//! names start with their account prefix; administrators see everything and
//! are the only ones who may upload or delete. Files are read fresh on every
//! call. Uploads go through a temporary file in the data directory and are
//! renamed into place, so readers never observe a half-written file; there is
//! no other coordination and the last write wins.

use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::session::{AuthError, Identity};
use crate::table::{Table, TableError};

/// Extensions listed by default
pub const DEFAULT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// Errors from the study store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error on the data directory
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Error while persisting an uploaded file
    #[error("Failed to store upload: {0}")]
    PersistError(#[from] tempfile::PersistError),

    /// Error loading a study table
    #[error("Table error: {0}")]
    TableError(#[from] TableError),

    /// The identity may not perform the action
    #[error(transparent)]
    AuthError(#[from] AuthError),

    /// Name is not a plain file name with an allowed extension
    #[error("Invalid study name: {0}")]
    InvalidName(String),

    /// No such study (or not visible to the identity)
    #[error("Study not found: {0}")]
    NotFound(String),
}

/// A data directory of study files
#[derive(Debug, Clone)]
pub struct StudyStore {
    root: PathBuf,
    extensions: Vec<String>,
}

impl StudyStore {
    /// Open a store over `root`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root)?;
        }
        Ok(Self {
            root,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        })
    }

    /// Replace the list of allowed extensions (case-insensitive, no dot)
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// The data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn has_allowed_extension(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|allowed| e.eq_ignore_ascii_case(allowed)))
            .unwrap_or(false)
    }

    fn checked_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        let plain = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\'])
            && name != "..";
        if !plain || !self.has_allowed_extension(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    /// Study file names visible to `identity`, sorted
    pub fn list(&self, identity: &Identity) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.starts_with('.')
                && self.has_allowed_extension(&name)
                && identity.can_access(&name)
            {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Load a study visible to `identity`
    pub fn load(&self, identity: &Identity, name: &str) -> Result<Table, StoreError> {
        let path = self.checked_path(name)?;
        if !identity.can_access(name) || !path.is_file() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(Table::from_path(&path)?)
    }

    /// Copy `source` into the store as `name` (administrators only)
    pub fn upload(&self, identity: &Identity, source: &Path, name: &str) -> Result<PathBuf, StoreError> {
        identity.require_admin("upload studies")?;
        let target = self.checked_path(name)?;

        let mut temp = tempfile::NamedTempFile::new_in(&self.root)?;
        let mut input = fs::File::open(source)?;
        io::copy(&mut input, temp.as_file_mut())?;
        temp.as_file().sync_all()?;
        temp.persist(&target)?;

        info!("'{}' uploaded study {}", identity.id, name);
        Ok(target)
    }

    /// Delete a study (administrators only)
    pub fn delete(&self, identity: &Identity, name: &str) -> Result<(), StoreError> {
        identity.require_admin("delete studies")?;
        let path = self.checked_path(name)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        fs::remove_file(&path)?;
        info!("'{}' deleted study {}", identity.id, name);
        Ok(())
    }
}
