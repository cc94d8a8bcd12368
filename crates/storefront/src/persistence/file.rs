//! File-backed cart repository: one JSON document per scope.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;
use vendorcart_core::{CartRepository, CartScope, PersistenceError};

/// Stores each scope's payload in `<dir>/<storage key>.json`.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so a reader sees either the old or the new payload.
#[derive(Debug, Clone)]
pub struct FileCartRepository {
    dir: PathBuf,
}

impl FileCartRepository {
    /// Repository rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the payloads.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the payload for `scope`.
    #[must_use]
    pub fn path_for(&self, scope: &CartScope) -> PathBuf {
        self.dir.join(format!("{}.json", scope.storage_key()))
    }
}

impl CartRepository for FileCartRepository {
    fn load(&self, scope: &CartScope) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(scope)) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, scope: &CartScope, payload: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(scope);
        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(payload.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&temp_path, &path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn delete(&self, scope: &CartScope) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(scope)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
