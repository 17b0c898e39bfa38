//! Uploaded files of an export, keyed by Slack file id.
//!
//! An unpacked export keeps them on disk under `__uploads/<id>/<name>`; a
//! zipped export keeps them as archive entries with the same names. Both are
//! read through [`Uploads::copy_to`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

/// Index of uploaded files.
pub enum Uploads {
    /// Files on disk
    Directory(HashMap<String, PathBuf>),
    /// Entries of the export archive
    Archive {
        archive: RefCell<ZipArchive<File>>,
        entries: HashMap<String, String>,
    },
}

impl Uploads {
    pub fn len(&self) -> usize {
        match self {
            Uploads::Directory(files) => files.len(),
            Uploads::Archive { entries, .. } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the upload `id` to `dest`.
    ///
    /// Returns `Ok(false)` when the export has no such upload.
    pub fn copy_to(&self, id: &str, dest: &Path) -> io::Result<bool> {
        match self {
            Uploads::Directory(files) => {
                let Some(source) = files.get(id) else {
                    return Ok(false);
                };
                fs::copy(source, dest)?;
            }
            Uploads::Archive { archive, entries } => {
                let Some(name) = entries.get(id) else {
                    return Ok(false);
                };
                let mut archive = archive.borrow_mut();
                let mut entry = archive.by_name(name).map_err(io::Error::other)?;
                let mut out = File::create(dest)?;
                io::copy(&mut entry, &mut out)?;
            }
        }
        Ok(true)
    }
}

impl Default for Uploads {
    fn default() -> Self {
        Uploads::Directory(HashMap::new())
    }
}

impl fmt::Debug for Uploads {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uploads::Directory(files) => f.debug_tuple("Directory").field(files).finish(),
            Uploads::Archive { entries, .. } => {
                f.debug_struct("Archive").field("entries", entries).finish_non_exhaustive()
            }
        }
    }
}

impl From<HashMap<String, PathBuf>> for Uploads {
    fn from(files: HashMap<String, PathBuf>) -> Self {
        Uploads::Directory(files)
    }
}
