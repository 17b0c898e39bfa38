//! Copying uploaded files into the attachments directory.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{MigrateError, Result};
use crate::parsing::slack::SlackFile;
use crate::parsing::uploads::Uploads;

/// Destination of a Slack file: `<dir>/<file id>_<file name>`.
pub fn attachment_path(file: &SlackFile, attachments_dir: &Path) -> PathBuf {
    attachments_dir.join(format!("{}_{}", file.id, file.name))
}

/// Copies `file` from the export's uploads into `attachments_dir`.
///
/// Returns the destination path, or `None` when the export does not contain
/// the file (logged, not fatal). Failing to write the copy is an error.
pub fn copy_attachment(
    file: &SlackFile,
    uploads: &Uploads,
    attachments_dir: &Path,
) -> Result<Option<String>> {
    let dest = attachment_path(file, attachments_dir);
    let copied = uploads
        .copy_to(&file.id, &dest)
        .map_err(|e| MigrateError::attachment(&file.id, &dest, e))?;
    if !copied {
        warn!("Failed to retrieve file with id {} from the export", file.id);
        return Ok(None);
    }
    debug!("Copied file {} to {}", file.id, dest.display());

    Ok(Some(dest.to_string_lossy().into_owned()))
}
