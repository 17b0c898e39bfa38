//! Reader for Slack exports, zipped or unpacked.
//!
//! Layout of an export (the same inside the zip archive):
//! ```text
//! export/
//!   users.json               required
//!   channels.json            public channels
//!   groups.json              private channels
//!   mpims.json               group conversations
//!   dms.json                 direct conversations
//!   general/2024-01-01.json  one array of messages per channel and day
//!   __uploads/F123/photo.png uploaded files, by file id
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use serde::de::DeserializeOwned;
use zip::ZipArchive;

use super::slack::{SlackChannel, SlackExport, SlackPost};
use super::uploads::Uploads;
use crate::core::models::ChannelType;
use crate::error::{MigrateError, Result};

/// Directory holding uploaded files inside an export.
pub const UPLOADS_DIR: &str = "__uploads";

/// Loads a [`SlackExport`] from disk.
pub struct ExportReader;

impl ExportReader {
    /// Reads the export at `path`: a `.zip` archive or an unpacked directory.
    pub fn read(path: impl AsRef<Path>) -> Result<SlackExport> {
        let path = path.as_ref();
        let export = if path.is_file() {
            Self::read_archive(path)?
        } else if path.is_dir() {
            Self::read_dir(path)?
        } else {
            return Err(MigrateError::export(
                "export path is neither a zip file nor a directory",
                Some(path.to_path_buf()),
            ));
        };

        info!(
            "Export contains {} users, {} channels with messages and {} uploaded files",
            export.users.len(),
            export.posts.len(),
            export.uploads.len()
        );
        Ok(export)
    }

    /// Reads an unpacked export rooted at `dir`.
    pub fn read_dir(dir: &Path) -> Result<SlackExport> {
        info!("Reading Slack export from {}", dir.display());

        let users_path = dir.join("users.json");
        if !users_path.is_file() {
            return Err(MigrateError::export(
                "users.json is missing",
                Some(users_path),
            ));
        }

        Ok(SlackExport {
            users: read_json(&users_path)?,
            public_channels: read_channels(dir, "channels.json", ChannelType::Open)?,
            private_channels: read_channels(dir, "groups.json", ChannelType::Private)?,
            group_channels: read_channels(dir, "mpims.json", ChannelType::Group)?,
            direct_channels: read_channels(dir, "dms.json", ChannelType::Direct)?,
            posts: read_posts(dir)?,
            uploads: read_uploads(&dir.join(UPLOADS_DIR))?.into(),
        })
    }

    /// Reads a zipped export.
    ///
    /// Entries are visited in name order, so daily files of a channel are
    /// concatenated by date and the first file of each upload id wins.
    /// Uploads stay in the archive and are extracted on demand.
    pub fn read_archive(path: &Path) -> Result<SlackExport> {
        info!("Reading Slack export archive {}", path.display());

        let mut archive = ZipArchive::new(File::open(path)?)?;
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();

        let mut export = SlackExport::default();
        let mut users = None;
        let mut uploads = HashMap::new();

        for name in &names {
            let parts: Vec<&str> = name.split('/').collect();
            match parts.as_slice() {
                ["users.json"] => users = Some(read_entry(&mut archive, name)?),
                ["channels.json"] => {
                    export.public_channels = typed(read_entry(&mut archive, name)?, ChannelType::Open);
                }
                ["groups.json"] => {
                    export.private_channels = typed(read_entry(&mut archive, name)?, ChannelType::Private);
                }
                ["mpims.json"] => {
                    export.group_channels = typed(read_entry(&mut archive, name)?, ChannelType::Group);
                }
                ["dms.json"] => {
                    export.direct_channels = typed(read_entry(&mut archive, name)?, ChannelType::Direct);
                }
                [UPLOADS_DIR, id, file] if !id.is_empty() && !file.is_empty() => {
                    uploads.entry((*id).to_string()).or_insert_with(|| name.clone());
                }
                [channel, day] if *channel != UPLOADS_DIR && day.ends_with(".json") => {
                    let day_posts: Vec<SlackPost> = read_entry(&mut archive, name)?;
                    export.posts.entry((*channel).to_string()).or_default().extend(day_posts);
                }
                _ => {}
            }
        }

        export.users = users.ok_or_else(|| {
            MigrateError::export("users.json is missing from the archive", Some(path.to_path_buf()))
        })?;
        for (name, posts) in &export.posts {
            debug!("Channel {}: {} messages", name, posts.len());
        }
        export.uploads = Uploads::Archive {
            archive: RefCell::new(archive),
            entries: uploads,
        };
        Ok(export)
    }
}

fn read_entry<T: DeserializeOwned>(archive: &mut ZipArchive<File>, name: &str) -> Result<T> {
    let mut content = String::new();
    archive.by_name(name)?.read_to_string(&mut content)?;
    serde_json::from_str(&content).map_err(|e| {
        error!("Failed to parse {}: {}", name, e);
        MigrateError::Json(e)
    })
}

fn typed(mut channels: Vec<SlackChannel>, channel_type: ChannelType) -> Vec<SlackChannel> {
    for channel in &mut channels {
        channel.channel_type = channel_type;
    }
    channels
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        error!("Failed to parse {}: {}", path.display(), e);
        MigrateError::Json(e)
    })
}

fn read_channels(dir: &Path, file_name: &str, channel_type: ChannelType) -> Result<Vec<SlackChannel>> {
    let path = dir.join(file_name);
    if !path.is_file() {
        debug!("{} not present in export", file_name);
        return Ok(Vec::new());
    }

    Ok(typed(read_json(&path)?, channel_type))
}

/// Sorted entries of `dir` matching `keep`.
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if keep(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// Messages of every channel directory, daily files read in name (date) order.
fn read_posts(dir: &Path) -> Result<HashMap<String, Vec<SlackPost>>> {
    let mut posts = HashMap::new();

    let channel_dirs = sorted_entries(dir, |p| {
        p.is_dir() && p.file_name().is_some_and(|n| n != UPLOADS_DIR)
    })?;
    for channel_dir in channel_dirs {
        let Some(name) = channel_dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let days = sorted_entries(&channel_dir, |p| {
            p.is_file() && p.extension().is_some_and(|e| e == "json")
        })?;
        let mut channel_posts = Vec::new();
        for day in &days {
            let day_posts: Vec<SlackPost> = read_json(day)?;
            channel_posts.extend(day_posts);
        }

        debug!("Channel {}: {} messages in {} files", name, channel_posts.len(), days.len());
        posts.insert(name, channel_posts);
    }

    Ok(posts)
}

/// Uploaded files keyed by file id; the first file of each id directory wins.
fn read_uploads(dir: &Path) -> Result<HashMap<String, PathBuf>> {
    let mut uploads = HashMap::new();
    if !dir.is_dir() {
        return Ok(uploads);
    }

    for id_dir in sorted_entries(dir, Path::is_dir)? {
        let Some(id) = id_dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if let Some(file) = sorted_entries(&id_dir, Path::is_file)?.into_iter().next() {
            uploads.insert(id, file);
        }
    }

    Ok(uploads)
}
