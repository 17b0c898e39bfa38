//! Slack export model and reader.
//!
//! - [`slack`] - Raw export types, message classification and value conversions
//! - [`export`] - [`ExportReader`] for zipped or unpacked exports
//! - [`uploads`] - Uploaded files, on disk or inside the archive

pub mod export;
pub mod slack;
pub mod uploads;

// Re-export commonly used items
pub use export::{ExportReader, UPLOADS_DIR};
pub use slack::{
    MessageKind, SlackChannel, SlackExport, SlackFile, SlackPost, SlackUser, convert_channel_name,
    convert_timestamp,
};
pub use uploads::Uploads;
