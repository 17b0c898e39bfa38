//! Raw Slack export types and conversion helpers.
//!
//! These structs mirror the JSON files of a Slack workspace export.
//! They are deserialized as-is and only interpreted by the transformer.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::uploads::Uploads;
use crate::core::models::ChannelType;

/// Slack user from `users.json`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlackUser {
    pub id: String,
    #[serde(rename = "name")]
    pub username: String,
    #[serde(default)]
    pub profile: SlackProfile,
}

/// The `profile` object of a Slack user.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlackProfile {
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub email: String,
}

/// `{"value": ...}` wrapper used for channel purpose and topic.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlackChannelSub {
    #[serde(default)]
    pub value: String,
}

/// Slack channel from `channels.json`, `groups.json`, `mpims.json` or `dms.json`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlackChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub purpose: SlackChannelSub,
    #[serde(default)]
    pub topic: SlackChannelSub,
    /// Assigned from the file the channel was read from.
    #[serde(skip)]
    pub channel_type: ChannelType,
}

impl SlackChannel {
    /// Name used for the channel's message directory: the name, or the id
    /// for unnamed (direct) channels.
    pub fn original_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Comment payload of a `file_comment` message.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlackComment {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub comment: String,
}

/// File shared in a message.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlackFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
}

/// One message from a channel's daily message file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlackPost {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub bot_id: String,
    #[serde(default, rename = "username")]
    pub bot_username: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "ts")]
    pub timestamp: String,
    #[serde(default)]
    pub thread_ts: String,
    #[serde(default, rename = "type")]
    pub post_type: String,
    #[serde(default)]
    pub subtype: String,
    pub comment: Option<SlackComment>,
    pub file: Option<SlackFile>,
    pub files: Option<Vec<SlackFile>>,
    #[serde(default)]
    pub attachments: Vec<Value>,
}

/// How a Slack message is imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Regular message, possibly with files
    Plain,
    /// Comment on a shared file
    FileComment,
    /// Bot or workflow message
    Bot,
    /// Channel join/leave notice
    JoinLeave,
    /// `/me` message
    Me,
    /// Topic change
    ChannelTopic,
    /// Purpose change
    ChannelPurpose,
    /// Rename
    ChannelName,
    /// Anything else
    Unsupported,
}

impl MessageKind {
    /// Returns `true` if messages of this kind end up in the import.
    pub fn is_importable(self) -> bool {
        !matches!(
            self,
            MessageKind::JoinLeave | MessageKind::Me | MessageKind::Unsupported
        )
    }
}

impl SlackPost {
    /// Classifies the message by its type and subtype.
    pub fn kind(&self) -> MessageKind {
        if self.post_type != "message" {
            return MessageKind::Unsupported;
        }
        match self.subtype.as_str() {
            "" | "file_share" | "thread_broadcast" => MessageKind::Plain,
            "file_comment" => MessageKind::FileComment,
            "bot_message" => MessageKind::Bot,
            "channel_join" | "channel_leave" => MessageKind::JoinLeave,
            "me_message" => MessageKind::Me,
            "channel_topic" => MessageKind::ChannelTopic,
            "channel_purpose" => MessageKind::ChannelPurpose,
            "channel_name" => MessageKind::ChannelName,
            _ => MessageKind::Unsupported,
        }
    }

    /// Returns `true` if this message replies to another message's thread.
    pub fn is_reply(&self) -> bool {
        !self.thread_ts.is_empty() && self.thread_ts != self.timestamp
    }

    /// Files attached to the message; `file` wins over `files`.
    pub fn attached_files(&self) -> Vec<&SlackFile> {
        match (&self.file, &self.files) {
            (Some(file), _) => vec![file],
            (None, Some(files)) => files.iter().collect(),
            (None, None) => Vec::new(),
        }
    }

    /// Creation time in milliseconds.
    pub fn create_at(&self) -> i64 {
        convert_timestamp(&self.timestamp)
    }

    /// Microsecond ordering key; unparsable timestamps sort first.
    pub fn sort_key(&self) -> i64 {
        parse_timestamp(&self.timestamp).map_or(0, |dt| dt.timestamp_micros())
    }
}

/// Parsed contents of a Slack export.
#[derive(Debug, Default)]
pub struct SlackExport {
    pub users: Vec<SlackUser>,
    pub public_channels: Vec<SlackChannel>,
    pub private_channels: Vec<SlackChannel>,
    pub group_channels: Vec<SlackChannel>,
    pub direct_channels: Vec<SlackChannel>,
    /// Messages keyed by the channel's original name
    pub posts: HashMap<String, Vec<SlackPost>>,
    /// Uploaded files keyed by Slack file id
    pub uploads: Uploads,
}

/// Parses a Slack `ts` ("1700000000.123456": seconds and microseconds).
///
/// Fractional digits beyond microseconds are dropped.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    let secs = secs.parse::<i64>().ok()?;

    let digits: String = frac.chars().take(6).collect();
    let micros = if digits.is_empty() {
        0
    } else {
        format!("{:0<6}", digits).parse::<u32>().ok()?
    };

    DateTime::from_timestamp(secs, micros * 1000)
}

/// Converts a Slack `ts` to milliseconds since epoch.
///
/// Unparsable timestamps become `0`.
pub fn convert_timestamp(ts: &str) -> i64 {
    match parse_timestamp(ts) {
        Some(dt) => dt.timestamp_millis(),
        None => {
            warn!("Unable to parse Slack timestamp '{}'", ts);
            0
        }
    }
}

fn channel_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9_-]+$").expect("valid regex"))
}

/// Returns `true` if `name` only uses characters Mattermost allows in channel handles.
pub fn is_valid_channel_name(name: &str) -> bool {
    channel_name_regex().is_match(name)
}

/// Converts a Slack channel name into a Mattermost channel handle.
pub fn convert_channel_name(name: &str, id: &str) -> String {
    let trimmed = name.trim_matches(|c| c == '_' || c == '-');
    if trimmed.chars().count() == 1 {
        return format!("slack-channel-{}", trimmed);
    }
    if is_valid_channel_name(trimmed) {
        return trimmed.to_string();
    }
    if id.is_empty() {
        trimmed.to_lowercase()
    } else {
        id.to_lowercase()
    }
}
