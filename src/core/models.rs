//! Intermediate representation between a Slack export and a Mattermost import.
//!
//! The transformer fills an [`Intermediate`] from a
//! [`SlackExport`](crate::parsing::SlackExport); the bulk-import writer
//! serializes it. [`IntermediatePost`] is also the value type of the thread
//! store, so it round-trips through JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mattermost channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChannelType {
    /// Public channel
    #[default]
    #[serde(rename = "O")]
    Open,
    /// Private channel
    #[serde(rename = "P")]
    Private,
    /// Group message
    #[serde(rename = "G")]
    Group,
    /// Direct message
    #[serde(rename = "D")]
    Direct,
}

impl ChannelType {
    /// Returns `true` for direct and group conversations.
    pub fn is_direct(self) -> bool {
        matches!(self, ChannelType::Direct | ChannelType::Group)
    }

    /// Single-letter code used by Mattermost.
    pub fn code(self) -> &'static str {
        match self {
            ChannelType::Open => "O",
            ChannelType::Private => "P",
            ChannelType::Group => "G",
            ChannelType::Direct => "D",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Open => write!(f, "public"),
            ChannelType::Private => write!(f, "private"),
            ChannelType::Group => write!(f, "group"),
            ChannelType::Direct => write!(f, "direct"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntermediateChannel {
    pub id: String,
    pub original_name: String,
    pub name: String,
    pub display_name: String,
    /// Slack user ids of the members that exist in the export
    pub members: Vec<String>,
    /// Member usernames, filled for group and direct channels
    pub members_usernames: Vec<String>,
    pub purpose: String,
    pub header: String,
    pub topic: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntermediateUser {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub email: String,
    pub password: String,
    /// Names of the public and private channels the user belongs to
    pub memberships: Vec<String>,
    pub auth_data: Option<String>,
    pub auth_service: String,
}

/// A message or thread root, with its replies inline.
///
/// `replies` is only ever appended to while a channel is assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntermediatePost {
    /// Author username
    pub user: String,
    /// Destination channel name
    pub channel: String,
    pub message: String,
    #[serde(default)]
    pub props: Map<String, Value>,
    /// Milliseconds since epoch, unique within the channel
    pub create_at: i64,
    /// Paths of copied attachment files
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub replies: Vec<IntermediatePost>,
    #[serde(default)]
    pub is_direct: bool,
    /// Member usernames; only set when `is_direct`
    #[serde(default)]
    pub channel_members: Vec<String>,
}

impl IntermediatePost {
    pub fn new(user: impl Into<String>, channel: impl Into<String>, message: impl Into<String>, create_at: i64) -> Self {
        Self {
            user: user.into(),
            channel: channel.into(),
            message: message.into(),
            create_at,
            ..Self::default()
        }
    }

    /// Number of posts in the thread, root included.
    pub fn thread_len(&self) -> usize {
        1 + self.replies.len()
    }
}

/// The complete, output-ready result of a transformation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Intermediate {
    pub public_channels: Vec<IntermediateChannel>,
    pub private_channels: Vec<IntermediateChannel>,
    pub group_channels: Vec<IntermediateChannel>,
    pub direct_channels: Vec<IntermediateChannel>,
    /// Users keyed by Slack user id
    #[serde(rename = "users")]
    pub users_by_id: BTreeMap<String, IntermediateUser>,
    pub posts: Vec<IntermediatePost>,
}

impl Intermediate {
    /// Iterates all channels in public, private, group, direct order.
    pub fn channels(&self) -> impl Iterator<Item = &IntermediateChannel> {
        self.public_channels
            .iter()
            .chain(&self.private_channels)
            .chain(&self.group_channels)
            .chain(&self.direct_channels)
    }

    /// Total number of posts, replies included.
    pub fn post_count(&self) -> usize {
        self.posts.iter().map(IntermediatePost::thread_len).sum()
    }
}
