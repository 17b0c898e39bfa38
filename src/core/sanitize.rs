//! Field-length sanitization against Mattermost's limits.
//!
//! Every truncation is logged as a warning; nothing here fails.

use log::warn;

use super::models::{ChannelType, IntermediateChannel, IntermediatePost, IntermediateUser};
use crate::parsing::slack::is_valid_channel_name;

pub const CHANNEL_NAME_MAX_LENGTH: usize = 64;
pub const CHANNEL_DISPLAY_NAME_MAX_RUNES: usize = 64;
pub const CHANNEL_PURPOSE_MAX_RUNES: usize = 250;
pub const CHANNEL_HEADER_MAX_RUNES: usize = 1024;
pub const USER_POSITION_MAX_RUNES: usize = 128;
pub const USER_FIRST_NAME_MAX_RUNES: usize = 64;
pub const USER_LAST_NAME_MAX_RUNES: usize = 64;

/// Default PostgreSQL post size limit (65535 bytes, 4 bytes per rune).
pub const POST_MESSAGE_MAX_RUNES: usize = 65535 / 4;

/// Truncates `s` to at most `max` characters.
pub fn truncate_runes(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Truncates `s` to at most `max` bytes without splitting a character.
fn truncate_bytes(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

fn exceeds(s: &str, max: usize) -> bool {
    s.chars().count() > max
}

impl IntermediateChannel {
    /// Brings names, purpose and header within Mattermost's limits.
    ///
    /// Direct channels have no name of their own and are left untouched.
    pub fn sanitise(&mut self) {
        if self.channel_type == ChannelType::Direct {
            return;
        }

        self.name = self.name.trim_matches(|c| c == '_' || c == '-').to_string();
        if self.name.len() > CHANNEL_NAME_MAX_LENGTH {
            warn!(
                "Channel {} handle exceeds the maximum length. It will be truncated when imported.",
                self.display_name
            );
            self.name = truncate_bytes(&self.name, CHANNEL_NAME_MAX_LENGTH);
        }
        if self.name.chars().count() == 1 {
            self.name = format!("slack-channel-{}", self.name);
        }
        if !is_valid_channel_name(&self.name) {
            self.name = self.id.to_lowercase();
        }

        self.display_name = self
            .display_name
            .trim_matches(|c| c == '_' || c == '-')
            .to_string();
        if exceeds(&self.display_name, CHANNEL_DISPLAY_NAME_MAX_RUNES) {
            warn!(
                "Channel {} display name exceeds the maximum length. It will be truncated when imported.",
                self.display_name
            );
            self.display_name = truncate_runes(&self.display_name, CHANNEL_DISPLAY_NAME_MAX_RUNES);
        }
        if self.display_name.chars().count() == 1 {
            self.display_name = format!("slack-channel-{}", self.display_name);
        }

        if exceeds(&self.purpose, CHANNEL_PURPOSE_MAX_RUNES) {
            warn!(
                "Channel {} purpose exceeds the maximum length. It will be truncated when imported.",
                self.display_name
            );
            self.purpose = truncate_runes(&self.purpose, CHANNEL_PURPOSE_MAX_RUNES);
        }

        if exceeds(&self.header, CHANNEL_HEADER_MAX_RUNES) {
            warn!(
                "Channel {} header exceeds the maximum length. It will be truncated when imported.",
                self.display_name
            );
            self.header = truncate_runes(&self.header, CHANNEL_HEADER_MAX_RUNES);
        }
    }
}

impl IntermediateUser {
    /// Fills a placeholder email and truncates profile fields.
    pub fn sanitise(&mut self) {
        if self.email.is_empty() {
            self.email = format!("{}@example.com", self.username);
            warn!(
                "User {} does not have an email address in the Slack export. Used {} as a placeholder. \
                 The user should update their email address once logged in to the system.",
                self.username, self.email
            );
        }

        if exceeds(&self.position, USER_POSITION_MAX_RUNES) {
            warn!(
                "User {} position {} is too long. Field will be truncated",
                self.username, self.position
            );
            self.position = truncate_runes(&self.position, USER_POSITION_MAX_RUNES);
        }

        if exceeds(&self.first_name, USER_FIRST_NAME_MAX_RUNES) {
            warn!(
                "User {} first name {} is too long. Field will be truncated",
                self.username, self.first_name
            );
            self.first_name = truncate_runes(&self.first_name, USER_FIRST_NAME_MAX_RUNES);
        }

        if exceeds(&self.last_name, USER_LAST_NAME_MAX_RUNES) {
            warn!(
                "User {} last name {} is too long. Field will be truncated",
                self.username, self.last_name
            );
            self.last_name = truncate_runes(&self.last_name, USER_LAST_NAME_MAX_RUNES);
        }
    }
}

impl IntermediatePost {
    pub fn sanitise(&mut self) {
        if exceeds(&self.message, POST_MESSAGE_MAX_RUNES) {
            self.message = truncate_runes(&self.message, POST_MESSAGE_MAX_RUNES);
        }
    }
}
