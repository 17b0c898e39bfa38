//! Slack export → intermediate model.
//!
//! [`Transformer`] runs the conversion in a fixed order: users, channels,
//! memberships, then posts channel by channel. Posts of a channel are
//! assembled into threads through a [`ThreadStore`] opened for that channel
//! only, and the threads it reports as changed are appended to the output.

use std::collections::{HashMap, HashSet};

use log::{debug, error, info, warn};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::{Map, Value};

use super::attachments::copy_attachment;
use super::models::{ChannelType, Intermediate, IntermediateChannel, IntermediatePost, IntermediateUser};
use super::stats::TransformStats;
use super::threading::{TimestampLedger, WORKFLOW_USER_NAME, add_post_to_threads};
use crate::config::TransformConfig;
use crate::error::Result;
use crate::parsing::slack::{
    MessageKind, SlackChannel, SlackExport, SlackPost, SlackUser, convert_channel_name,
};
use crate::parsing::uploads::Uploads;
use crate::store::{MemoryStoreFactory, StoreFactory, ThreadStore, into_post, open_factory};

/// Group conversations with more members than this become private channels.
pub const CHANNEL_GROUP_MAX_USERS: usize = 8;

/// Slack id of the synthesized workflow user.
pub const WORKFLOW_USER_ID: &str = "importedworkflow";

const WORKFLOW_USER_EMAIL: &str = "imported-workflow@example.com";
const GENERATED_PASSWORD_LEN: usize = 26;

/// Builds an [`Intermediate`] from a parsed [`SlackExport`].
#[derive(Debug)]
pub struct Transformer {
    pub team: String,
    pub intermediate: Intermediate,
    pub stats: TransformStats,
}

impl Transformer {
    pub fn new(team: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            intermediate: Intermediate::default(),
            stats: TransformStats::new(),
        }
    }

    /// Runs the whole conversion, selecting the thread store from `config.redis`.
    ///
    /// The store is set up before anything else so that a bad Redis
    /// configuration fails the run at startup.
    pub fn transform(&mut self, config: &TransformConfig, export: &SlackExport) -> Result<()> {
        if let Some(redis) = &config.redis {
            redis.validate()?;
        }
        let mut factory: Box<dyn StoreFactory> = if config.skip_channels || config.skip_posts {
            Box::new(MemoryStoreFactory)
        } else {
            open_factory(config.redis.as_ref())?
        };

        self.transform_with(config, export, factory.as_mut())
    }

    /// Same as [`transform`](Self::transform), with the thread store supplied by the caller.
    pub fn transform_with(
        &mut self,
        config: &TransformConfig,
        export: &SlackExport,
        factory: &mut dyn StoreFactory,
    ) -> Result<()> {
        self.transform_users(&export.users, config.effective_auth_service());
        if !config.skip_channels {
            self.transform_all_channels(export);
            self.populate_user_memberships();
            self.populate_channel_memberships();
            if !config.skip_posts {
                self.transform_posts(config, export, factory)?;
            }
        }

        self.stats.log_summary();
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Converts Slack users, keyed by Slack id.
    ///
    /// With an `auth_service`, the user's email becomes their auth data.
    pub fn transform_users(&mut self, users: &[SlackUser], auth_service: Option<&str>) {
        info!("Transforming users");

        for user in users {
            let mut new_user = IntermediateUser {
                id: user.id.clone(),
                username: user.username.clone(),
                first_name: user.profile.first_name.clone(),
                last_name: user.profile.last_name.clone(),
                position: user.profile.title.clone(),
                email: user.profile.email.clone(),
                ..IntermediateUser::default()
            };
            if let Some(service) = auth_service {
                new_user.auth_data = Some(user.profile.email.clone());
                new_user.auth_service = service.to_string();
            }
            new_user.sanitise();

            self.intermediate.users_by_id.insert(new_user.id.clone(), new_user);
        }
    }

    /// Returns the workflow user's username, creating the user on first use.
    pub fn select_or_create_workflow_user(&mut self) -> String {
        if let Some(user) = self.intermediate.users_by_id.get(WORKFLOW_USER_ID) {
            return user.username.clone();
        }

        let mut user = IntermediateUser {
            id: WORKFLOW_USER_ID.to_string(),
            username: WORKFLOW_USER_NAME.to_string(),
            first_name: "Imported".to_string(),
            last_name: "Workflow".to_string(),
            email: WORKFLOW_USER_EMAIL.to_string(),
            password: generate_password(),
            ..IntermediateUser::default()
        };
        user.sanitise();
        info!("Created user {} for bot and workflow messages", user.username);

        let username = user.username.clone();
        self.intermediate.users_by_id.insert(user.id.clone(), user);
        username
    }

    // =========================================================================
    // Channels
    // =========================================================================

    /// Converts channels, keeping only members that exist among the users.
    ///
    /// Direct and group conversations left with fewer than two members are
    /// dropped. Groups with more than [`CHANNEL_GROUP_MAX_USERS`] members
    /// become private channels named after their purpose.
    pub fn transform_channels(&self, channels: &[SlackChannel]) -> Vec<IntermediateChannel> {
        let mut result = Vec::with_capacity(channels.len());

        for channel in channels {
            let members: Vec<String> = channel
                .members
                .iter()
                .filter(|id| self.intermediate.users_by_id.contains_key(*id))
                .cloned()
                .collect();

            if channel.channel_type.is_direct() && members.len() <= 1 {
                warn!(
                    "Bulk export for direct channels containing a single member is not supported. \
                     Not importing channel {}",
                    channel.original_name()
                );
                continue;
            }

            let mut name = channel.name.clone();
            let mut channel_type = channel.channel_type;
            if channel_type == ChannelType::Group && members.len() > CHANNEL_GROUP_MAX_USERS {
                name = channel.purpose.value.clone();
                channel_type = ChannelType::Private;
            }

            let mut new_channel = IntermediateChannel {
                id: channel.id.clone(),
                original_name: channel.original_name().to_string(),
                name: convert_channel_name(&name, &channel.id),
                display_name: name,
                members,
                purpose: channel.purpose.value.clone(),
                header: channel.topic.value.clone(),
                topic: channel.topic.value.clone(),
                channel_type,
                ..IntermediateChannel::default()
            };
            new_channel.sanitise();

            result.push(new_channel);
        }

        result
    }

    /// Converts every channel list of the export.
    ///
    /// Oversized groups land among the private channels.
    pub fn transform_all_channels(&mut self, export: &SlackExport) {
        info!("Transforming channels");

        self.intermediate.public_channels = self.transform_channels(&export.public_channels);
        self.intermediate.private_channels = self.transform_channels(&export.private_channels);

        let (big_groups, groups): (Vec<_>, Vec<_>) = self
            .transform_channels(&export.group_channels)
            .into_iter()
            .partition(|c| c.channel_type == ChannelType::Private);
        self.intermediate.private_channels.extend(big_groups);
        self.intermediate.group_channels = groups;

        self.intermediate.direct_channels = self.transform_channels(&export.direct_channels);
        self.stats.channels = self.intermediate.channels().count();
    }

    /// Fills each user's public and private channel names.
    pub fn populate_user_memberships(&mut self) {
        info!("Populating user memberships");

        let intermediate = &mut self.intermediate;
        for user in intermediate.users_by_id.values_mut() {
            user.memberships = intermediate
                .public_channels
                .iter()
                .chain(&intermediate.private_channels)
                .filter(|c| c.members.contains(&user.id))
                .map(|c| c.name.clone())
                .collect();
        }
    }

    /// Fills member usernames of group and direct channels.
    pub fn populate_channel_memberships(&mut self) {
        info!("Populating channel memberships");

        let intermediate = &mut self.intermediate;
        let users = &intermediate.users_by_id;
        for channel in intermediate
            .group_channels
            .iter_mut()
            .chain(intermediate.direct_channels.iter_mut())
        {
            channel.members_usernames = channel
                .members
                .iter()
                .filter_map(|id| users.get(id))
                .map(|u| u.username.clone())
                .collect();
        }
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Converts the messages of every channel, in channel-name order.
    ///
    /// Messages of channels that were not imported are skipped with a warning.
    pub fn transform_posts(
        &mut self,
        config: &TransformConfig,
        export: &SlackExport,
        factory: &mut dyn StoreFactory,
    ) -> Result<()> {
        info!("Transforming posts using {} thread storage", factory.describe());

        let channels: HashMap<String, IntermediateChannel> = self
            .intermediate
            .channels()
            .map(|c| (c.original_name.clone(), c.clone()))
            .collect();

        let mut names: Vec<&String> = export.posts.keys().collect();
        names.sort();

        for name in names {
            let Some(channel) = channels.get(name) else {
                warn!("Channel {} was not imported, skipping its posts", name);
                continue;
            };

            let mut threads = factory.open(name)?;
            let roots = self
                .transform_channel_posts(config, export, &export.posts[name], channel, threads.as_mut())
                .inspect_err(|e| error!("Failed to transform posts of channel {}: {}", name, e))?;
            drop(threads);

            let mut roots: Vec<IntermediatePost> = roots.into_iter().map(into_post).collect();
            roots.sort_by_key(|p| p.create_at);
            debug!("Channel {}: {} threads changed", name, roots.len());
            self.intermediate.posts.extend(roots);
        }

        Ok(())
    }

    fn transform_channel_posts(
        &mut self,
        config: &TransformConfig,
        export: &SlackExport,
        posts: &[SlackPost],
        channel: &IntermediateChannel,
        threads: &mut dyn ThreadStore,
    ) -> Result<Vec<crate::store::SharedPost>> {
        let mut sorted: Vec<&SlackPost> = posts.iter().collect();
        sorted.sort_by_key(|p| p.sort_key());

        let mut ledger = TimestampLedger::new();
        for post in sorted {
            let Some(new_post) = self.build_post(config, export, post, channel)? else {
                self.stats.skipped += 1;
                continue;
            };
            let placement = add_post_to_threads(
                post,
                new_post,
                threads,
                channel,
                &mut ledger,
                config.import_workflow_messages,
            )?;
            self.stats.record(placement);
        }

        let changed = threads.changed_threads();
        threads.flush()?;
        Ok(changed)
    }

    /// Converts one message, or returns `None` when it is not imported.
    fn build_post(
        &mut self,
        config: &TransformConfig,
        export: &SlackExport,
        post: &SlackPost,
        channel: &IntermediateChannel,
    ) -> Result<Option<IntermediatePost>> {
        let kind = post.kind();
        if !kind.is_importable() {
            if kind == MessageKind::Unsupported {
                warn!(
                    "Unable to import the message as its type is not supported. type={} subtype={}",
                    post.post_type, post.subtype
                );
            } else {
                debug!("Skipping {} message {}", post.subtype, post.timestamp);
            }
            return Ok(None);
        }

        let new_post = match kind {
            MessageKind::Plain => {
                let Some(author) = self.author_of(&post.user, post) else {
                    return Ok(None);
                };
                let new_post = IntermediatePost::new(author, &channel.name, &post.text, post.create_at());
                return self.with_extras(config, export, post, new_post);
            }
            MessageKind::Bot => {
                if !config.import_workflow_messages {
                    debug!("Skipping bot message {} in channel {}", post.timestamp, channel.name);
                    return Ok(None);
                }
                let author = self.select_or_create_workflow_user();
                let new_post = IntermediatePost::new(author, &channel.name, &post.text, post.create_at());
                return self.with_extras(config, export, post, new_post);
            }
            MessageKind::FileComment => {
                let Some(comment) = &post.comment else {
                    warn!("File comment without comment data in channel {}", channel.name);
                    return Ok(None);
                };
                let Some(author) = self.author_of(&comment.user, post) else {
                    return Ok(None);
                };
                IntermediatePost::new(author, &channel.name, &comment.comment, post.create_at())
            }
            MessageKind::ChannelTopic | MessageKind::ChannelPurpose | MessageKind::ChannelName => {
                let Some(author) = self.author_of(&post.user, post) else {
                    return Ok(None);
                };
                IntermediatePost::new(author, &channel.name, &post.text, post.create_at())
            }
            MessageKind::JoinLeave | MessageKind::Me | MessageKind::Unsupported => return Ok(None),
        };

        Ok(Some(new_post))
    }

    fn author_of(&self, user_id: &str, post: &SlackPost) -> Option<String> {
        if user_id.is_empty() {
            warn!("Unable to import the message as the user field is missing (ts={})", post.timestamp);
            return None;
        }
        match self.intermediate.users_by_id.get(user_id) {
            Some(user) => Some(user.username.clone()),
            None => {
                warn!(
                    "Unable to add the message as the Slack user {} does not exist in Mattermost (ts={})",
                    user_id, post.timestamp
                );
                None
            }
        }
    }

    /// Attaches props and files; drops the post when its props are oversized
    /// and `discard_invalid_props` is set.
    fn with_extras(
        &mut self,
        config: &TransformConfig,
        export: &SlackExport,
        post: &SlackPost,
        mut new_post: IntermediatePost,
    ) -> Result<Option<IntermediatePost>> {
        if !post.attachments.is_empty() {
            let mut props = Map::new();
            props.insert("attachments".to_string(), Value::Array(post.attachments.clone()));
            let runes = serde_json::to_string(&props)?.chars().count();

            if runes <= config.max_props_runes {
                new_post.props = props;
            } else if config.discard_invalid_props {
                warn!(
                    "Unable import post as props exceed the maximum length ({} > {}). Skipping as --discard-invalid-props is set (ts={})",
                    runes, config.max_props_runes, post.timestamp
                );
                return Ok(None);
            } else {
                warn!(
                    "Unable to add props to post as they exceed the maximum length ({} > {}). Importing without props (ts={})",
                    runes, config.max_props_runes, post.timestamp
                );
            }
        }

        if !config.skip_attachments {
            new_post.attachments = self.copy_files(config, &export.uploads, post)?;
        }

        Ok(Some(new_post))
    }

    fn copy_files(
        &self,
        config: &TransformConfig,
        uploads: &Uploads,
        post: &SlackPost,
    ) -> Result<Vec<String>> {
        let mut copied = Vec::new();
        let mut seen = HashSet::new();
        for file in post.attached_files() {
            if !seen.insert(file.id.as_str()) {
                continue;
            }
            if let Some(path) = copy_attachment(file, uploads, &config.attachments_dir)? {
                copied.push(path);
            }
        }
        Ok(copied)
    }
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}
