//! Mattermost bulk-import writer.
//!
//! One JSON object per line, in the order the importer needs them:
//! version, channels, users, direct channels, then posts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::models::{Intermediate, IntermediateChannel, IntermediatePost, IntermediateUser};
use crate::error::Result;

const BULK_IMPORT_VERSION: u32 = 1;

/// One line of the import file.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Line<'a> {
    Version { version: u32 },
    Channel { channel: ChannelLine<'a> },
    User { user: UserLine<'a> },
    DirectChannel { direct_channel: DirectChannelLine<'a> },
    Post { post: PostLine<'a> },
    DirectPost { direct_post: DirectPostLine<'a> },
}

#[derive(Serialize)]
struct ChannelLine<'a> {
    team: &'a str,
    name: &'a str,
    display_name: &'a str,
    #[serde(rename = "type")]
    channel_type: &'a str,
    header: &'a str,
    purpose: &'a str,
}

#[derive(Serialize)]
struct UserLine<'a> {
    username: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    auth_service: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_data: Option<&'a str>,
    #[serde(skip_serializing_if = "is_blank")]
    password: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    position: &'a str,
    roles: &'static str,
    teams: Vec<TeamLine<'a>>,
}

#[derive(Serialize)]
struct TeamLine<'a> {
    name: &'a str,
    roles: &'static str,
    channels: Vec<MembershipLine<'a>>,
}

#[derive(Serialize)]
struct MembershipLine<'a> {
    name: &'a str,
    roles: &'static str,
}

#[derive(Serialize)]
struct DirectChannelLine<'a> {
    members: &'a [String],
    header: &'a str,
}

#[derive(Serialize)]
struct PostLine<'a> {
    team: &'a str,
    channel: &'a str,
    #[serde(flatten)]
    body: PostBody<'a>,
}

#[derive(Serialize)]
struct DirectPostLine<'a> {
    channel_members: &'a [String],
    #[serde(flatten)]
    body: PostBody<'a>,
}

/// Fields shared by posts, direct posts and replies.
#[derive(Serialize)]
struct PostBody<'a> {
    user: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    props: Option<&'a Map<String, Value>>,
    create_at: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentLine<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    replies: Vec<PostBody<'a>>,
}

#[derive(Serialize)]
struct AttachmentLine<'a> {
    path: &'a str,
}

fn is_blank(s: &&str) -> bool {
    s.is_empty()
}

impl<'a> PostBody<'a> {
    fn from_post(post: &'a IntermediatePost) -> Self {
        Self {
            user: &post.user,
            message: &post.message,
            props: (!post.props.is_empty()).then_some(&post.props),
            create_at: post.create_at,
            attachments: post
                .attachments
                .iter()
                .map(|path| AttachmentLine { path })
                .collect(),
            replies: post.replies.iter().map(PostBody::from_post).collect(),
        }
    }
}

fn channel_line<'a>(channel: &'a IntermediateChannel, team: &'a str) -> Line<'a> {
    Line::Channel {
        channel: ChannelLine {
            team,
            name: &channel.name,
            display_name: &channel.display_name,
            channel_type: channel.channel_type.code(),
            header: &channel.header,
            purpose: &channel.purpose,
        },
    }
}

fn user_line<'a>(user: &'a IntermediateUser, team: &'a str) -> Line<'a> {
    Line::User {
        user: UserLine {
            username: &user.username,
            email: &user.email,
            auth_service: &user.auth_service,
            auth_data: user.auth_data.as_deref(),
            password: &user.password,
            first_name: &user.first_name,
            last_name: &user.last_name,
            position: &user.position,
            roles: "system_user",
            teams: vec![TeamLine {
                name: team,
                roles: "team_user",
                channels: user
                    .memberships
                    .iter()
                    .map(|name| MembershipLine {
                        name,
                        roles: "channel_user",
                    })
                    .collect(),
            }],
        },
    }
}

fn post_line<'a>(post: &'a IntermediatePost, team: &'a str) -> Line<'a> {
    let body = PostBody::from_post(post);
    if post.is_direct {
        Line::DirectPost {
            direct_post: DirectPostLine {
                channel_members: &post.channel_members,
                body,
            },
        }
    } else {
        Line::Post {
            post: PostLine {
                team,
                channel: &post.channel,
                body,
            },
        }
    }
}

fn write_lines<W: Write>(intermediate: &Intermediate, team: &str, writer: &mut W) -> Result<()> {
    let mut emit = |line: &Line<'_>| -> Result<()> {
        serde_json::to_writer(&mut *writer, line)?;
        writeln!(writer)?;
        Ok(())
    };

    emit(&Line::Version {
        version: BULK_IMPORT_VERSION,
    })?;

    for channel in intermediate
        .public_channels
        .iter()
        .chain(&intermediate.private_channels)
    {
        emit(&channel_line(channel, team))?;
    }

    for user in intermediate.users_by_id.values() {
        emit(&user_line(user, team))?;
    }

    for channel in intermediate
        .group_channels
        .iter()
        .chain(&intermediate.direct_channels)
    {
        emit(&Line::DirectChannel {
            direct_channel: DirectChannelLine {
                members: &channel.members_usernames,
                header: &channel.header,
            },
        })?;
    }

    for post in &intermediate.posts {
        emit(&post_line(post, team))?;
    }

    Ok(())
}

/// Writes the intermediate model as a Mattermost bulk-import file.
pub fn write_bulk_import(
    intermediate: &Intermediate,
    team: &str,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);

    write_lines(intermediate, team, &mut writer)?;

    writer.flush()?;
    info!(
        "Wrote {} channels, {} users and {} posts to {}",
        intermediate.channels().count(),
        intermediate.users_by_id.len(),
        intermediate.post_count(),
        output_path.display()
    );
    Ok(())
}

/// Renders the bulk-import file into a string.
pub fn to_bulk_import(intermediate: &Intermediate, team: &str) -> Result<String> {
    let mut buffer = Vec::new();
    write_lines(intermediate, team, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ChannelType;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn lines(intermediate: &Intermediate) -> Vec<Value> {
        to_bulk_import(intermediate, "team")
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn sample() -> Intermediate {
        let mut intermediate = Intermediate::default();
        intermediate.public_channels.push(IntermediateChannel {
            name: "general".into(),
            display_name: "General".into(),
            header: "topic".into(),
            channel_type: ChannelType::Open,
            ..IntermediateChannel::default()
        });
        intermediate.direct_channels.push(IntermediateChannel {
            members_usernames: vec!["alice".into(), "bob".into()],
            channel_type: ChannelType::Direct,
            ..IntermediateChannel::default()
        });
        intermediate.users_by_id.insert(
            "U1".into(),
            IntermediateUser {
                id: "U1".into(),
                username: "alice".into(),
                email: "alice@corp.test".into(),
                memberships: vec!["general".into()],
                ..IntermediateUser::default()
            },
        );
        intermediate
    }

    #[test]
    fn test_line_order_and_types() {
        let mut intermediate = sample();
        intermediate
            .posts
            .push(IntermediatePost::new("alice", "general", "hello", 1000));

        let types: Vec<String> = lines(&intermediate)
            .iter()
            .map(|l| l["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(types, vec!["version", "channel", "user", "direct_channel", "post"]);
    }

    #[test]
    fn test_channel_and_user_lines() {
        let all = lines(&sample());

        assert_eq!(all[0]["version"], 1);
        assert_eq!(all[1]["channel"]["team"], "team");
        assert_eq!(all[1]["channel"]["type"], "O");
        assert_eq!(all[1]["channel"]["header"], "topic");

        let user = &all[2]["user"];
        assert_eq!(user["username"], "alice");
        assert_eq!(user["teams"][0]["name"], "team");
        assert_eq!(user["teams"][0]["channels"][0]["name"], "general");
        assert!(user.get("auth_data").is_none());
        assert!(user.get("password").is_none());

        assert_eq!(all[3]["direct_channel"]["members"], json!(["alice", "bob"]));
    }

    #[test]
    fn test_post_with_replies_and_attachments() {
        let mut root = IntermediatePost::new("alice", "general", "root", 1000);
        root.attachments.push("/files/F1_a.png".into());
        root.replies.push(IntermediatePost::new("bob", "general", "reply", 2000));

        let mut intermediate = Intermediate::default();
        intermediate.posts.push(root);

        let all = lines(&intermediate);
        let post = &all[1]["post"];
        assert_eq!(post["team"], "team");
        assert_eq!(post["channel"], "general");
        assert_eq!(post["attachments"][0]["path"], "/files/F1_a.png");
        assert_eq!(post["replies"][0]["message"], "reply");
        assert_eq!(post["replies"][0]["create_at"], 2000);
        assert!(post.get("props").is_none());
    }

    #[test]
    fn test_direct_post() {
        let mut post = IntermediatePost::new("alice", "", "hey", 1000);
        post.is_direct = true;
        post.channel_members = vec!["alice".into(), "bob".into()];
        post.props.insert("attachments".into(), json!([{"text": "card"}]));

        let mut intermediate = Intermediate::default();
        intermediate.posts.push(post);

        let all = lines(&intermediate);
        assert_eq!(all[1]["type"], "direct_post");
        let direct = &all[1]["direct_post"];
        assert_eq!(direct["channel_members"], json!(["alice", "bob"]));
        assert_eq!(direct["props"]["attachments"][0]["text"], "card");
        assert!(direct.get("team").is_none());
    }

    #[test]
    fn test_write_bulk_import_file() {
        let temp_file = NamedTempFile::new().unwrap();
        write_bulk_import(&sample(), "team", temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.ends_with('\n'));
    }
}
