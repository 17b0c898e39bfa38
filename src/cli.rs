//! Command-line interface definition using clap.
//!
//! This module defines [`Args`], the flags of the `slack2mm` binary, and
//! their conversion into a [`TransformConfig`].
//!
//! ```rust
//! use clap::Parser;
//! use slack2mm::cli::Args;
//!
//! let args = Args::parse_from(["slack2mm", "--team", "myteam", "--file", "export"]);
//! let config = args.to_config();
//! assert!(config.redis.is_none());
//! ```

use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::{LevelFilter, info};

use crate::config::{RedisConfig, TransformConfig};
use crate::error::{MigrateError, Result};

/// Convert a Slack export into a Mattermost bulk-import file.
#[derive(Parser, Debug, Clone)]
#[command(name = "slack2mm")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    slack2mm --team myteam --file slack-export.zip
    slack2mm -t myteam -f slack-export -o import.jsonl --skip-attachments
    slack2mm -t myteam -f slack-export --redis-endpoint localhost:6379")]
pub struct Args {
    /// Name of the destination team
    #[arg(short, long)]
    pub team: String,

    /// Slack export: the zip file or its unpacked directory
    #[arg(short, long)]
    pub file: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "bulk-export.jsonl")]
    pub output: PathBuf,

    /// Directory where attachments are copied to
    #[arg(short = 'd', long, default_value = "bulk-export-attachments")]
    pub attachments_dir: PathBuf,

    /// Skip copying the attachments from the export
    #[arg(short = 'a', long)]
    pub skip_attachments: bool,

    /// Skip messages whose props are too long instead of importing them without props
    #[arg(short = 'p', long)]
    pub discard_invalid_props: bool,

    /// Print debug log messages
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub debug: bool,

    /// Use the user email as their auth data
    #[arg(long)]
    pub auth_data_as_email: bool,

    /// Auth service used together with --auth-data-as-email
    #[arg(short = 's', long)]
    pub auth_service: Option<String>,

    /// Redis endpoint; enables the redis thread store
    #[arg(long, value_name = "HOST:PORT")]
    pub redis_endpoint: Option<String>,

    /// Redis login
    #[arg(long)]
    pub redis_login: Option<String>,

    /// Redis password
    #[arg(long)]
    pub redis_password: Option<String>,

    /// Import bot and workflow messages as the "imported-workflow" user
    #[arg(long)]
    pub import_workflow_messages: bool,

    /// Do not import posts
    #[arg(long)]
    pub skip_posts: bool,

    /// Do not import channels and posts
    #[arg(long)]
    pub skip_channels: bool,
}

impl Args {
    /// Builds the transformation settings from the flags.
    pub fn to_config(&self) -> TransformConfig {
        let mut config = TransformConfig::new()
            .with_attachments_dir(self.attachments_dir.clone())
            .with_skip_attachments(self.skip_attachments)
            .with_discard_invalid_props(self.discard_invalid_props)
            .with_import_workflow_messages(self.import_workflow_messages)
            .with_skip_posts(self.skip_posts)
            .with_skip_channels(self.skip_channels);
        config.auth_data_as_email = self.auth_data_as_email;
        config.auth_service = self.auth_service.clone();

        if let Some(endpoint) = &self.redis_endpoint {
            let mut redis = RedisConfig::new(endpoint);
            redis.login = self.redis_login.clone();
            redis.password = self.redis_password.clone();
            config = config.with_redis(redis);
        }

        config
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }

    /// Checks the output paths before any work starts.
    ///
    /// The attachments directory is created when missing, unless
    /// attachments are skipped.
    pub fn prepare_paths(&self) -> Result<()> {
        if self.output.is_dir() {
            return Err(MigrateError::invalid_config(format!(
                "output file '{}' is a directory",
                self.output.display()
            )));
        }

        if self.skip_attachments {
            return Ok(());
        }
        if !self.attachments_dir.exists() {
            fs::create_dir_all(&self.attachments_dir)?;
            info!("Created attachments directory {}", self.attachments_dir.display());
        } else if !self.attachments_dir.is_dir() {
            return Err(MigrateError::invalid_config(format!(
                "attachments path '{}' is not a directory",
                self.attachments_dir.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["slack2mm", "--team", "myteam", "--file", "export"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.output, PathBuf::from("bulk-export.jsonl"));
        assert_eq!(args.attachments_dir, PathBuf::from("bulk-export-attachments"));
        assert!(args.debug);
        assert_eq!(args.log_level(), LevelFilter::Debug);

        let config = args.to_config();
        assert!(!config.skip_attachments);
        assert!(config.redis.is_none());
        assert!(config.effective_auth_service().is_none());
    }

    #[test]
    fn test_debug_can_be_disabled() {
        let args = parse(&["--debug", "false"]);
        assert!(!args.debug);
        assert_eq!(args.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn test_short_flags() {
        let args = parse(&["-a", "-p", "-s", "gitlab", "--auth-data-as-email"]);
        let config = args.to_config();
        assert!(config.skip_attachments);
        assert!(config.discard_invalid_props);
        assert_eq!(config.effective_auth_service(), Some("gitlab"));
    }

    #[test]
    fn test_redis_flags() {
        let args = parse(&[
            "--redis-endpoint",
            "localhost:6379",
            "--redis-login",
            "user",
            "--redis-password",
            "secret",
        ]);
        let redis = args.to_config().redis.unwrap();
        assert_eq!(redis.endpoint, "localhost:6379");
        assert_eq!(redis.login.as_deref(), Some("user"));
        assert_eq!(redis.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_team_is_required() {
        assert!(Args::try_parse_from(["slack2mm", "--file", "export"]).is_err());
    }

    #[test]
    fn test_prepare_paths_creates_attachments_dir() {
        let dir = tempdir().unwrap();
        let attachments = dir.path().join("files");
        let mut args = parse(&[]);
        args.output = dir.path().join("out.jsonl");
        args.attachments_dir = attachments.clone();

        args.prepare_paths().unwrap();
        assert!(attachments.is_dir());
    }

    #[test]
    fn test_prepare_paths_rejects_directory_output() {
        let dir = tempdir().unwrap();
        let mut args = parse(&["-a"]);
        args.output = dir.path().to_path_buf();

        let err = args.prepare_paths().unwrap_err();
        assert!(err.is_invalid_config());
    }
}
