//! Thread assembly: classifying a channel's messages into roots and replies.
//!
//! Messages arrive sorted by time but not grouped by thread. Each one is
//! either a new root (stored in the [`ThreadStore`]) or a reply appended to
//! a root stored earlier.
//!
//! Threads are keyed by the root's original Slack `ts`, which is also what
//! a reply's `thread_ts` holds. Creation times must be unique within a
//! channel: [`TimestampLedger`] bumps colliding times by one millisecond
//! until they are free. The bumped value is only the emitted `create_at`.

use std::collections::HashSet;

use log::{error, warn};

use super::models::{IntermediateChannel, IntermediatePost};
use crate::error::Result;
use crate::parsing::slack::SlackPost;
use crate::store::ThreadStore;

/// Username of the synthesized author of bot and workflow messages.
pub const WORKFLOW_USER_NAME: &str = "imported-workflow";

/// Per-channel record of assigned creation times.
///
/// Lives for one channel and is dropped when the channel is done.
#[derive(Debug, Default)]
pub struct TimestampLedger {
    used: HashSet<i64>,
}

impl TimestampLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the smallest unused time `>= create_at` and marks it used.
    pub fn claim(&mut self, create_at: i64) -> i64 {
        let mut candidate = create_at;
        while self.used.contains(&candidate) {
            candidate += 1;
        }
        self.used.insert(candidate);
        candidate
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

/// Where a post ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Stored as a new root
    Root,
    /// Stored as a root, replacing an existing one with the same identifier
    OverwroteRoot,
    /// Appended to an existing root
    Reply,
    /// Dropped: the root it replies to is unknown
    OrphanReply,
    /// Dropped: replies to workflow posts are not imported
    WorkflowReplySkipped,
}

/// Adds `post`, built from `original`, to the channel's threads.
///
/// Direct and group posts are annotated with the channel members, the
/// creation time is made unique through `ledger`, and the post is then
/// stored as a root or appended to the root it replies to. Missing roots
/// and overwrites are logged, never fatal; only store failures are errors.
pub fn add_post_to_threads(
    original: &SlackPost,
    mut post: IntermediatePost,
    threads: &mut dyn ThreadStore,
    channel: &IntermediateChannel,
    ledger: &mut TimestampLedger,
    import_workflow_messages: bool,
) -> Result<Placement> {
    if channel.channel_type.is_direct() {
        post.is_direct = true;
        post.channel_members = channel.members_usernames.clone();
    } else {
        post.is_direct = false;
    }

    post.create_at = ledger.claim(post.create_at);
    post.sanitise();

    if original.is_reply() {
        let Some(root) = threads.lookup_thread(&original.thread_ts)? else {
            error!(
                "Couldn't find the root post {} of a reply in channel {} (ts={}, user={})",
                original.thread_ts, channel.name, original.timestamp, original.user
            );
            return Ok(Placement::OrphanReply);
        };

        let mut root = root.borrow_mut();
        if !import_workflow_messages && root.user == WORKFLOW_USER_NAME {
            return Ok(Placement::WorkflowReplySkipped);
        }
        root.replies.push(post);
        return Ok(Placement::Reply);
    }

    let thread_id = original.timestamp.as_str();
    let placement = if threads.has_thread(thread_id)? {
        warn!(
            "Overwriting root post for thread {} in channel {}",
            thread_id, channel.name
        );
        Placement::OverwroteRoot
    } else {
        Placement::Root
    };
    threads.store_thread(thread_id, post);
    Ok(placement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ChannelType;
    use crate::store::{CachedStore, MapBackend, MemoryStore};

    fn channel(channel_type: ChannelType) -> IntermediateChannel {
        IntermediateChannel {
            name: "general".into(),
            channel_type,
            members_usernames: vec!["alice".into(), "bob".into()],
            ..IntermediateChannel::default()
        }
    }

    fn slack(ts: &str, thread_ts: &str) -> SlackPost {
        SlackPost {
            post_type: "message".into(),
            user: "U1".into(),
            timestamp: ts.into(),
            thread_ts: thread_ts.into(),
            ..SlackPost::default()
        }
    }

    fn post_for(original: &SlackPost, message: &str) -> IntermediatePost {
        IntermediatePost::new("alice", "general", message, original.create_at())
    }

    fn add(
        original: &SlackPost,
        message: &str,
        store: &mut dyn ThreadStore,
        ledger: &mut TimestampLedger,
        channel: &IntermediateChannel,
    ) -> Placement {
        add_post_to_threads(original, post_for(original, message), store, channel, ledger, false)
            .unwrap()
    }

    // =========================================================================
    // TimestampLedger
    // =========================================================================

    #[test]
    fn test_ledger_claims_smallest_free_time() {
        let mut ledger = TimestampLedger::new();
        assert_eq!(ledger.claim(10), 10);
        assert_eq!(ledger.claim(10), 11);
        assert_eq!(ledger.claim(10), 12);
        assert_eq!(ledger.claim(11), 13);
        assert_eq!(ledger.claim(5), 5);
        assert_eq!(ledger.len(), 5);
    }

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn test_root_then_reply() {
        let mut store = MemoryStore::new();
        let mut ledger = TimestampLedger::new();
        let ch = channel(ChannelType::Open);

        let root = slack("10.000100", "10.000100");
        let reply = slack("15.000000", "10.000100");
        assert_eq!(add(&root, "root", &mut store, &mut ledger, &ch), Placement::Root);
        assert_eq!(add(&reply, "reply", &mut store, &mut ledger, &ch), Placement::Reply);

        let stored = store.lookup_thread("10.000100").unwrap().unwrap();
        assert_eq!(stored.borrow().create_at, 10_000);
        assert_eq!(stored.borrow().replies.len(), 1);
        assert_eq!(stored.borrow().replies[0].message, "reply");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_threadless_message_is_root() {
        let mut store = MemoryStore::new();
        let mut ledger = TimestampLedger::new();
        let ch = channel(ChannelType::Open);
        assert_eq!(add(&slack("20.0", ""), "m", &mut store, &mut ledger, &ch), Placement::Root);
        assert!(store.has_thread("20.0").unwrap());
    }

    #[test]
    fn test_orphan_reply_is_dropped() {
        let mut store = MemoryStore::new();
        let mut ledger = TimestampLedger::new();
        let ch = channel(ChannelType::Open);
        let reply = slack("15.0", "9.0");
        assert_eq!(add(&reply, "lost", &mut store, &mut ledger, &ch), Placement::OrphanReply);
        assert!(store.is_empty());
    }

    #[test]
    fn test_colliding_roots_get_distinct_times() {
        let mut store = MemoryStore::new();
        let mut ledger = TimestampLedger::new();
        let ch = channel(ChannelType::Open);

        assert_eq!(add(&slack("10.000100", ""), "first", &mut store, &mut ledger, &ch), Placement::Root);
        assert_eq!(add(&slack("10.000900", ""), "second", &mut store, &mut ledger, &ch), Placement::Root);
        assert_eq!(add(&slack("15.0", "10.000900"), "reply", &mut store, &mut ledger, &ch), Placement::Reply);

        let first = store.lookup_thread("10.000100").unwrap().unwrap();
        assert_eq!(first.borrow().message, "first");
        assert_eq!(first.borrow().create_at, 10_000);
        assert!(first.borrow().replies.is_empty());

        let second = store.lookup_thread("10.000900").unwrap().unwrap();
        assert_eq!(second.borrow().message, "second");
        assert_eq!(second.borrow().create_at, 10_001);
        assert_eq!(second.borrow().replies.len(), 1);
    }

    #[test]
    fn test_reply_to_missing_root_ignores_bumped_neighbour() {
        let mut store = MemoryStore::new();
        let mut ledger = TimestampLedger::new();
        let ch = channel(ChannelType::Open);

        add(&slack("9.999100", ""), "x", &mut store, &mut ledger, &ch);
        add(&slack("9.999200", ""), "y", &mut store, &mut ledger, &ch);
        // The bot root at 10.000000 was skipped and never stored.
        let reply = slack("10.500000", "10.000000");
        assert_eq!(add(&reply, "reply to bot", &mut store, &mut ledger, &ch), Placement::OrphanReply);

        let y = store.lookup_thread("9.999200").unwrap().unwrap();
        assert_eq!(y.borrow().create_at, 10_000);
        assert!(y.borrow().replies.is_empty());
    }

    #[test]
    fn test_reply_times_are_unique_too() {
        let mut store = MemoryStore::new();
        let mut ledger = TimestampLedger::new();
        let ch = channel(ChannelType::Open);

        add(&slack("10.0", ""), "root", &mut store, &mut ledger, &ch);
        add(&slack("10.0005", "10.0"), "r1", &mut store, &mut ledger, &ch);
        add(&slack("10.0009", "10.0"), "r2", &mut store, &mut ledger, &ch);

        let root = store.lookup_thread("10.0").unwrap().unwrap();
        let root = root.borrow();
        assert_eq!(root.create_at, 10_000);
        assert_eq!(root.replies[0].create_at, 10_001);
        assert_eq!(root.replies[1].create_at, 10_002);
    }

    #[test]
    fn test_overwrite_is_reported() {
        let mut store = MemoryStore::new();
        store.store_thread("30.0", IntermediatePost::new("x", "general", "from earlier run", 30_000));
        let mut ledger = TimestampLedger::new();
        let ch = channel(ChannelType::Open);

        let placement = add(&slack("30.0", ""), "new", &mut store, &mut ledger, &ch);
        assert_eq!(placement, Placement::OverwroteRoot);
        assert_eq!(store.lookup_thread("30.0").unwrap().unwrap().borrow().message, "new");
    }

    #[test]
    fn test_direct_posts_carry_members() {
        let mut store = MemoryStore::new();
        let mut ledger = TimestampLedger::new();
        let ch = channel(ChannelType::Direct);

        add(&slack("10.0", ""), "root", &mut store, &mut ledger, &ch);
        add(&slack("11.0", "10.0"), "reply", &mut store, &mut ledger, &ch);

        let root = store.lookup_thread("10.0").unwrap().unwrap();
        let root = root.borrow();
        assert!(root.is_direct);
        assert_eq!(root.channel_members, vec!["alice", "bob"]);
        assert!(root.replies[0].is_direct);
        assert_eq!(root.replies[0].channel_members, vec!["alice", "bob"]);
    }

    #[test]
    fn test_public_posts_are_not_direct() {
        let mut store = MemoryStore::new();
        let mut ledger = TimestampLedger::new();
        add(&slack("10.0", ""), "root", &mut store, &mut ledger, &channel(ChannelType::Open));
        let root = store.lookup_thread("10.0").unwrap().unwrap();
        assert!(!root.borrow().is_direct);
        assert!(root.borrow().channel_members.is_empty());
    }

    #[test]
    fn test_replies_to_workflow_posts_skipped_unless_enabled() {
        let mut store = MemoryStore::new();
        let mut ledger = TimestampLedger::new();
        let ch = channel(ChannelType::Open);

        let root = slack("10.0", "");
        let workflow_root = IntermediatePost::new(WORKFLOW_USER_NAME, "general", "bot", root.create_at());
        add_post_to_threads(&root, workflow_root, &mut store, &ch, &mut ledger, true).unwrap();

        let reply = slack("11.0", "10.0");
        let placement =
            add_post_to_threads(&reply, post_for(&reply, "r"), &mut store, &ch, &mut ledger, false).unwrap();
        assert_eq!(placement, Placement::WorkflowReplySkipped);

        let reply = slack("12.0", "10.0");
        let placement =
            add_post_to_threads(&reply, post_for(&reply, "r"), &mut store, &ch, &mut ledger, true).unwrap();
        assert_eq!(placement, Placement::Reply);
    }

    #[test]
    fn test_reply_to_root_from_previous_run() {
        let backend = MapBackend::new();
        let ch = channel(ChannelType::Open);

        let mut first = CachedStore::new(backend.clone(), "general");
        let mut ledger = TimestampLedger::new();
        add(&slack("10.0", ""), "root", &mut first, &mut ledger, &ch);
        first.flush().unwrap();

        let mut second = CachedStore::new(backend, "general");
        let mut ledger = TimestampLedger::new();
        let placement = add(&slack("11.0", "10.0"), "late reply", &mut second, &mut ledger, &ch);
        assert_eq!(placement, Placement::Reply);

        let changed = second.changed_threads();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].borrow().replies.len(), 1);
    }

    #[test]
    fn test_reply_to_bumped_root_from_previous_run() {
        let backend = MapBackend::new();
        let ch = channel(ChannelType::Open);

        let mut first = CachedStore::new(backend.clone(), "general");
        let mut ledger = TimestampLedger::new();
        add(&slack("10.000100", ""), "A", &mut first, &mut ledger, &ch);
        add(&slack("10.000200", ""), "B", &mut first, &mut ledger, &ch);
        first.flush().unwrap();

        let mut second = CachedStore::new(backend, "general");
        let mut ledger = TimestampLedger::new();
        let placement = add(&slack("12.0", "10.000200"), "reply to B", &mut second, &mut ledger, &ch);
        assert_eq!(placement, Placement::Reply);

        let changed = second.changed_threads();
        assert_eq!(changed.len(), 1);
        let root = changed[0].borrow();
        assert_eq!(root.message, "B");
        assert_eq!(root.create_at, 10_001);
        assert_eq!(root.replies[0].message, "reply to B");
    }
}
