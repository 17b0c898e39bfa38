//! Counters for a conversion run.

use log::info;

use super::threading::Placement;

/// What happened to the messages of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub channels: usize,
    pub roots: usize,
    pub replies: usize,
    /// Replies dropped because their root was never seen
    pub orphan_replies: usize,
    /// Roots that replaced an existing root with the same identifier
    pub overwritten_roots: usize,
    /// Messages dropped before thread assembly (unknown author, type not
    /// imported, oversized props, workflow messages disabled)
    pub skipped: usize,
}

impl TransformStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one thread-assembly outcome.
    pub fn record(&mut self, placement: Placement) {
        match placement {
            Placement::Root => self.roots += 1,
            Placement::OverwroteRoot => {
                self.roots += 1;
                self.overwritten_roots += 1;
            }
            Placement::Reply => self.replies += 1,
            Placement::OrphanReply => self.orphan_replies += 1,
            Placement::WorkflowReplySkipped => self.skipped += 1,
        }
    }

    pub fn imported(&self) -> usize {
        self.roots + self.replies
    }

    /// Share of messages that made it into the import, in percent.
    pub fn import_ratio(&self) -> f64 {
        let seen = self.imported() + self.orphan_replies + self.skipped;
        if seen == 0 {
            return 0.0;
        }
        self.imported() as f64 / seen as f64 * 100.0
    }

    pub fn log_summary(&self) {
        info!(
            "Transformed {} channels: {} roots, {} replies ({:.1}% of messages imported)",
            self.channels,
            self.roots,
            self.replies,
            self.import_ratio()
        );
        if self.orphan_replies > 0 || self.overwritten_roots > 0 || self.skipped > 0 {
            info!(
                "{} orphan replies dropped, {} roots overwritten, {} messages skipped",
                self.orphan_replies, self.overwritten_roots, self.skipped
            );
        }
    }
}
