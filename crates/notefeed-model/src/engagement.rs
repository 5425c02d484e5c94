//! Engagement categories and snapshots

use crate::filter::Filter;
use crate::item::kinds;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// One engagement category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementCategory {
    /// Reactions
    Reaction,
    /// Replies
    Comment,
    /// Payment receipts
    Zap,
}

impl EngagementCategory {
    /// All categories in display order
    pub const ALL: [Self; 3] = [Self::Reaction, Self::Comment, Self::Zap];

    /// Item kind counted by this category
    #[inline]
    #[must_use]
    pub const fn kind(self) -> u32 {
        match self {
            Self::Reaction => kinds::REACTION,
            Self::Comment => kinds::TEXT_NOTE,
            Self::Zap => kinds::ZAP_RECEIPT,
        }
    }

    /// Filter selecting this category's items for `target_id`
    #[must_use]
    pub fn filter(self, target_id: &str, limit: usize) -> Filter {
        Filter::new()
            .kinds([self.kind()])
            .referencing(target_id)
            .limit(limit)
    }
}

impl Display for EngagementCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reaction => "reaction",
            Self::Comment => "comment",
            Self::Zap => "zap",
        })
    }
}

/// Aggregate engagement counts for one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    pub reaction_count: u64,
    pub comment_count: u64,
    pub zap_count: u64,
}

impl EngagementSnapshot {
    /// Snapshot with explicit counts
    #[inline]
    #[must_use]
    pub const fn new(reaction_count: u64, comment_count: u64, zap_count: u64) -> Self {
        Self {
            reaction_count,
            comment_count,
            zap_count,
        }
    }

    /// Count for one category
    #[inline]
    #[must_use]
    pub const fn get(&self, category: EngagementCategory) -> u64 {
        match category {
            EngagementCategory::Reaction => self.reaction_count,
            EngagementCategory::Comment => self.comment_count,
            EngagementCategory::Zap => self.zap_count,
        }
    }

    /// Overwrite one category's slot
    #[inline]
    pub fn set(&mut self, category: EngagementCategory, count: u64) {
        match category {
            EngagementCategory::Reaction => self.reaction_count = count,
            EngagementCategory::Comment => self.comment_count = count,
            EngagementCategory::Zap => self.zap_count = count,
        }
    }

    /// Sum across categories
    #[inline]
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.reaction_count + self.comment_count + self.zap_count
    }
}
