//! Hierarchy gap detection inside container nodes.
//!
//! Finds the spans of a container (era, saga, arc) that none of its
//! children cover.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::hierarchy::{ChildNode, HierarchyNode, TimelineLayer};

/// Gaps shorter than this many days are [`GapSize::Short`].
///
/// Shared with the void-awareness signals; keep both in step.
pub const SHORT_GAP_MAX_DAYS: i64 = 30;

/// Gaps shorter than this many days (and not short) are [`GapSize::Medium`].
pub const MEDIUM_GAP_MAX_DAYS: i64 = 180;

/// Size category of a hierarchy gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSize {
    Short,  // < 30 days
    Medium, // 30-179 days
    Long,   // 180+ days
}

impl GapSize {
    /// Categorize a gap by its duration in days
    pub fn from_days(days: i64) -> Self {
        if days < SHORT_GAP_MAX_DAYS {
            Self::Short
        } else if days < MEDIUM_GAP_MAX_DAYS {
            Self::Medium
        } else {
            Self::Long
        }
    }
}

/// Which structural case produced a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapReason {
    /// The container has no children at all.
    NoChildren,
    /// Uncovered time between the container start and its first child.
    BeforeFirstChild,
    /// Uncovered time between two children.
    BetweenChildren,
    /// Uncovered time between the last covered day and the container end.
    AfterLastChild,
}

/// Days between two calendar dates. Dates carry no time of day, so this is
/// already the ceiling of the elapsed duration.
pub fn gap_duration_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Classify the span `[start, end]` by its length in days.
pub fn classify_gap_size(start: NaiveDate, end: NaiveDate) -> GapSize {
    GapSize::from_days(gap_duration_days(start, end))
}

/// An uncovered span inside a container node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyGap {
    pub parent_node_id: String,
    pub parent_layer: TimelineLayer,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub duration_days: i64,
    pub size: GapSize,
    pub reason: GapReason,
}

impl HierarchyGap {
    /// Create a gap; `None` for zero-width or inverted spans.
    pub fn new(
        parent: &HierarchyNode,
        start: NaiveDate,
        end: NaiveDate,
        reason: GapReason,
    ) -> Option<Self> {
        if start >= end {
            return None;
        }
        Some(Self {
            parent_node_id: parent.id.clone(),
            parent_layer: parent.layer,
            start,
            end,
            duration_days: gap_duration_days(start, end),
            size: classify_gap_size(start, end),
            reason,
        })
    }
}

/// Find the uncovered spans of `parent` given its direct children.
///
/// Children are ordered by start date, then id. An ongoing child covers only
/// its start day. Without an end date the parent has no upper bound, so no
/// trailing gap is reported.
pub fn detect_hierarchy_gaps(parent: &HierarchyNode, children: &[ChildNode]) -> Vec<HierarchyGap> {
    let mut gaps = Vec::new();

    if children.is_empty() {
        if let Some(end) = parent.end_date {
            gaps.extend(HierarchyGap::new(parent, parent.start_date, end, GapReason::NoChildren));
        }
        return gaps;
    }

    let mut sorted: Vec<&ChildNode> = children.iter().collect();
    sorted.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    // Clamp a gap end to the parent's end when it has one
    let bound = |date: NaiveDate| match parent.end_date {
        Some(end) => date.min(end),
        None => date,
    };

    let first = sorted[0];
    if first.start_date > parent.start_date {
        gaps.extend(HierarchyGap::new(
            parent,
            parent.start_date,
            bound(first.start_date),
            GapReason::BeforeFirstChild,
        ));
    }

    // Coverage before the parent starts does not count.
    let mut covered_until = first.effective_end().max(parent.start_date);
    for child in &sorted[1..] {
        if child.start_date > covered_until {
            gaps.extend(HierarchyGap::new(
                parent,
                covered_until,
                bound(child.start_date),
                GapReason::BetweenChildren,
            ));
        }
        covered_until = covered_until.max(child.effective_end());
    }

    if let Some(end) = parent.end_date {
        if end > covered_until {
            gaps.extend(HierarchyGap::new(
                parent,
                covered_until.max(parent.start_date),
                end,
                GapReason::AfterLastChild,
            ));
        }
    }

    gaps
}
