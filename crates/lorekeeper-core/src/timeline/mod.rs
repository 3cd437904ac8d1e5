//! Timeline insight engine.
//!
//! This module provides:
//! - Hierarchy gap detection inside container nodes
//! - Implicit parallel detection by date overlap
//! - Explicit parallel resolution from declared relations
//! - Composition of both into a per-request insight

mod gap;
mod insight;
mod overlap;
mod relations;

pub use gap::{
    classify_gap_size, detect_hierarchy_gaps, gap_duration_days, GapReason, GapSize,
    HierarchyGap, MEDIUM_GAP_MAX_DAYS, SHORT_GAP_MAX_DAYS,
};
pub use insight::{
    ChatContextExtension, InsightComposer, ParallelContext, ParallelSummary,
    TimelineContextInsight,
};
pub use overlap::{far_future, overlap_window, ranges_overlap, DateRange, OverlapResolver, ParallelNode};
pub use relations::{ExplicitRelationResolver, ParallelRelationRef};
