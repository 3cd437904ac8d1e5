//! Implicit parallel detection by date-range overlap.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::InsightError;
use crate::hierarchy::{check_range, parse_date, HierarchyNode, TimelineLayer};
use crate::store::{NodeRecord, NodeStore};

/// Stand-in for an open end date when comparing ranges. Never returned.
pub fn far_future() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// A half-open date range `[start, end)`; `end` of `None` is ongoing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn of_node(node: &HierarchyNode) -> Self {
        Self::new(node.start_date, node.end_date)
    }

    /// Parse a stored record, rejecting malformed dates and inverted ranges.
    pub fn from_record(record: &NodeRecord) -> Result<Self, InsightError> {
        let start = parse_date(&record.start_date)?;
        let end = record.end_date.as_deref().map(parse_date).transpose()?;
        check_range(&record.id, start, end)?;
        Ok(Self { start, end })
    }

    /// End used for comparisons, substituting the far-future sentinel.
    pub fn effective_end(&self) -> NaiveDate {
        self.end.unwrap_or_else(far_future)
    }
}

/// Half-open overlap: `a.start < b.end && a.end > b.start`.
/// Ranges that only touch do not overlap.
pub fn ranges_overlap(a: &DateRange, b: &DateRange) -> bool {
    a.start < b.effective_end() && a.effective_end() > b.start
}

/// Intersection of two overlapping ranges. The end is `None` when both
/// ranges are ongoing.
pub fn overlap_window(a: &DateRange, b: &DateRange) -> Option<DateRange> {
    if !ranges_overlap(a, b) {
        return None;
    }
    let start = a.start.max(b.start);
    let end = a.effective_end().min(b.effective_end());
    let end = (end != far_future()).then_some(end);
    Some(DateRange { start, end })
}

/// Another saga/arc whose dates intersect the query node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelNode {
    pub node_id: String,
    pub node_layer: TimelineLayer,
    pub overlap_start: NaiveDate,
    pub overlap_end: Option<NaiveDate>,
}

/// Resolves incidental overlaps against the node store.
pub struct OverlapResolver {
    nodes: Arc<dyn NodeStore>,
}

impl OverlapResolver {
    pub fn new(nodes: Arc<dyn NodeStore>) -> Self {
        Self { nodes }
    }

    /// Saga and arc nodes whose ranges overlap `node`.
    ///
    /// The store applies a coarse pre-filter; the exact half-open check and
    /// the overlap window are computed here. A candidate is skipped only when
    /// both its id and layer match the query node.
    pub async fn find_overlapping_nodes(
        &self,
        user_id: &str,
        node: &HierarchyNode,
    ) -> Result<Vec<ParallelNode>, InsightError> {
        let target = DateRange::of_node(node);
        let upper = target.effective_end();
        let lower = Some(node.start_date);

        let (sagas, arcs) = tokio::try_join!(
            self.nodes
                .query_candidate_containers(user_id, TimelineLayer::Saga, upper, lower),
            self.nodes
                .query_candidate_containers(user_id, TimelineLayer::Arc, upper, lower),
        )?;

        let candidates = sagas
            .into_iter()
            .map(|r| (TimelineLayer::Saga, r))
            .chain(arcs.into_iter().map(|r| (TimelineLayer::Arc, r)));

        let mut parallels = Vec::new();
        for (layer, record) in candidates {
            if record.id == node.id && layer == node.layer {
                continue;
            }
            let range = DateRange::from_record(&record)?;
            if let Some(window) = overlap_window(&target, &range) {
                parallels.push(ParallelNode {
                    node_id: record.id,
                    node_layer: layer,
                    overlap_start: window.start,
                    overlap_end: window.end,
                });
            }
        }

        parallels.sort_by(|a, b| {
            a.overlap_start
                .cmp(&b.overlap_start)
                .then_with(|| a.node_layer.cmp(&b.node_layer))
                .then_with(|| a.node_id.cmp(&b.node_id))
        });

        tracing::debug!(
            user_id,
            node_id = %node.id,
            layer = %node.layer,
            count = parallels.len(),
            "resolved implicit parallels"
        );
        Ok(parallels)
    }
}
