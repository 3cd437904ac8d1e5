//! Timeline context insight composition.
//!
//! [`InsightComposer`] decides which analyses apply to a node's layer,
//! fetches the data they need, and merges the results. Nothing here is
//! persisted; every insight is built for one request and then dropped.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::gap::{detect_hierarchy_gaps, HierarchyGap};
use super::overlap::{OverlapResolver, ParallelNode};
use super::relations::{ExplicitRelationResolver, ParallelRelationRef};
use crate::error::InsightError;
use crate::hierarchy::{ChildNode, HierarchyNode, TimelineLayer};
use crate::store::{NodeStore, RelationStore};

/// Explicit and implicit parallels of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelContext {
    pub node_id: String,
    pub node_layer: TimelineLayer,
    pub explicit: Vec<ParallelRelationRef>,
    pub implicit: Vec<ParallelNode>,
}

impl ParallelContext {
    /// A fully shaped context with no parallels.
    pub fn empty(node: &HierarchyNode) -> Self {
        Self {
            node_id: node.id.clone(),
            node_layer: node.layer,
            explicit: Vec::new(),
            implicit: Vec::new(),
        }
    }
}

/// Gap and parallel insight for a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineContextInsight {
    pub hierarchy_gaps: Vec<HierarchyGap>,
    pub parallels: ParallelContext,
}

impl TimelineContextInsight {
    pub fn empty(node: &HierarchyNode) -> Self {
        Self {
            hierarchy_gaps: Vec::new(),
            parallels: ParallelContext::empty(node),
        }
    }
}

/// Parallel counts only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelSummary {
    pub explicit_count: usize,
    pub implicit_count: usize,
}

/// Compact projection of an insight for conversational context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContextExtension {
    pub hierarchy_gaps: Vec<HierarchyGap>,
    pub parallel_summary: ParallelSummary,
}

impl From<TimelineContextInsight> for ChatContextExtension {
    fn from(insight: TimelineContextInsight) -> Self {
        Self {
            parallel_summary: ParallelSummary {
                explicit_count: insight.parallels.explicit.len(),
                implicit_count: insight.parallels.implicit.len(),
            },
            hierarchy_gaps: insight.hierarchy_gaps,
        }
    }
}

/// Builds [`TimelineContextInsight`]s from injected stores.
pub struct InsightComposer {
    nodes: Arc<dyn NodeStore>,
    explicit: ExplicitRelationResolver,
    overlaps: OverlapResolver,
    timeout: Option<Duration>,
}

impl InsightComposer {
    pub fn new(nodes: Arc<dyn NodeStore>, relations: Arc<dyn RelationStore>) -> Self {
        Self {
            explicit: ExplicitRelationResolver::new(relations),
            overlaps: OverlapResolver::new(Arc::clone(&nodes)),
            nodes,
            timeout: None,
        }
    }

    /// Bound the guarded entry points; a timeout is handled like any other
    /// failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Gaps of a container node; empty for other layers.
    pub async fn hierarchy_gaps(
        &self,
        user_id: &str,
        node: &HierarchyNode,
    ) -> Result<Vec<HierarchyGap>, InsightError> {
        if !node.layer.is_container() {
            return Ok(Vec::new());
        }
        let records = self.nodes.get_children(user_id, node.layer, &node.id).await?;
        let children = records
            .into_iter()
            .map(ChildNode::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let gaps = detect_hierarchy_gaps(node, &children);
        tracing::debug!(
            user_id,
            node_id = %node.id,
            layer = %node.layer,
            children = children.len(),
            gaps = gaps.len(),
            "detected hierarchy gaps"
        );
        Ok(gaps)
    }

    /// Explicit and implicit parallels of a saga/arc; empty for other layers.
    pub async fn parallel_context(
        &self,
        user_id: &str,
        node: &HierarchyNode,
    ) -> Result<ParallelContext, InsightError> {
        if !node.layer.supports_parallels() {
            return Ok(ParallelContext::empty(node));
        }
        let (explicit, implicit) = tokio::try_join!(
            self.explicit.get_explicit_parallel_refs(user_id, node),
            self.overlaps.find_overlapping_nodes(user_id, node),
        )?;
        Ok(ParallelContext {
            node_id: node.id.clone(),
            node_layer: node.layer,
            explicit,
            implicit,
        })
    }

    /// Full insight for `node`. Fetch and parse failures propagate.
    pub async fn build_timeline_context_insight(
        &self,
        user_id: &str,
        node: &HierarchyNode,
    ) -> Result<TimelineContextInsight, InsightError> {
        let hierarchy_gaps = self.hierarchy_gaps(user_id, node).await?;
        let parallels = self.parallel_context(user_id, node).await?;
        Ok(TimelineContextInsight {
            hierarchy_gaps,
            parallels,
        })
    }

    /// Insight projected down to gap records and parallel counts.
    pub async fn extend_chat_context(
        &self,
        user_id: &str,
        node: &HierarchyNode,
    ) -> Result<ChatContextExtension, InsightError> {
        Ok(self
            .build_timeline_context_insight(user_id, node)
            .await?
            .into())
    }

    /// Like [`build_timeline_context_insight`](Self::build_timeline_context_insight),
    /// but failures and timeouts degrade to an empty insight.
    pub async fn build_timeline_context_insight_or_empty(
        &self,
        user_id: &str,
        node: &HierarchyNode,
    ) -> TimelineContextInsight {
        let work = self.build_timeline_context_insight(user_id, node);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        user_id,
                        node_id = %node.id,
                        timeout_ms = limit.as_millis() as u64,
                        "timeline insight timed out; using empty insight"
                    );
                    return TimelineContextInsight::empty(node);
                }
            },
            None => work.await,
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(
                user_id,
                node_id = %node.id,
                error = %e,
                "timeline insight failed; using empty insight"
            );
            TimelineContextInsight::empty(node)
        })
    }

    /// Guarded chat projection; never fails.
    pub async fn extend_chat_context_or_empty(
        &self,
        user_id: &str,
        node: &HierarchyNode,
    ) -> ChatContextExtension {
        self.build_timeline_context_insight_or_empty(user_id, node)
            .await
            .into()
    }
}
