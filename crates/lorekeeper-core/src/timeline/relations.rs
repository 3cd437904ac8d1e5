//! Explicit parallel relations declared between nodes.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::InsightError;
use crate::hierarchy::{HierarchyNode, TimelineLayer};
use crate::store::{Relation, RelationStore, PARALLEL_TO};

/// The counterpart of a declared `parallel_to` relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelRelationRef {
    pub relation_id: String,
    pub other_node_id: String,
    pub other_node_layer: TimelineLayer,
}

impl ParallelRelationRef {
    /// Normalize a relation to the side that is not `node`, whichever way
    /// the relation points.
    pub fn from_relation(relation: &Relation, node: &HierarchyNode) -> Self {
        let from_is_node =
            relation.from_node_id == node.id && relation.from_node_type == node.layer;
        let (other_id, other_layer) = if from_is_node {
            (&relation.to_node_id, relation.to_node_type)
        } else {
            (&relation.from_node_id, relation.from_node_type)
        };
        Self {
            relation_id: relation.id.clone(),
            other_node_id: other_id.clone(),
            other_node_layer: other_layer,
        }
    }
}

/// Resolves declared parallels through the relation store.
pub struct ExplicitRelationResolver {
    relations: Arc<dyn RelationStore>,
}

impl ExplicitRelationResolver {
    pub fn new(relations: Arc<dyn RelationStore>) -> Self {
        Self { relations }
    }

    pub async fn get_explicit_parallel_refs(
        &self,
        user_id: &str,
        node: &HierarchyNode,
    ) -> Result<Vec<ParallelRelationRef>, InsightError> {
        let listed = self
            .relations
            .list_relations_by_node(user_id, &node.id, node.layer)
            .await?;

        // A self-relation shows up on both sides
        let mut seen = HashSet::new();
        let refs: Vec<_> = listed
            .incoming
            .iter()
            .chain(listed.outgoing.iter())
            .filter(|r| r.relation_type == PARALLEL_TO)
            .filter(|r| seen.insert(r.id.clone()))
            .map(|r| ParallelRelationRef::from_relation(r, node))
            .collect();

        tracing::debug!(
            user_id,
            node_id = %node.id,
            layer = %node.layer,
            count = refs.len(),
            "resolved explicit parallels"
        );
        Ok(refs)
    }
}
