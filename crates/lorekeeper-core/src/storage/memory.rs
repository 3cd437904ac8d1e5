//! In-memory node and relation store.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::timeline_db::StoredNode;
use crate::error::InsightError;
use crate::hierarchy::{parse_date, TimelineLayer};
use crate::store::{NodeRecord, NodeRelations, NodeStore, Relation, RelationStore};

/// Vector-backed store implementing both collaborator traits.
///
/// Applies the same coarse candidate filter as [`super::TimelineDb`]. Rows
/// whose dates do not parse are passed through untouched so the insight
/// boundary reports them.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: Vec<StoredNode>,
    relations: Vec<(String, Relation)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, node: StoredNode) {
        self.nodes
            .retain(|n| !(n.user_id == node.user_id && n.layer == node.layer && n.id == node.id));
        self.nodes.push(node);
    }

    pub fn insert_relation(&mut self, user_id: impl Into<String>, relation: Relation) {
        self.relations.push((user_id.into(), relation));
    }

    pub fn with_node(
        mut self,
        user_id: &str,
        layer: TimelineLayer,
        id: &str,
        parent_id: Option<&str>,
        start_date: &str,
        end_date: Option<&str>,
    ) -> Self {
        self.insert_node(StoredNode {
            user_id: user_id.to_string(),
            layer,
            id: id.to_string(),
            parent_id: parent_id.map(str::to_string),
            start_date: start_date.to_string(),
            end_date: end_date.map(str::to_string),
        });
        self
    }

    pub fn with_relation(mut self, user_id: &str, relation: Relation) -> Self {
        self.insert_relation(user_id, relation);
        self
    }
}

fn passes_candidate_filter(
    node: &StoredNode,
    upper_bound_exclusive: NaiveDate,
    lower_bound_inclusive: Option<NaiveDate>,
) -> bool {
    let starts_before = match parse_date(&node.start_date) {
        Ok(start) => start < upper_bound_exclusive,
        Err(_) => true,
    };
    let ends_after = match (node.end_date.as_deref(), lower_bound_inclusive) {
        (None, _) | (_, None) => true,
        (Some(end), Some(lower)) => parse_date(end).map(|e| e >= lower).unwrap_or(true),
    };
    starts_before && ends_after
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn get_children(
        &self,
        user_id: &str,
        parent_layer: TimelineLayer,
        parent_id: &str,
    ) -> Result<Vec<NodeRecord>, InsightError> {
        let Some(child_layer) = parent_layer.child_layer() else {
            return Ok(Vec::new());
        };
        Ok(self
            .nodes
            .iter()
            .filter(|n| {
                n.user_id == user_id
                    && n.layer == child_layer
                    && n.parent_id.as_deref() == Some(parent_id)
            })
            .map(StoredNode::to_record)
            .collect())
    }

    async fn query_candidate_containers(
        &self,
        user_id: &str,
        layer: TimelineLayer,
        upper_bound_exclusive: NaiveDate,
        lower_bound_inclusive: Option<NaiveDate>,
    ) -> Result<Vec<NodeRecord>, InsightError> {
        Ok(self
            .nodes
            .iter()
            .filter(|n| n.user_id == user_id && n.layer == layer)
            .filter(|n| passes_candidate_filter(n, upper_bound_exclusive, lower_bound_inclusive))
            .map(StoredNode::to_record)
            .collect())
    }
}

#[async_trait]
impl RelationStore for MemoryStore {
    async fn list_relations_by_node(
        &self,
        user_id: &str,
        node_id: &str,
        node_layer: TimelineLayer,
    ) -> Result<NodeRelations, InsightError> {
        let mut listed = NodeRelations::default();
        for (owner, relation) in &self.relations {
            if owner != user_id {
                continue;
            }
            if relation.to_node_id == node_id && relation.to_node_type == node_layer {
                listed.incoming.push(relation.clone());
            }
            if relation.from_node_id == node_id && relation.from_node_type == node_layer {
                listed.outgoing.push(relation.clone());
            }
        }
        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn insert_replaces_same_key() {
        let store = MemoryStore::new()
            .with_node("u", TimelineLayer::Arc, "A", Some("S"), "2020-01-01", None)
            .with_node("u", TimelineLayer::Arc, "A", Some("S"), "2020-02-01", None);
        let children = store.get_children("u", TimelineLayer::Saga, "S").await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].start_date, "2020-02-01");
    }

    #[tokio::test]
    async fn candidate_filter_matches_sql_semantics() {
        let store = MemoryStore::new()
            .with_node("u", TimelineLayer::Saga, "ended", None, "2020-01-01", Some("2020-12-31"))
            .with_node("u", TimelineLayer::Saga, "edge", None, "2020-01-01", Some("2021-01-01"))
            .with_node("u", TimelineLayer::Saga, "late", None, "2021-06-01", None)
            .with_node("u", TimelineLayer::Saga, "junk", None, "???", None);
        let ids: Vec<_> = store
            .query_candidate_containers("u", TimelineLayer::Saga, date("2021-06-01"), Some(date("2021-01-01")))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["edge".to_string(), "junk".to_string()]);
    }
}
