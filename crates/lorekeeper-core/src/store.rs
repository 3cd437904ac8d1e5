//! Collaborator interfaces consumed by the insight pipeline.
//!
//! The insight core never talks to a database directly. Callers inject a
//! [`NodeStore`] and a [`RelationStore`]; [`crate::storage::TimelineDb`]
//! implements both on top of SQLite.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::InsightError;
use crate::hierarchy::TimelineLayer;

/// Relation type marking two nodes as running in parallel.
pub const PARALLEL_TO: &str = "parallel_to";

/// Raw node row as returned by a store. Dates are left unparsed so the
/// insight boundary can reject malformed values with a typed error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

/// A directed relation between two timeline nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: String,
    pub relation_type: String,
    pub from_node_id: String,
    pub from_node_type: TimelineLayer,
    pub to_node_id: String,
    pub to_node_type: TimelineLayer,
}

/// Relations touching one node, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRelations {
    pub incoming: Vec<Relation>,
    pub outgoing: Vec<Relation>,
}

/// Read access to timeline nodes.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Nodes one layer below `parent_layer` whose parent is `parent_id`.
    /// No ordering is guaranteed.
    async fn get_children(
        &self,
        user_id: &str,
        parent_layer: TimelineLayer,
        parent_id: &str,
    ) -> Result<Vec<NodeRecord>, InsightError>;

    /// Coarse overlap pre-filter over one layer: nodes starting before
    /// `upper_bound_exclusive` whose end is open or on/after
    /// `lower_bound_inclusive` (no lower bound when `None`).
    async fn query_candidate_containers(
        &self,
        user_id: &str,
        layer: TimelineLayer,
        upper_bound_exclusive: NaiveDate,
        lower_bound_inclusive: Option<NaiveDate>,
    ) -> Result<Vec<NodeRecord>, InsightError>;
}

/// Read access to declared relations between nodes.
#[async_trait]
pub trait RelationStore: Send + Sync {
    async fn list_relations_by_node(
        &self,
        user_id: &str,
        node_id: &str,
        node_layer: TimelineLayer,
    ) -> Result<NodeRelations, InsightError>;
}
