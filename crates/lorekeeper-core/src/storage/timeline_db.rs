//! SQLite-based storage for timeline nodes and relations.
//!
//! Implements [`NodeStore`] and [`RelationStore`] so the insight pipeline
//! can run against a local database. Dates are kept as `YYYY-MM-DD` text
//! and handed back unparsed; parsing happens at the insight boundary.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::InsightError;
use crate::hierarchy::{HierarchyNode, TimelineLayer};
use crate::store::{NodeRecord, NodeRelations, NodeStore, Relation, RelationStore};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A node row as persisted, including its place in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNode {
    pub user_id: String,
    pub layer: TimelineLayer,
    pub id: String,
    pub parent_id: Option<String>,
    pub start_date: String,
    pub end_date: Option<String>,
}

impl StoredNode {
    pub fn from_node(node: &HierarchyNode, parent_id: Option<String>) -> Self {
        Self {
            user_id: node.user_id.clone(),
            layer: node.layer,
            id: node.id.clone(),
            parent_id,
            start_date: node.start_date.format(DATE_FORMAT).to_string(),
            end_date: node.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
        }
    }

    /// Parse the stored dates into a validated [`HierarchyNode`].
    pub fn to_hierarchy_node(&self) -> Result<HierarchyNode, InsightError> {
        HierarchyNode::parse(
            self.id.clone(),
            self.layer,
            self.user_id.clone(),
            &self.start_date,
            self.end_date.as_deref(),
        )
    }

    pub fn to_record(&self) -> NodeRecord {
        NodeRecord {
            id: self.id.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }
}

fn parse_layer_column(row: &rusqlite::Row, idx: usize) -> Result<TimelineLayer, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    raw.parse::<TimelineLayer>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Build a StoredNode from a database row
fn row_to_stored_node(row: &rusqlite::Row) -> Result<StoredNode, rusqlite::Error> {
    Ok(StoredNode {
        user_id: row.get(0)?,
        layer: parse_layer_column(row, 1)?,
        id: row.get(2)?,
        parent_id: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
    })
}

/// Build a Relation from a database row
fn row_to_relation(row: &rusqlite::Row) -> Result<Relation, rusqlite::Error> {
    Ok(Relation {
        id: row.get(0)?,
        relation_type: row.get(1)?,
        from_node_id: row.get(2)?,
        from_node_type: parse_layer_column(row, 3)?,
        to_node_id: row.get(4)?,
        to_node_type: parse_layer_column(row, 5)?,
    })
}

fn row_to_record(row: &rusqlite::Row) -> Result<NodeRecord, rusqlite::Error> {
    Ok(NodeRecord {
        id: row.get(0)?,
        start_date: row.get(1)?,
        end_date: row.get(2)?,
    })
}

const NODE_COLUMNS: &str = "user_id, layer, id, parent_id, start_date, end_date";
const RELATION_COLUMNS: &str =
    "id, relation_type, from_node_id, from_node_type, to_node_id, to_node_type";

/// SQLite database for timeline nodes and relations.
pub struct TimelineDb {
    conn: Mutex<Connection>,
}

impl TimelineDb {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Every write is a single statement, so a poisoned lock is still consistent
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS nodes (
                user_id     TEXT NOT NULL,
                layer       TEXT NOT NULL,
                id          TEXT NOT NULL,
                parent_id   TEXT,
                start_date  TEXT NOT NULL,
                end_date    TEXT,
                PRIMARY KEY (user_id, layer, id)
            );

            CREATE TABLE IF NOT EXISTS relations (
                id             TEXT PRIMARY KEY,
                user_id        TEXT NOT NULL,
                relation_type  TEXT NOT NULL,
                from_node_id   TEXT NOT NULL,
                from_node_type TEXT NOT NULL,
                to_node_id     TEXT NOT NULL,
                to_node_type   TEXT NOT NULL
            );

            -- Indexes for the insight queries
            CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(user_id, layer, parent_id);
            CREATE INDEX IF NOT EXISTS idx_nodes_start ON nodes(user_id, layer, start_date);
            CREATE INDEX IF NOT EXISTS idx_relations_from ON relations(user_id, from_node_id, from_node_type);
            CREATE INDEX IF NOT EXISTS idx_relations_to ON relations(user_id, to_node_id, to_node_type);",
        )?;
        Ok(())
    }

    /// Insert a node or replace the existing one with the same key.
    pub fn upsert_node(&self, node: &StoredNode) -> Result<(), rusqlite::Error> {
        self.conn().execute(
            "INSERT OR REPLACE INTO nodes (user_id, layer, id, parent_id, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                node.user_id,
                node.layer.as_str(),
                node.id,
                node.parent_id,
                node.start_date,
                node.end_date,
            ],
        )?;
        Ok(())
    }

    pub fn get_node(
        &self,
        user_id: &str,
        layer: TimelineLayer,
        id: &str,
    ) -> Result<Option<StoredNode>, rusqlite::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE user_id = ?1 AND layer = ?2 AND id = ?3"
        ))?;
        stmt.query_row(params![user_id, layer.as_str(), id], row_to_stored_node)
            .optional()
    }

    /// List a user's nodes, optionally restricted to one layer.
    pub fn list_nodes(
        &self,
        user_id: &str,
        layer: Option<TimelineLayer>,
    ) -> Result<Vec<StoredNode>, rusqlite::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes
             WHERE user_id = ?1 AND (?2 IS NULL OR layer = ?2)
             ORDER BY start_date, layer, id"
        ))?;
        let rows = stmt.query_map(
            params![user_id, layer.map(|l| l.as_str())],
            row_to_stored_node,
        )?;
        rows.collect()
    }

    /// Delete a node. Returns whether a row was removed.
    pub fn delete_node(
        &self,
        user_id: &str,
        layer: TimelineLayer,
        id: &str,
    ) -> Result<bool, rusqlite::Error> {
        let removed = self.conn().execute(
            "DELETE FROM nodes WHERE user_id = ?1 AND layer = ?2 AND id = ?3",
            params![user_id, layer.as_str(), id],
        )?;
        Ok(removed > 0)
    }

    pub fn create_relation(&self, user_id: &str, relation: &Relation) -> Result<(), rusqlite::Error> {
        self.conn().execute(
            "INSERT INTO relations (id, user_id, relation_type, from_node_id, from_node_type, to_node_id, to_node_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                relation.id,
                user_id,
                relation.relation_type,
                relation.from_node_id,
                relation.from_node_type.as_str(),
                relation.to_node_id,
                relation.to_node_type.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn list_relations(&self, user_id: &str) -> Result<Vec<Relation>, rusqlite::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RELATION_COLUMNS} FROM relations WHERE user_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![user_id], row_to_relation)?;
        rows.collect()
    }

    /// Delete a relation. Returns whether a row was removed.
    pub fn delete_relation(&self, user_id: &str, id: &str) -> Result<bool, rusqlite::Error> {
        let removed = self.conn().execute(
            "DELETE FROM relations WHERE user_id = ?1 AND id = ?2",
            params![user_id, id],
        )?;
        Ok(removed > 0)
    }

    fn children_of(
        &self,
        user_id: &str,
        child_layer: TimelineLayer,
        parent_id: &str,
    ) -> Result<Vec<NodeRecord>, rusqlite::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, start_date, end_date FROM nodes
             WHERE user_id = ?1 AND layer = ?2 AND parent_id = ?3",
        )?;
        let rows = stmt.query_map(params![user_id, child_layer.as_str(), parent_id], row_to_record)?;
        rows.collect()
    }

    fn candidates(
        &self,
        user_id: &str,
        layer: TimelineLayer,
        upper_bound_exclusive: NaiveDate,
        lower_bound_inclusive: Option<NaiveDate>,
    ) -> Result<Vec<NodeRecord>, rusqlite::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, start_date, end_date FROM nodes
             WHERE user_id = ?1 AND layer = ?2 AND start_date < ?3
               AND (?4 IS NULL OR end_date IS NULL OR end_date >= ?4)",
        )?;
        let rows = stmt.query_map(
            params![
                user_id,
                layer.as_str(),
                upper_bound_exclusive.format(DATE_FORMAT).to_string(),
                lower_bound_inclusive.map(|d| d.format(DATE_FORMAT).to_string()),
            ],
            row_to_record,
        )?;
        rows.collect()
    }

    fn relations_touching(
        &self,
        user_id: &str,
        node_id: &str,
        node_layer: TimelineLayer,
    ) -> Result<NodeRelations, rusqlite::Error> {
        let conn = self.conn();
        let mut incoming = conn.prepare(&format!(
            "SELECT {RELATION_COLUMNS} FROM relations
             WHERE user_id = ?1 AND to_node_id = ?2 AND to_node_type = ?3"
        ))?;
        let mut outgoing = conn.prepare(&format!(
            "SELECT {RELATION_COLUMNS} FROM relations
             WHERE user_id = ?1 AND from_node_id = ?2 AND from_node_type = ?3"
        ))?;
        let layer = node_layer.as_str();
        let listed = NodeRelations {
            incoming: incoming
                .query_map(params![user_id, node_id, layer], row_to_relation)?
                .collect::<Result<_, _>>()?,
            outgoing: outgoing
                .query_map(params![user_id, node_id, layer], row_to_relation)?
                .collect::<Result<_, _>>()?,
        };
        Ok(listed)
    }
}

#[async_trait]
impl NodeStore for TimelineDb {
    async fn get_children(
        &self,
        user_id: &str,
        parent_layer: TimelineLayer,
        parent_id: &str,
    ) -> Result<Vec<NodeRecord>, InsightError> {
        match parent_layer.child_layer() {
            Some(child_layer) => Ok(self.children_of(user_id, child_layer, parent_id)?),
            None => Ok(Vec::new()),
        }
    }

    async fn query_candidate_containers(
        &self,
        user_id: &str,
        layer: TimelineLayer,
        upper_bound_exclusive: NaiveDate,
        lower_bound_inclusive: Option<NaiveDate>,
    ) -> Result<Vec<NodeRecord>, InsightError> {
        Ok(self.candidates(user_id, layer, upper_bound_exclusive, lower_bound_inclusive)?)
    }
}

#[async_trait]
impl RelationStore for TimelineDb {
    async fn list_relations_by_node(
        &self,
        user_id: &str,
        node_id: &str,
        node_layer: TimelineLayer,
    ) -> Result<NodeRelations, InsightError> {
        Ok(self.relations_touching(user_id, node_id, node_layer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PARALLEL_TO;

    fn stored(layer: TimelineLayer, id: &str, parent: Option<&str>, start: &str, end: Option<&str>) -> StoredNode {
        StoredNode {
            user_id: "user-1".into(),
            layer,
            id: id.into(),
            parent_id: parent.map(str::to_string),
            start_date: start.into(),
            end_date: end.map(str::to_string),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn upsert_get_and_delete_node() {
        let db = TimelineDb::open_memory().unwrap();
        let node = stored(TimelineLayer::Era, "E1", None, "2020-01-01", None);
        db.upsert_node(&node).unwrap();
        assert_eq!(db.get_node("user-1", TimelineLayer::Era, "E1").unwrap(), Some(node.clone()));
        assert!(db.get_node("user-2", TimelineLayer::Era, "E1").unwrap().is_none());

        let updated = stored(TimelineLayer::Era, "E1", None, "2020-01-01", Some("2020-12-31"));
        db.upsert_node(&updated).unwrap();
        assert_eq!(db.list_nodes("user-1", None).unwrap(), vec![updated]);

        assert!(db.delete_node("user-1", TimelineLayer::Era, "E1").unwrap());
        assert!(!db.delete_node("user-1", TimelineLayer::Era, "E1").unwrap());
    }

    #[test]
    fn list_nodes_filters_by_layer() {
        let db = TimelineDb::open_memory().unwrap();
        db.upsert_node(&stored(TimelineLayer::Saga, "S1", None, "2020-01-01", None)).unwrap();
        db.upsert_node(&stored(TimelineLayer::Arc, "A1", None, "2019-01-01", None)).unwrap();
        let arcs = db.list_nodes("user-1", Some(TimelineLayer::Arc)).unwrap();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].id, "A1");
        assert_eq!(db.list_nodes("user-1", None).unwrap().len(), 2);
    }

    #[test]
    fn stored_node_round_trips_hierarchy_node() {
        let node = HierarchyNode::parse("A1", TimelineLayer::Arc, "user-1", "2021-02-03", Some("2021-04-05"))
            .unwrap();
        let stored = StoredNode::from_node(&node, Some("S1".into()));
        assert_eq!(stored.start_date, "2021-02-03");
        assert_eq!(stored.to_hierarchy_node().unwrap(), node);
    }

    #[tokio::test]
    async fn children_are_one_layer_down() {
        let db = TimelineDb::open_memory().unwrap();
        db.upsert_node(&stored(TimelineLayer::Saga, "S1", Some("E1"), "2020-01-01", None)).unwrap();
        db.upsert_node(&stored(TimelineLayer::Arc, "A1", Some("E1"), "2020-01-01", None)).unwrap();
        db.upsert_node(&stored(TimelineLayer::Saga, "S2", Some("E2"), "2020-01-01", None)).unwrap();

        let children = db.get_children("user-1", TimelineLayer::Era, "E1").await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "S1");

        let none = db.get_children("user-1", TimelineLayer::Microaction, "M1").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn candidate_prefilter_is_coarse() {
        let db = TimelineDb::open_memory().unwrap();
        db.upsert_node(&stored(TimelineLayer::Arc, "before", None, "2020-01-01", Some("2020-12-31"))).unwrap();
        db.upsert_node(&stored(TimelineLayer::Arc, "touching", None, "2020-06-01", Some("2021-01-01"))).unwrap();
        db.upsert_node(&stored(TimelineLayer::Arc, "open", None, "2019-01-01", None)).unwrap();
        db.upsert_node(&stored(TimelineLayer::Arc, "after", None, "2021-06-01", None)).unwrap();

        let mut ids: Vec<_> = db
            .query_candidate_containers(
                "user-1",
                TimelineLayer::Arc,
                date("2021-06-01"),
                Some(date("2021-01-01")),
            )
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["open".to_string(), "touching".to_string()]);
    }

    #[tokio::test]
    async fn relations_split_by_direction() {
        let db = TimelineDb::open_memory().unwrap();
        let rel = Relation {
            id: "r1".into(),
            relation_type: PARALLEL_TO.into(),
            from_node_id: "S1".into(),
            from_node_type: TimelineLayer::Saga,
            to_node_id: "A1".into(),
            to_node_type: TimelineLayer::Arc,
        };
        db.create_relation("user-1", &rel).unwrap();

        let from_saga = db.list_relations_by_node("user-1", "S1", TimelineLayer::Saga).await.unwrap();
        assert_eq!(from_saga.outgoing, vec![rel.clone()]);
        assert!(from_saga.incoming.is_empty());

        let from_arc = db.list_relations_by_node("user-1", "A1", TimelineLayer::Arc).await.unwrap();
        assert_eq!(from_arc.incoming, vec![rel.clone()]);

        let other_user = db.list_relations_by_node("user-2", "A1", TimelineLayer::Arc).await.unwrap();
        assert_eq!(other_user, NodeRelations::default());

        assert_eq!(db.list_relations("user-1").unwrap(), vec![rel]);
        assert!(db.delete_relation("user-1", "r1").unwrap());
        assert!(db.list_relations("user-1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn self_relation_is_listed_both_ways() {
        let db = TimelineDb::open_memory().unwrap();
        let rel = Relation {
            id: "r-self".into(),
            relation_type: PARALLEL_TO.into(),
            from_node_id: "S1".into(),
            from_node_type: TimelineLayer::Saga,
            to_node_id: "S1".into(),
            to_node_type: TimelineLayer::Saga,
        };
        db.create_relation("user-1", &rel).unwrap();

        let listed = db.list_relations_by_node("user-1", "S1", TimelineLayer::Saga).await.unwrap();
        assert_eq!(listed.incoming, vec![rel.clone()]);
        assert_eq!(listed.outgoing, vec![rel]);

        let wrong_layer = db.list_relations_by_node("user-1", "S1", TimelineLayer::Arc).await.unwrap();
        assert_eq!(wrong_layer, NodeRelations::default());
    }

    #[test]
    fn unknown_layer_in_row_is_reported() {
        let db = TimelineDb::open_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO nodes (user_id, layer, id, start_date) VALUES ('user-1', 'galaxy', 'G', '2020-01-01')",
                [],
            )
            .unwrap();
        assert!(db.list_nodes("user-1", None).is_err());
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.db");
        {
            let db = TimelineDb::open_at(&path).unwrap();
            db.upsert_node(&stored(TimelineLayer::Era, "E1", None, "2020-01-01", None)).unwrap();
        }
        let db = TimelineDb::open_at(&path).unwrap();
        assert_eq!(db.list_nodes("user-1", None).unwrap().len(), 1);
    }
}
