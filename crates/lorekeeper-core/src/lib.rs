//! # Lorekeeper Core Library
//!
//! Derived insights over a user's hierarchical personal timeline
//! (mythos, epoch, era, saga, arc, chapter, scene, action, microaction).
//!
//! ## Architecture
//!
//! - **Hierarchy**: layer tags, node shapes, and the date parsing boundary
//! - **Timeline**: gap detection inside container nodes, implicit and
//!   explicit parallel resolution, and the per-request insight composer
//! - **Store**: async collaborator traits the composer reads through
//! - **Storage**: SQLite and in-memory stores plus TOML configuration
//!
//! ## Key Components
//!
//! - [`InsightComposer`]: builds a [`TimelineContextInsight`] for one node
//! - [`detect_hierarchy_gaps`]: pure gap detection over fetched children
//! - [`TimelineDb`]: SQLite-backed [`NodeStore`] and [`RelationStore`]
//! - [`Config`]: application configuration management

pub mod error;
pub mod hierarchy;
pub mod storage;
pub mod store;
pub mod timeline;

pub use error::{ConfigError, CoreError, InsightError};
pub use hierarchy::{parse_date, ChildNode, HierarchyNode, TimelineLayer};
pub use storage::{Config, MemoryStore, StoredNode, TimelineDb};
pub use store::{NodeRecord, NodeRelations, NodeStore, Relation, RelationStore, PARALLEL_TO};
pub use timeline::{
    classify_gap_size, detect_hierarchy_gaps, ChatContextExtension, GapReason, GapSize,
    HierarchyGap, InsightComposer, ParallelContext, ParallelNode, ParallelRelationRef,
    ParallelSummary, TimelineContextInsight,
};
