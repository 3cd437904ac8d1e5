pub mod config;
pub mod insight;
pub mod node;
pub mod relation;

use clap::Args;
use lorekeeper_core::{Config, TimelineDb, TimelineLayer};

/// Identifies one node of a user's timeline.
#[derive(Args, Debug, Clone)]
pub struct NodeRef {
    /// Owner of the timeline
    #[arg(long, default_value = "local")]
    pub user: String,
    /// Hierarchy layer (mythos, epoch, era, saga, arc, chapter, scene, action, microaction)
    #[arg(long)]
    pub layer: TimelineLayer,
    /// Node id
    pub id: String,
}

pub fn open_db(config: &Config) -> Result<TimelineDb, Box<dyn std::error::Error>> {
    let path = config.database_path()?;
    tracing::debug!(path = %path.display(), "opening timeline database");
    Ok(TimelineDb::open_at(&path)?)
}
