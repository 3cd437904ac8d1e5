use clap::Subcommand;
use lorekeeper_core::{Config, HierarchyNode, StoredNode, TimelineLayer};

use super::{open_db, NodeRef};

#[derive(Subcommand)]
pub enum NodeAction {
    /// Add a node, replacing any existing node with the same id and layer
    Add {
        #[command(flatten)]
        node: NodeRef,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// End date (YYYY-MM-DD); omit for an ongoing node
        #[arg(long)]
        end: Option<String>,
        /// Id of the parent node one layer up
        #[arg(long)]
        parent: Option<String>,
    },
    /// Show one node
    Get {
        #[command(flatten)]
        node: NodeRef,
    },
    /// List nodes
    List {
        #[arg(long, default_value = "local")]
        user: String,
        /// Only list this layer
        #[arg(long)]
        layer: Option<TimelineLayer>,
    },
    /// Remove a node
    Remove {
        #[command(flatten)]
        node: NodeRef,
    },
}

pub fn run(action: NodeAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_db(config)?;

    match action {
        NodeAction::Add {
            node,
            start,
            end,
            parent,
        } => {
            let parsed = HierarchyNode::parse(
                node.id,
                node.layer,
                node.user,
                &start,
                end.as_deref(),
            )?;
            let stored = StoredNode::from_node(&parsed, parent);
            db.upsert_node(&stored)?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
        NodeAction::Get { node } => match db.get_node(&node.user, node.layer, &node.id)? {
            Some(stored) => println!("{}", serde_json::to_string_pretty(&stored)?),
            None => return Err(format!("node not found: {} {}", node.layer, node.id).into()),
        },
        NodeAction::List { user, layer } => {
            let nodes = db.list_nodes(&user, layer)?;
            println!("{}", serde_json::to_string_pretty(&nodes)?);
        }
        NodeAction::Remove { node } => {
            if !db.delete_node(&node.user, node.layer, &node.id)? {
                return Err(format!("node not found: {} {}", node.layer, node.id).into());
            }
            println!("removed {} {}", node.layer, node.id);
        }
    }
    Ok(())
}
