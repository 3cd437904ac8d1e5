use std::sync::Arc;

use clap::Subcommand;
use lorekeeper_core::{Config, HierarchyNode, InsightComposer, TimelineDb};

use super::{open_db, NodeRef};

#[derive(Subcommand)]
pub enum InsightAction {
    /// Full gap and parallel insight; failures degrade to an empty insight
    Show {
        #[command(flatten)]
        node: NodeRef,
    },
    /// Compact insight for chat context: gaps plus parallel counts
    Chat {
        #[command(flatten)]
        node: NodeRef,
    },
    /// Hierarchy gaps only; errors are reported instead of degraded
    Gaps {
        #[command(flatten)]
        node: NodeRef,
    },
}

fn load_node(db: &TimelineDb, node: &NodeRef) -> Result<HierarchyNode, Box<dyn std::error::Error>> {
    let stored = db
        .get_node(&node.user, node.layer, &node.id)?
        .ok_or_else(|| format!("node not found: {} {}", node.layer, node.id))?;
    Ok(stored.to_hierarchy_node()?)
}

pub async fn run(action: InsightAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(open_db(config)?);
    let composer =
        InsightComposer::new(db.clone(), db.clone()).with_timeout(config.insight_timeout());

    match action {
        InsightAction::Show { node } => {
            let target = load_node(&db, &node)?;
            let insight = composer
                .build_timeline_context_insight_or_empty(&node.user, &target)
                .await;
            println!("{}", serde_json::to_string_pretty(&insight)?);
        }
        InsightAction::Chat { node } => {
            let target = load_node(&db, &node)?;
            let chat = composer
                .extend_chat_context_or_empty(&node.user, &target)
                .await;
            println!("{}", serde_json::to_string_pretty(&chat)?);
        }
        InsightAction::Gaps { node } => {
            let target = load_node(&db, &node)?;
            let gaps = composer.hierarchy_gaps(&node.user, &target).await?;
            println!("{}", serde_json::to_string_pretty(&gaps)?);
        }
    }
    Ok(())
}
