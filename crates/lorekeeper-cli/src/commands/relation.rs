use clap::Subcommand;
use lorekeeper_core::{Config, Relation, TimelineLayer, PARALLEL_TO};
use uuid::Uuid;

use super::open_db;

#[derive(Subcommand)]
pub enum RelationAction {
    /// Declare a relation between two nodes
    Add {
        #[arg(long, default_value = "local")]
        user: String,
        /// Layer of the source node
        #[arg(long)]
        from_layer: TimelineLayer,
        /// Id of the source node
        #[arg(long)]
        from: String,
        /// Layer of the target node
        #[arg(long)]
        to_layer: TimelineLayer,
        /// Id of the target node
        #[arg(long)]
        to: String,
        /// Relation type
        #[arg(long = "type", default_value = PARALLEL_TO)]
        relation_type: String,
    },
    /// List a user's relations
    List {
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Remove a relation by id
    Remove {
        #[arg(long, default_value = "local")]
        user: String,
        id: String,
    },
}

pub fn run(action: RelationAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_db(config)?;

    match action {
        RelationAction::Add {
            user,
            from_layer,
            from,
            to_layer,
            to,
            relation_type,
        } => {
            let relation = Relation {
                id: Uuid::new_v4().to_string(),
                relation_type,
                from_node_id: from,
                from_node_type: from_layer,
                to_node_id: to,
                to_node_type: to_layer,
            };
            db.create_relation(&user, &relation)?;
            println!("{}", serde_json::to_string_pretty(&relation)?);
        }
        RelationAction::List { user } => {
            let relations = db.list_relations(&user)?;
            println!("{}", serde_json::to_string_pretty(&relations)?);
        }
        RelationAction::Remove { user, id } => {
            if !db.delete_relation(&user, &id)? {
                return Err(format!("relation not found: {id}").into());
            }
            println!("removed relation {id}");
        }
    }
    Ok(())
}
