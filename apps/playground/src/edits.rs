//! Scripted edits replayed against a loaded form, each followed by the validation
//! calls an interactive editor would make.

use anyhow::{Context, anyhow};
use form_tree::{Item, ItemType, NodeId, QuestionnaireTree};
use formbuilder_validation::{ValidationContext, ValidationMode};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Edit {
    #[serde(rename_all = "camelCase")]
    Rename { link_id: String, to: String },
    #[serde(rename_all = "camelCase")]
    Remove { link_id: String },
    #[serde(rename_all = "camelCase")]
    SetType {
        link_id: String,
        #[serde(rename = "type")]
        item_type: ItemType,
    },
    #[serde(rename_all = "camelCase")]
    Add {
        #[serde(default)]
        parent: Option<String>,
        item: Item,
    },
}

pub fn load(path: &Path) -> anyhow::Result<Vec<Edit>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read edit script {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid edit script {}", path.display()))
}

fn resolve(tree: &QuestionnaireTree, link_id: &str) -> anyhow::Result<NodeId> {
    tree.find_by_link_id(link_id)
        .first()
        .copied()
        .ok_or_else(|| anyhow!("no item with linkId '{link_id}'"))
}

/// Applies one edit to the tree and re-validates what it touched.
pub fn apply(
    ctx: &mut ValidationContext,
    tree: &mut QuestionnaireTree,
    edit: &Edit,
) -> anyhow::Result<()> {
    match edit {
        Edit::Rename { link_id, to } => {
            let id = resolve(tree, link_id)?;
            if let Some(item) = tree.item_mut(id) {
                item.link_id = Some(to.clone());
            }
            ctx.validate_link_id(tree, id, Some(link_id.as_str()), to);
            ctx.revalidate_references(tree, &[link_id.as_str(), to.as_str()]);
        }
        Edit::Remove { link_id } => {
            let id = resolve(tree, link_id)?;
            let parent = tree.parent(id);
            let removed = tree.remove_item(id)?;
            ctx.forget_subtree(tree, parent, &removed);
            if let Some(parent) = parent {
                ctx.validate_type(tree, parent)?;
            }
            ctx.revalidate_references(tree, &[link_id.as_str()]);
        }
        Edit::SetType { link_id, item_type } => {
            let id = resolve(tree, link_id)?;
            if let Some(item) = tree.item_mut(id) {
                item.item_type = Some(item_type.clone());
            }
            ctx.validate_type(tree, id)?;
            ctx.revalidate_references(tree, &[link_id.as_str()]);
        }
        Edit::Add { parent, item } => {
            let parent = parent.as_deref().map(|p| resolve(tree, p)).transpose()?;
            let id = tree.add_item(parent, item.clone())?;
            ctx.node_added(tree, id)?;
            ctx.validate_node(tree, id, ValidationMode::Edit)?;
            if let Some(link_id) = item.link_id() {
                ctx.revalidate_references(tree, &[link_id]);
            }
        }
    }
    tracing::info!(?edit, "Edit applied");
    Ok(())
}
