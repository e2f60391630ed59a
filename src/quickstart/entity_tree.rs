//! Name-path lookup over a fetched entity tree.
//!
//! After the entity tree is created the service only returns the root id; the
//! ids of sub-entities have to be recovered by walking the tree that
//! get-entity returns. Names are matched exactly and must be unique among
//! siblings, otherwise the lookup would depend on the order the service lists
//! children in.

use thiserror::Error;
use uuid::Uuid;

use crate::luis::types::EntityNode;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("entity path not found: no child named '{missing}' under '{parent}'")]
    NotFound { parent: String, missing: String },

    #[error("entity path is ambiguous: {count} children named '{name}' under '{parent}'")]
    Ambiguous {
        parent: String,
        name: String,
        count: usize,
    },

    #[error("entity '{path}' was found but carries no id")]
    Unidentified { path: String },
}

/// The unique direct child of `parent` called `name`.
pub fn find_child<'a>(parent: &'a EntityNode, name: &str) -> Result<&'a EntityNode, ResolutionError> {
    let mut matches = parent.children.iter().filter(|c| c.name == name);
    match (matches.next(), matches.count()) {
        (Some(child), 0) => Ok(child),
        (Some(_), extra) => Err(ResolutionError::Ambiguous {
            parent: parent.name.clone(),
            name: name.to_string(),
            count: extra + 1,
        }),
        (None, _) => Err(ResolutionError::NotFound {
            parent: parent.name.clone(),
            missing: name.to_string(),
        }),
    }
}

/// Follow `path` down from `root` and return the node it ends at.
pub fn find_path<'a>(root: &'a EntityNode, path: &[&str]) -> Result<&'a EntityNode, ResolutionError> {
    path.iter().try_fold(root, |node, name| find_child(node, name))
}

/// Id of `root → child → grandchild`.
pub fn grandchild_id(
    root: &EntityNode,
    child: &str,
    grandchild: &str,
) -> Result<Uuid, ResolutionError> {
    let node = find_path(root, &[child, grandchild])?;
    node.id.ok_or_else(|| ResolutionError::Unidentified {
        path: format!("{}/{}/{}", root.name, child, grandchild),
    })
}
