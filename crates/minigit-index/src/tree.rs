//! Tree builder: flat index entries → persisted tree-object DAG.

use bstr::{BString, ByteSlice};
use minigit_hash::ObjectId;
use minigit_loose::LooseObjectStore;
use minigit_object::{FileMode, ObjectType, Tree, TreeEntry};

use crate::{IndexEntry, IndexError};

/// An in-memory build node. Nodes live in a flat arena and refer to their
/// children by index, so the structure needs no owning handles or lifetimes.
struct Node {
    mode: FileMode,
    /// Blob OID for leaves; filled in for directories once emitted.
    oid: Option<ObjectId>,
    /// Children as (name, arena index), kept sorted by name bytes.
    children: Vec<(BString, usize)>,
    is_dir: bool,
}

impl Node {
    fn dir() -> Self {
        Self {
            mode: FileMode::Tree,
            oid: None,
            children: Vec::new(),
            is_dir: true,
        }
    }

    fn leaf(mode: FileMode, oid: ObjectId) -> Self {
        Self {
            mode,
            oid: Some(oid),
            children: Vec::new(),
            is_dir: false,
        }
    }
}

/// Build the directory DAG for `entries` and persist every tree object
/// bottom-up. Returns the root tree OID.
pub fn write_tree(
    entries: &[IndexEntry],
    store: &LooseObjectStore,
) -> Result<ObjectId, IndexError> {
    let mut arena: Vec<Node> = vec![Node::dir()];

    for entry in entries {
        insert_entry(&mut arena, entry)?;
    }

    emit(&arena, 0, store)
}

/// Walk/create directory nodes along the entry's path and attach the leaf.
fn insert_entry(arena: &mut Vec<Node>, entry: &IndexEntry) -> Result<(), IndexError> {
    let components: Vec<&[u8]> = entry.path.split_str("/").collect();

    if components.iter().any(|c| c.is_empty()) {
        return Err(IndexError::InvalidPath(entry.path.clone()));
    }

    let mut current = 0usize;

    for dir_name in &components[..components.len() - 1] {
        current = match find_child(&arena[current], dir_name) {
            Some(child) => {
                if !arena[child].is_dir {
                    // A file already occupies this name.
                    return Err(IndexError::DuplicateEntry(BString::from(*dir_name)));
                }
                child
            }
            None => {
                let child = arena.len();
                arena.push(Node::dir());
                add_child(arena, current, dir_name, child);
                child
            }
        };
    }

    let leaf_name = components[components.len() - 1];
    if find_child(&arena[current], leaf_name).is_some() {
        return Err(IndexError::DuplicateEntry(BString::from(leaf_name)));
    }

    let leaf = arena.len();
    arena.push(Node::leaf(entry.mode, entry.oid));
    add_child(arena, current, leaf_name, leaf);

    Ok(())
}

fn find_child(node: &Node, name: &[u8]) -> Option<usize> {
    node.children
        .binary_search_by(|(n, _)| n.as_slice().cmp(name))
        .ok()
        .map(|pos| node.children[pos].1)
}

fn add_child(arena: &mut [Node], parent: usize, name: &[u8], child: usize) {
    let children = &mut arena[parent].children;
    let pos = children
        .binary_search_by(|(n, _)| n.as_slice().cmp(name))
        .unwrap_err();
    children.insert(pos, (BString::from(name), child));
}

/// Depth-first post-order emission: every child tree is persisted before its
/// parent, because the parent's payload embeds the child digests. Identical
/// subtrees collapse to a single store file through the idempotent write.
fn emit(arena: &[Node], node: usize, store: &LooseObjectStore) -> Result<ObjectId, IndexError> {
    let mut tree = Tree::new();

    for (name, child_idx) in &arena[node].children {
        let child = &arena[*child_idx];
        let (mode, oid) = if child.is_dir {
            (FileMode::Tree, emit(arena, *child_idx, store)?)
        } else {
            (child.mode, child.oid.expect("leaf node has an OID"))
        };
        tree.entries.push(TreeEntry {
            mode,
            name: name.clone(),
            oid,
        });
    }

    let payload = tree.serialize_content();
    let oid = store.write_raw(ObjectType::Tree, &payload)?;
    Ok(oid)
}
