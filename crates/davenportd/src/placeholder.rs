//! Minimal in-memory tree collaborator.
//!
//! The daemon binary and the test suites need *a* [`TreeSource`]; real
//! resource-tree implementations live outside this crate. `MemoryTree`
//! keeps a JSON object tree addressed by [`DavPath`] values.

use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value, json};

use davenport_types::DavPath;

use crate::persist::TreeSource;

/// An in-memory JSON tree addressed by paths.
pub struct MemoryTree {
    root: Mutex<Value>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            root: Mutex::new(json!({})),
        }
    }

    /// Creates a tree with a fixed initial value.
    pub fn with_value(value: Value) -> Self {
        Self {
            root: Mutex::new(value),
        }
    }

    /// Inserts `value` at `path`, creating intermediate objects.
    ///
    /// Inserting at the root replaces the whole tree.
    pub fn insert(&self, path: &DavPath, value: Value) {
        let mut root = self.lock();
        if path.is_root() {
            *root = value;
            return;
        }
        let mut node = &mut *root;
        for segment in path.segments() {
            // Indexing a Null promotes it to an object; anything else
            // non-object is replaced first.
            if !node.is_object() && !node.is_null() {
                *node = Value::Object(Map::new());
            }
            node = &mut node[segment.as_str()];
        }
        *node = value;
    }

    /// A copy of the current tree value.
    pub fn snapshot(&self) -> Value {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Value> {
        self.root.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TreeSource for MemoryTree {
    fn save(&self) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_creates_intermediate_objects() {
        let tree = MemoryTree::new();
        tree.insert(&DavPath::parse("/docs/report.txt"), json!("quarterly"));
        assert_eq!(
            tree.snapshot(),
            json!({"docs": {"report.txt": "quarterly"}})
        );
    }

    #[test]
    fn insert_at_root_replaces_the_tree() {
        let tree = MemoryTree::with_value(json!({"old": true}));
        tree.insert(&DavPath::parse("/"), json!({"new": true}));
        assert_eq!(tree.snapshot(), json!({"new": true}));
    }

    #[test]
    fn save_clones_the_current_state() {
        let tree = MemoryTree::new();
        tree.insert(&DavPath::parse("/a"), json!(1));
        let snapshot = tree.save().expect("snapshot");
        tree.insert(&DavPath::parse("/a"), json!(2));
        assert_eq!(snapshot, json!({"a": 1}));
        assert_eq!(tree.snapshot(), json!({"a": 2}));
    }
}
