//! Task-id arena for fast graph traversal.
//!
//! Converts task-id strings to dense integer handles so the traversal code
//! works on array indices; strings appear only at the public boundary.

use rustc_hash::FxHashMap;

/// Arena handle for a task node (u32 for compact storage and fast hashing).
pub type NodeId = u32;

/// Maps task-id strings to dense integer handles.
#[derive(Debug, Clone, Default)]
pub struct TaskIndex {
    to_handle: FxHashMap<String, NodeId>,
    from_handle: Vec<String>,
}

impl TaskIndex {
    /// Create an index with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_handle: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_handle: Vec::with_capacity(capacity),
        }
    }

    /// Insert a task id, returning its handle.
    /// If already present, returns the existing handle.
    pub fn insert(&mut self, id: &str) -> NodeId {
        if let Some(&handle) = self.to_handle.get(id) {
            return handle;
        }
        let handle = self.from_handle.len() as NodeId;
        self.from_handle.push(id.to_string());
        self.to_handle.insert(id.to_string(), handle);
        handle
    }

    /// Get the handle for a task id, if it exists.
    #[inline]
    pub fn get(&self, id: &str) -> Option<NodeId> {
        self.to_handle.get(id).copied()
    }

    /// Get the task id for a handle.
    #[inline]
    pub fn resolve(&self, handle: NodeId) -> Option<&str> {
        self.from_handle.get(handle as usize).map(|s| s.as_str())
    }

    /// Number of indexed tasks.
    pub fn len(&self) -> usize {
        self.from_handle.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.from_handle.is_empty()
    }
}
