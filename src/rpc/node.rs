//! RPC tree nodes, held in one arena per tree rather than as a graph of
//! owned pointers — a node refers to its parent and children by
//! [`NodeId`], and the arena outlives every handle, so there is no
//! back-reference cycle to manage.

use heapless::String;

use crate::config::{
    MAX_RPC_METHOD_LEN, MAX_RPC_METHODS, MAX_RPC_NAME_LEN, MAX_RPC_NODES, MAX_RPC_RETURN_PARAMS_BYTES,
    MAX_RPC_SUBNODES, MAX_RPC_TREE_DEPTH,
};
use crate::containers::FixedArray;
use crate::error::RpcError;

/// An opaque handle to one node in an [`RpcTree`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(u16);

/// Buffer a method callback writes its return parameters into.
pub type ReturnParams = heapless::Vec<u8, MAX_RPC_RETURN_PARAMS_BYTES>;

/// A registered method: exact-name dispatch, no overloading.
pub type MethodFn = fn(params: &[u8], out: &mut ReturnParams) -> Result<(), RpcError>;

/// Invoked when no method under a node matches an incoming path. Returns
/// `true` if it handled the message (and therefore no `METHOD_DNE`/`NODE_DNE`
/// response should be published).
pub type CatchAllFn = fn(remaining_topic: &str, payload: &[u8]) -> bool;

struct MethodEntry {
    name: String<MAX_RPC_METHOD_LEN>,
    callback: MethodFn,
}

struct NodeRecord {
    name: String<MAX_RPC_NAME_LEN>,
    parent: Option<NodeId>,
    children: FixedArray<NodeId, MAX_RPC_SUBNODES>,
    methods: FixedArray<MethodEntry, MAX_RPC_METHODS>,
    catch_all: Option<CatchAllFn>,
}

/// The outcome of walking an incoming topic path against the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    MethodHandled,
    CatchAllHandled,
}

/// Arena of RPC nodes forming one tree. [`super::root::RpcRoot`] owns one
/// of these together with the MQTT client it is bound to.
pub struct RpcTree {
    nodes: FixedArray<NodeRecord, MAX_RPC_NODES>,
}

impl RpcTree {
    pub const fn new() -> Self {
        Self {
            nodes: FixedArray::new(),
        }
    }

    /// Create the tree's root node. Must be called exactly once, before
    /// any `add_child`.
    pub fn add_root(&mut self, name: &str) -> Result<NodeId, RpcError> {
        if !self.nodes.is_empty() {
            return Err(RpcError::Internal);
        }
        self.insert_node(name, None)
    }

    /// Add a child named `name` under `parent`. Fails if `parent` is
    /// already at [`MAX_RPC_SUBNODES`] children or the arena is full.
    pub fn add_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, RpcError> {
        if self.nodes.get(parent.0 as usize).is_none() {
            return Err(RpcError::NodeDoesNotExist);
        }
        let child = self.insert_node(name, Some(parent))?;
        let parent_record = self
            .nodes
            .get_mut(parent.0 as usize)
            .ok_or(RpcError::Internal)?;
        if !parent_record.children.append(child) {
            self.nodes.remove(child.0 as usize);
            return Err(RpcError::Internal);
        }
        Ok(child)
    }

    fn insert_node(&mut self, name: &str, parent: Option<NodeId>) -> Result<NodeId, RpcError> {
        let name = String::try_from(name).map_err(|_| RpcError::Internal)?;
        let record = NodeRecord {
            name,
            parent,
            children: FixedArray::new(),
            methods: FixedArray::new(),
            catch_all: None,
        };
        let id = NodeId(self.nodes.len() as u16);
        if !self.nodes.append(record) {
            return Err(RpcError::Internal);
        }
        Ok(id)
    }

    pub fn register_method(
        &mut self,
        node: NodeId,
        name: &str,
        callback: MethodFn,
    ) -> Result<(), RpcError> {
        let name = String::try_from(name).map_err(|_| RpcError::Internal)?;
        let record = self
            .nodes
            .get_mut(node.0 as usize)
            .ok_or(RpcError::NodeDoesNotExist)?;
        if !record.methods.append(MethodEntry { name, callback }) {
            return Err(RpcError::Internal);
        }
        Ok(())
    }

    pub fn set_catch_all(&mut self, node: NodeId, catch_all: CatchAllFn) -> Result<(), RpcError> {
        let record = self
            .nodes
            .get_mut(node.0 as usize)
            .ok_or(RpcError::NodeDoesNotExist)?;
        record.catch_all = Some(catch_all);
        Ok(())
    }

    pub fn name_of(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0 as usize).map(|r| r.name.as_str())
    }

    fn find_child(&self, node: NodeId, name: &str) -> Option<NodeId> {
        let record = self.nodes.get(node.0 as usize)?;
        record
            .children
            .iter()
            .find(|child| self.name_of(**child) == Some(name))
            .copied()
    }

    /// Ancestor names from root to `node`, inclusive, oldest first. Used to
    /// build the node's full topic path.
    pub fn ancestry(&self, node: NodeId) -> FixedArray<NodeId, MAX_RPC_TREE_DEPTH> {
        let mut reversed: FixedArray<NodeId, MAX_RPC_TREE_DEPTH> = FixedArray::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if !reversed.append(id) {
                break;
            }
            current = self.nodes.get(id.0 as usize).and_then(|r| r.parent);
        }
        let mut ordered: FixedArray<NodeId, MAX_RPC_TREE_DEPTH> = FixedArray::new();
        for i in (0..reversed.len()).rev() {
            ordered.append(*reversed.get(i).unwrap());
        }
        ordered
    }

    /// Walk `path` (already stripped of the root's own topic prefix and
    /// name) against the tree starting at `start`, dispatching to a
    /// matching method or to the first catch-all encountered.
    ///
    /// A path segment beginning with `::` names a method on the current
    /// node; any other segment must name a child to descend into.
    pub fn dispatch(
        &self,
        start: NodeId,
        path: &str,
        params: &[u8],
        out: &mut ReturnParams,
    ) -> Result<DispatchOutcome, RpcError> {
        let mut current = start;
        let mut segments = path.split('/').filter(|s| !s.is_empty());

        loop {
            let Some(segment) = segments.next() else {
                return Err(RpcError::MalformedPath);
            };

            if let Some(method_name) = segment.strip_prefix("::") {
                let record = self
                    .nodes
                    .get(current.0 as usize)
                    .ok_or(RpcError::NodeDoesNotExist)?;
                if let Some(entry) = record.methods.iter().find(|m| m.name.as_str() == method_name) {
                    (entry.callback)(params, out)?;
                    return Ok(DispatchOutcome::MethodHandled);
                }
                if let Some(catch_all) = record.catch_all {
                    if catch_all(segment, params) {
                        return Ok(DispatchOutcome::CatchAllHandled);
                    }
                }
                return Err(RpcError::MethodDoesNotExist);
            }

            match self.find_child(current, segment) {
                Some(child) => current = child,
                None => {
                    let record = self
                        .nodes
                        .get(current.0 as usize)
                        .ok_or(RpcError::NodeDoesNotExist)?;
                    if let Some(catch_all) = record.catch_all {
                        if catch_all(segment, params) {
                            return Ok(DispatchOutcome::CatchAllHandled);
                        }
                    }
                    return Err(RpcError::NodeDoesNotExist);
                }
            }
        }
    }
}

impl Default for RpcTree {
    fn default() -> Self {
        Self::new()
    }
}
