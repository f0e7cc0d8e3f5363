//! Hierarchical naming directory scoped to one application.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]; each node knows its parent and
//! indexes its children by segment. The root stands for the application itself. Nodes are
//! created lazily the first time a prefix is referenced and never removed.
use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;

use crate::{
    error::{QueueError, Result},
    queue::check_destination,
    sender::{Sender, SenderFactory},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// Resolver bound at a destination: only the destination string plus the stateless factory.
#[derive(Clone)]
pub struct Binding {
    destination: String,
    factory: Arc<SenderFactory>,
}

impl Binding {
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn resolve(&self, session_id: Option<&str>) -> Result<Sender> {
        self.factory.create_sender(&self.destination, session_id)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("destination", &self.destination)
            .finish()
    }
}

struct Node {
    segment: String,
    parent: Option<NodeId>,
    children: HashMap<String, NodeId>,
    // full destination -> binding
    bindings: HashMap<String, Binding>,
}

impl Node {
    fn new(segment: String, parent: Option<NodeId>) -> Self {
        Self {
            segment,
            parent,
            children: HashMap::new(),
            bindings: HashMap::new(),
        }
    }
}

pub struct NamingTree {
    nodes: RwLock<Vec<Node>>,
}

impl fmt::Debug for NamingTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamingTree")
            .field("nodes", &self.nodes.read().len())
            .finish()
    }
}

impl NamingTree {
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            nodes: RwLock::new(vec![Node::new(application.into(), None)]),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Child of `parent` named `segment`, if it was created.
    pub fn lookup(&self, parent: NodeId, segment: &str) -> Option<NodeId> {
        self.nodes
            .read()
            .get(parent.0)
            .and_then(|node| node.children.get(segment).copied())
    }

    /// Walk a slash-delimited prefix from the root without creating anything.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let nodes = self.nodes.read();
        let mut current = NodeId::ROOT;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = *nodes.get(current.0)?.children.get(segment)?;
        }
        Some(current)
    }

    /// Get-or-create every node on the way to the parent of the last segment of
    /// `destination`, then bind `destination` there. Rebinding overwrites.
    pub fn bind(&self, destination: &str, factory: Arc<SenderFactory>) -> Result<NodeId> {
        check_destination(destination).map_err(|reason| QueueError::InvalidDestination {
            destination: destination.to_string(),
            reason,
        })?;
        let segments: Vec<&str> = destination.split('/').collect();
        let parents = &segments[..segments.len() - 1];

        // 整个遍历持有写锁：部署期单写者，创建与绑定原子完成
        let mut nodes = self.nodes.write();
        let mut current = NodeId::ROOT;
        for segment in parents {
            current = match nodes[current.0].children.get(*segment) {
                Some(child) => *child,
                None => {
                    let child = NodeId(nodes.len());
                    nodes.push(Node::new(segment.to_string(), Some(current)));
                    nodes[current.0].children.insert(segment.to_string(), child);
                    tracing::trace!(segment = %segment, node = child.0, "naming node created");
                    child
                }
            };
        }
        let binding = Binding {
            destination: destination.to_string(),
            factory,
        };
        if nodes[current.0]
            .bindings
            .insert(destination.to_string(), binding)
            .is_some()
        {
            tracing::debug!(destination = %destination, "naming binding replaced");
        }
        Ok(current)
    }

    /// Binding registered for the full `destination`.
    pub fn binding(&self, destination: &str) -> Option<Binding> {
        let parent = match destination.rsplit_once('/') {
            Some((prefix, _)) => self.find(prefix)?,
            None => NodeId::ROOT,
        };
        self.nodes
            .read()
            .get(parent.0)
            .and_then(|node| node.bindings.get(destination).cloned())
    }

    /// Resolve a bound destination into a freshly built sender.
    pub fn resolve(&self, destination: &str, session_id: Option<&str>) -> Result<Sender> {
        let binding = self
            .binding(destination)
            .ok_or_else(|| QueueError::NotFound(destination.to_string()))?;
        binding.resolve(session_id)
    }

    /// Destinations bound directly at `node`, sorted.
    pub fn bindings_at(&self, node: NodeId) -> Vec<String> {
        let nodes = self.nodes.read();
        let mut out: Vec<String> = nodes
            .get(node.0)
            .map(|n| n.bindings.keys().cloned().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    /// Slash-joined path of `node` below the root; the root itself yields `""`.
    pub fn path_of(&self, node: NodeId) -> Option<String> {
        let nodes = self.nodes.read();
        let mut parts = Vec::new();
        let mut current = nodes.get(node.0)?;
        while let Some(parent) = current.parent {
            parts.push(current.segment.as_str());
            current = &nodes[parent.0];
        }
        parts.reverse();
        Some(parts.join("/"))
    }

    pub fn application(&self) -> String {
        self.nodes.read()[NodeId::ROOT.0].segment.clone()
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        // 根节点始终存在
        false
    }
}
