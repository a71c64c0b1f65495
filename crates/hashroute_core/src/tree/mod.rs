//! Route tree arena.
//!
//! # Responsibility
//! - Own every node record (document, elements, text, registries, routes).
//! - Answer structural queries: parent, children, connectivity, ancestors.
//! - Host the registry and route lifecycle implemented in submodules.
//!
//! # Invariants
//! - Node ids are never reused for the lifetime of one tree.
//! - A node sits in at most one position: a parent's visible children, or
//!   a route's payload holding area (`held`).
//! - Held nodes are never connected.
//! - A route id appears in at most one registry member set.
//!
//! # See also
//! - `host.rs` for insertion/removal and lifecycle hook dispatch.

mod host;
mod registry;
mod route;

use crate::config::RouterConfig;
use crate::location::{LocationSource, MemoryLocation};
use crate::pattern::compiler::{PatternCache, PatternError, RouteMatcher};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by route tree operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Stable arena index of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Errors from route tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// A route was attached with no registry anywhere above it.
    NoOwningRegistry(NodeId),
    /// Node id does not belong to this tree.
    NodeNotFound(NodeId),
    /// Operation requires a route node.
    NotARoute(NodeId),
    /// Operation requires a registry node.
    NotARegistry(NodeId),
    /// Target parent cannot hold children.
    InvalidParent(NodeId),
    /// Insertion would make a node its own ancestor.
    CycleDetected { node: NodeId, parent: NodeId },
    /// The document root cannot be inserted or removed.
    DocumentNotMovable,
    /// The composed route path failed to compile.
    Pattern(PatternError),
}

impl Display for RouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoOwningRegistry(id) => write!(f, "no registry found above route {id}"),
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::NotARoute(id) => write!(f, "node is not a route: {id}"),
            Self::NotARegistry(id) => write!(f, "node is not a registry: {id}"),
            Self::InvalidParent(id) => write!(f, "node cannot have children: {id}"),
            Self::CycleDetected { node, parent } => {
                write!(f, "insert would create cycle: node {node} under parent {parent}")
            }
            Self::DocumentNotMovable => write!(f, "document root cannot be moved"),
            Self::Pattern(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RouteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatternError> for RouteError {
    fn from(value: PatternError) -> Self {
        Self::Pattern(value)
    }
}

/// Structural role of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Document,
    Element,
    Text,
    Registry,
    Route,
}

/// Payload visibility of one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountState {
    /// Payload sits in the visible children.
    Mounted,
    /// Payload sits in the route's holding area.
    #[default]
    Unmounted,
}

#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    pub(crate) members: BTreeSet<NodeId>,
    pub(crate) listening: bool,
}

#[derive(Debug)]
pub(crate) struct RouteState {
    pub(crate) fragment: String,
    pub(crate) full_path: Option<String>,
    pub(crate) matcher: Option<RouteMatcher>,
    pub(crate) owner: Option<NodeId>,
    pub(crate) held: Vec<NodeId>,
    pub(crate) mount_state: MountState,
}

impl RouteState {
    fn new(fragment: String) -> Self {
        Self {
            fragment,
            full_path: None,
            matcher: None,
            owner: None,
            held: Vec::new(),
            mount_state: MountState::Unmounted,
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.full_path = None;
        self.matcher = None;
    }
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Document,
    Element { tag: String },
    Text { text: String },
    Registry(RegistryState),
    Route(RouteState),
}

#[derive(Debug)]
pub(crate) struct NodeRecord {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    /// `true` when the node sits in its parent route's holding area.
    pub(crate) held: bool,
    pub(crate) children: Vec<NodeId>,
}

impl NodeRecord {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            held: false,
            children: Vec::new(),
        }
    }

    fn role(&self) -> NodeRole {
        match self.kind {
            NodeKind::Document => NodeRole::Document,
            NodeKind::Element { .. } => NodeRole::Element,
            NodeKind::Text { .. } => NodeRole::Text,
            NodeKind::Registry(_) => NodeRole::Registry,
            NodeKind::Route(_) => NodeRole::Route,
        }
    }
}

/// Owned tree of routing nodes plus the location they are matched against.
pub struct RouteTree<L: LocationSource = MemoryLocation> {
    nodes: Vec<NodeRecord>,
    document: NodeId,
    location: L,
    config: RouterConfig,
    patterns: PatternCache,
    listeners: BTreeSet<NodeId>,
}

impl<L: LocationSource> RouteTree<L> {
    /// Creates an empty tree with default configuration.
    pub fn new(location: L) -> Self {
        Self::with_config(location, RouterConfig::default())
    }

    /// Creates an empty tree holding only the document root.
    pub fn with_config(location: L, config: RouterConfig) -> Self {
        Self {
            nodes: vec![NodeRecord::new(NodeKind::Document)],
            document: NodeId(0),
            location,
            config,
            patterns: PatternCache::new(),
            listeners: BTreeSet::new(),
        }
    }

    /// Returns the always-connected document root.
    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    /// Mutable access to the location; callers deliver the change signal
    /// through [`RouteTree::location_changed`].
    pub fn location_mut(&mut self) -> &mut L {
        &mut self.location
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Creates a detached plain element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeKind::Element { tag: tag.into() })
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text { text: text.into() })
    }

    /// Creates a detached registry.
    pub fn create_registry(&mut self) -> NodeId {
        self.push(NodeKind::Registry(RegistryState::default()))
    }

    /// Creates a detached, unmounted route with `fragment` as its own path.
    pub fn create_route(&mut self, fragment: impl Into<String>) -> NodeId {
        self.push(NodeKind::Route(RouteState::new(fragment.into())))
    }

    pub fn role(&self, id: NodeId) -> RouteResult<NodeRole> {
        Ok(self.record(id)?.role())
    }

    pub fn parent(&self, id: NodeId) -> RouteResult<Option<NodeId>> {
        Ok(self.record(id)?.parent)
    }

    /// Visible children of `id`.
    pub fn children(&self, id: NodeId) -> RouteResult<&[NodeId]> {
        Ok(self.record(id)?.children.as_slice())
    }

    /// Payload held by an unmounted route. Empty for other nodes.
    pub fn payload(&self, id: NodeId) -> RouteResult<&[NodeId]> {
        match &self.record(id)?.kind {
            NodeKind::Route(route) => Ok(route.held.as_slice()),
            _ => Ok(&[]),
        }
    }

    /// Text content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn fragment(&self, id: NodeId) -> Option<&str> {
        self.route_state(id).map(|route| route.fragment.as_str())
    }

    pub fn mount_state(&self, id: NodeId) -> Option<MountState> {
        self.route_state(id).map(|route| route.mount_state)
    }

    /// Registry recorded on the last attach of `id`.
    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        self.route_state(id).and_then(|route| route.owner)
    }

    /// Full path cached since the last attach, without computing it.
    pub fn cached_full_path(&self, id: NodeId) -> Option<&str> {
        self.route_state(id)
            .and_then(|route| route.full_path.as_deref())
    }

    /// Current members of one registry.
    pub fn members(&self, registry: NodeId) -> Vec<NodeId> {
        self.registry_state(registry)
            .map(|state| state.members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns whether `id` reaches the document root through visible links.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.document {
                return true;
            }
            let Some(record) = self.nodes.get(current.0) else {
                return false;
            };
            if record.held {
                return false;
            }
            match record.parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Nearest strict ancestor of `id` with `role`.
    pub fn nearest_ancestor(&self, id: NodeId, role: NodeRole) -> Option<NodeId> {
        let mut current = self.nodes.get(id.0)?.parent;
        while let Some(candidate) = current {
            let record = self.nodes.get(candidate.0)?;
            if record.role() == role {
                return Some(candidate);
            }
            current = record.parent;
        }
        None
    }

    /// Registered routes that are currently mounted, in tree order.
    pub fn mounted_routes(&self) -> Vec<NodeId> {
        let mut mounted = Vec::new();
        for id in self.subtree(self.document) {
            if self.mount_state(id) == Some(MountState::Mounted) && self.is_registered(id) {
                mounted.push(id);
            }
        }
        mounted
    }

    /// Indented text dump of the connected tree and every held payload.
    pub fn render_outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(self.document, 0, &mut out);
        out
    }

    fn write_outline(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(record) = self.nodes.get(id.0) else {
            return;
        };
        let indent = "  ".repeat(depth);
        let line = match &record.kind {
            NodeKind::Document => format!("{indent}document"),
            NodeKind::Element { tag } => format!("{indent}<{tag}> {id}"),
            NodeKind::Text { text } => format!("{indent}{text:?} {id}"),
            NodeKind::Registry(state) => {
                format!("{indent}registry {id} members={}", state.members.len())
            }
            NodeKind::Route(route) => format!(
                "{indent}route {id} path={} state={:?}",
                route.full_path.as_deref().unwrap_or(route.fragment.as_str()),
                route.mount_state
            ),
        };
        out.push_str(&line);
        out.push('\n');
        for child in &record.children {
            self.write_outline(*child, depth + 1, out);
        }
        if let NodeKind::Route(route) = &record.kind {
            for held in &route.held {
                out.push_str(&format!("{indent}  (held)\n"));
                self.write_outline(*held, depth + 2, out);
            }
        }
    }

    /// Pre-order walk over visible descendants, including `root`.
    pub(crate) fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(record) = self.nodes.get(id.0) else {
                continue;
            };
            order.push(id);
            stack.extend(record.children.iter().rev().copied());
        }
        order
    }

    pub(crate) fn record(&self, id: NodeId) -> RouteResult<&NodeRecord> {
        self.nodes.get(id.0).ok_or(RouteError::NodeNotFound(id))
    }

    pub(crate) fn record_mut(&mut self, id: NodeId) -> RouteResult<&mut NodeRecord> {
        self.nodes.get_mut(id.0).ok_or(RouteError::NodeNotFound(id))
    }

    pub(crate) fn route_state(&self, id: NodeId) -> Option<&RouteState> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Route(route) => Some(route),
            _ => None,
        }
    }

    pub(crate) fn route_state_mut(&mut self, id: NodeId) -> Option<&mut RouteState> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Route(route) => Some(route),
            _ => None,
        }
    }

    pub(crate) fn registry_state(&self, id: NodeId) -> Option<&RegistryState> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Registry(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn registry_state_mut(&mut self, id: NodeId) -> Option<&mut RegistryState> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Registry(state) => Some(state),
            _ => None,
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeRecord::new(kind));
        id
    }
}

impl RouteTree<MemoryLocation> {
    /// Sets the location and delivers the change signal.
    pub fn navigate(&mut self, location: impl Into<String>) -> RouteResult<()> {
        self.location.set(location);
        self.location_changed()
    }
}
