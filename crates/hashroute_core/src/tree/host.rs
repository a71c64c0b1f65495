//! Tree mutation and lifecycle hook dispatch.
//!
//! # Responsibility
//! - Insert, remove and reparent nodes with DOM-like semantics.
//! - Fire attach hooks when a subtree becomes connected and detach hooks
//!   when it stops being connected.
//!
//! # Invariants
//! - Hooks run synchronously, in tree order, after the structural change.
//! - The hook list is snapshotted before dispatch; each attach hook
//!   rechecks connectivity because an earlier hook may have moved it out.
//! - Children appended to an unmounted route join its payload holding area.

use super::{NodeId, NodeKind, NodeRole, RouteError, RouteResult, RouteTree};
use crate::location::LocationSource;
use log::debug;

impl<L: LocationSource> RouteTree<L> {
    /// Appends `child` as the last child of `parent`, moving it if needed.
    ///
    /// Every registry and route in a newly connected subtree gets its attach
    /// hook. All hooks run even if one fails.
    ///
    /// # Errors
    /// - `NodeNotFound` for unknown ids.
    /// - `DocumentNotMovable` when `child` is the document root.
    /// - `InvalidParent` when `parent` is a text node.
    /// - `CycleDetected` when `child` is `parent` or one of its ancestors.
    /// - The first error raised by an attach hook, e.g. `NoOwningRegistry`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> RouteResult<()> {
        let parent_role = self.role(parent)?;
        self.record(child)?;
        if child == self.document {
            return Err(RouteError::DocumentNotMovable);
        }
        if parent_role == NodeRole::Text {
            return Err(RouteError::InvalidParent(parent));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(RouteError::CycleDetected {
                node: child,
                parent,
            });
        }

        self.remove(child)?;

        let into_holding = self.holds_payload(parent);
        self.link(parent, child, into_holding)?;
        debug!(
            "event=node_insert module=tree status=ok node={} parent={} held={}",
            child, parent, into_holding
        );

        if !into_holding && self.is_connected(parent) {
            return self.fire_attach_hooks(&[child]);
        }
        Ok(())
    }

    /// Removes `id` from its current position. No-op for parentless nodes.
    ///
    /// Registries and routes that were connected get their detach hook.
    pub fn remove(&mut self, id: NodeId) -> RouteResult<()> {
        if id == self.document {
            return Err(RouteError::DocumentNotMovable);
        }
        if self.record(id)?.parent.is_none() {
            return Ok(());
        }

        let was_connected = self.is_connected(id);
        self.unlink(id)?;
        debug!(
            "event=node_remove module=tree status=ok node={} was_connected={}",
            id, was_connected
        );
        if was_connected {
            self.fire_detach_hooks(&[id]);
        }
        Ok(())
    }

    /// Returns whether `ancestor` is a strict ancestor of `id`, following
    /// payload holding links as well as visible ones.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.nodes.get(id.0).and_then(|record| record.parent);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.nodes.get(candidate.0).and_then(|record| record.parent);
        }
        false
    }

    /// Runs attach hooks for every registry and route under `roots`.
    pub(crate) fn fire_attach_hooks(&mut self, roots: &[NodeId]) -> RouteResult<()> {
        let mut pending = Vec::new();
        for root in roots {
            pending.extend(self.subtree(*root));
        }

        let mut first_error = None;
        for id in pending {
            let result = match self.role(id)? {
                NodeRole::Registry => {
                    self.connect_registry(id);
                    Ok(())
                }
                NodeRole::Route => self.attach(id),
                _ => Ok(()),
            };
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Runs detach hooks for every registry and route under `roots`.
    pub(crate) fn fire_detach_hooks(&mut self, roots: &[NodeId]) {
        let mut pending = Vec::new();
        for root in roots {
            pending.extend(self.subtree(*root));
        }

        for id in pending {
            match self.nodes.get(id.0).map(|record| &record.kind) {
                Some(NodeKind::Registry(_)) => self.disconnect_registry(id),
                Some(NodeKind::Route(_)) => self.detach(id),
                _ => {}
            }
        }
    }

    fn holds_payload(&self, parent: NodeId) -> bool {
        self.route_state(parent)
            .is_some_and(|route| route.mount_state == super::MountState::Unmounted)
    }

    fn link(&mut self, parent: NodeId, child: NodeId, held: bool) -> RouteResult<()> {
        if held {
            let route = self
                .route_state_mut(parent)
                .ok_or(RouteError::NotARoute(parent))?;
            route.held.push(child);
        } else {
            self.record_mut(parent)?.children.push(child);
        }
        let record = self.record_mut(child)?;
        record.parent = Some(parent);
        record.held = held;
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) -> RouteResult<()> {
        let record = self.record_mut(id)?;
        let Some(parent) = record.parent.take() else {
            return Ok(());
        };
        let held = std::mem::replace(&mut record.held, false);

        if held {
            if let Some(route) = self.route_state_mut(parent) {
                route.held.retain(|other| *other != id);
            }
        } else {
            self.record_mut(parent)?.children.retain(|other| *other != id);
        }
        Ok(())
    }

    /// Moves every held payload node of `route` into its visible children.
    pub(crate) fn release_payload(&mut self, route: NodeId) -> RouteResult<Vec<NodeId>> {
        let state = self
            .route_state_mut(route)
            .ok_or(RouteError::NotARoute(route))?;
        let moved = std::mem::take(&mut state.held);
        for id in &moved {
            self.record_mut(*id)?.held = false;
        }
        self.record_mut(route)?.children.extend(moved.iter().copied());
        Ok(moved)
    }

    /// Moves every visible child of `route` into its holding area.
    pub(crate) fn hold_payload(&mut self, route: NodeId) -> RouteResult<Vec<NodeId>> {
        let moved = std::mem::take(&mut self.record_mut(route)?.children);
        for id in &moved {
            self.record_mut(*id)?.held = true;
        }
        let state = self
            .route_state_mut(route)
            .ok_or(RouteError::NotARoute(route))?;
        state.held.extend(moved.iter().copied());
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use crate::location::MemoryLocation;
    use crate::tree::{RouteError, RouteTree};

    #[test]
    fn append_moves_node_between_parents() {
        let mut tree = RouteTree::new(MemoryLocation::default());
        let first = tree.create_element("div");
        let second = tree.create_element("div");
        let leaf = tree.create_text("leaf");
        tree.append_child(first, leaf).expect("append leaf");
        tree.append_child(second, leaf).expect("move leaf");

        assert!(tree.children(first).expect("first exists").is_empty());
        assert_eq!(tree.children(second).expect("second exists"), &[leaf]);
        assert_eq!(tree.parent(leaf), Ok(Some(second)));
    }

    #[test]
    fn append_rejects_cycles_and_text_parents() {
        let mut tree = RouteTree::new(MemoryLocation::default());
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        let text = tree.create_text("leaf");
        tree.append_child(outer, inner).expect("append inner");

        assert_eq!(
            tree.append_child(inner, outer),
            Err(RouteError::CycleDetected {
                node: outer,
                parent: inner
            })
        );
        assert_eq!(
            tree.append_child(text, inner),
            Err(RouteError::InvalidParent(text))
        );
        let document = tree.document();
        assert_eq!(
            tree.append_child(outer, document),
            Err(RouteError::DocumentNotMovable)
        );
    }

    #[test]
    fn children_of_unmounted_route_are_held() {
        let mut tree = RouteTree::new(MemoryLocation::default());
        let route = tree.create_route("/home");
        let text = tree.create_text("Home");
        tree.append_child(route, text).expect("append payload");

        assert!(tree.children(route).expect("route exists").is_empty());
        assert_eq!(tree.payload(route).expect("route exists"), &[text]);
        assert_eq!(tree.parent(text), Ok(Some(route)));
        assert!(tree.is_ancestor(route, text));
    }

    #[test]
    fn remove_detached_node_is_noop() {
        let mut tree = RouteTree::new(MemoryLocation::default());
        let element = tree.create_element("div");
        tree.remove(element).expect("noop remove");
        tree.remove(element).expect("second noop remove");
        assert_eq!(tree.parent(element), Ok(None));
    }
}
