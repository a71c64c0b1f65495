//! Route lifecycle, path composition and mounting.
//!
//! # Responsibility
//! - Attach/detach routes to their nearest registry.
//! - Compose and cache the full path and compiled matcher.
//! - Mount or unmount the payload on evaluation.
//!
//! # Invariants
//! - Full path and matcher caches are dropped together on every attach.
//! - Full path = nearest ancestor route's full path + own fragment, or the
//!   configured root prefix + own fragment when no route sits between this
//!   route and its registry.
//! - Mount and unmount are no-ops when already in the target state.
//! - Evaluating a route that is not registered does nothing.

use super::{MountState, NodeId, NodeKind, RouteError, RouteResult, RouteTree};
use crate::location::LocationSource;
use crate::pattern::compiler::RouteMatcher;
use log::{debug, error};

impl<L: LocationSource> RouteTree<L> {
    /// Attach hook: resolves the owning registry and registers `node`.
    ///
    /// Skips registration when `node` is no longer connected, which happens
    /// when an earlier hook of the same insertion moved it out again.
    ///
    /// # Errors
    /// - `NotARoute` when `node` is not a route.
    /// - `NoOwningRegistry` when no registry sits above `node`. Nothing is
    ///   registered in that case.
    /// - `Pattern` when the composed path does not compile.
    pub fn attach(&mut self, node: NodeId) -> RouteResult<()> {
        self.route_state_mut(node)
            .ok_or(RouteError::NotARoute(node))?
            .invalidate();

        if !self.is_connected(node) {
            debug!(
                "event=route_attach module=route status=skipped node={} reason=disconnected",
                node
            );
            return Ok(());
        }

        let Some(registry) = self.nearest_ancestor(node, super::NodeRole::Registry) else {
            error!(
                "event=route_attach module=route status=error node={} error_code=no_owning_registry",
                node
            );
            return Err(RouteError::NoOwningRegistry(node));
        };

        let matcher = self.matcher(node)?;
        debug!(
            "event=route_attach module=route status=ok node={} registry={} full_path={}",
            node,
            registry,
            matcher.source_path()
        );
        self.register(registry, node)
    }

    /// Detach hook: deregisters `node` from its owning registry.
    ///
    /// Safe to call repeatedly and on routes whose attach never completed.
    pub fn detach(&mut self, node: NodeId) {
        let Some(owner) = self.owner(node) else {
            return;
        };
        self.deregister(owner, node);
        debug!(
            "event=route_detach module=route status=ok node={} registry={}",
            node, owner
        );
    }

    /// Returns the composed path of `node`, computing it on first use.
    ///
    /// # Errors
    /// - `NotARoute` when `node` is not a route.
    /// - `NoOwningRegistry` when the ancestor walk finds no registry.
    pub fn full_path(&mut self, node: NodeId) -> RouteResult<String> {
        let route = self.route_state(node).ok_or(RouteError::NotARoute(node))?;
        if let Some(cached) = &route.full_path {
            return Ok(cached.clone());
        }
        let fragment = route.fragment.clone();

        let prefix = match self.parent_route_below_registry(node)? {
            Some(parent_route) => self.full_path(parent_route)?,
            None => self.config.root_prefix.clone(),
        };
        let full_path = format!("{prefix}{fragment}");

        if let Some(route) = self.route_state_mut(node) {
            route.full_path = Some(full_path.clone());
        }
        Ok(full_path)
    }

    /// Returns the compiled matcher of `node`, compiling it on first use.
    pub fn matcher(&mut self, node: NodeId) -> RouteResult<RouteMatcher> {
        let route = self.route_state(node).ok_or(RouteError::NotARoute(node))?;
        if let Some(cached) = &route.matcher {
            return Ok(cached.clone());
        }

        let full_path = self.full_path(node)?;
        let matcher = self.patterns.get_or_compile(&full_path)?;
        if let Some(route) = self.route_state_mut(node) {
            route.matcher = Some(matcher.clone());
        }
        Ok(matcher)
    }

    /// Mounts or unmounts the payload of `node` for the current location.
    pub fn reevaluate(&mut self, node: NodeId) -> RouteResult<()> {
        if self.route_state(node).is_none() || !self.is_registered(node) {
            return Ok(());
        }

        let matcher = self.matcher(node)?;
        if matcher.is_match(self.location.current()) {
            self.mount(node)
        } else {
            self.unmount(node)
        }
    }

    /// Moves the held payload into the visible children.
    pub fn mount(&mut self, node: NodeId) -> RouteResult<()> {
        let route = self
            .route_state_mut(node)
            .ok_or(RouteError::NotARoute(node))?;
        if route.mount_state == MountState::Mounted {
            return Ok(());
        }
        route.mount_state = MountState::Mounted;

        let moved = self.release_payload(node)?;
        debug!(
            "event=route_mount module=route status=ok node={} moved={}",
            node,
            moved.len()
        );
        if self.is_connected(node) {
            return self.fire_attach_hooks(&moved);
        }
        Ok(())
    }

    /// Moves every visible child into the holding area.
    pub fn unmount(&mut self, node: NodeId) -> RouteResult<()> {
        let route = self
            .route_state_mut(node)
            .ok_or(RouteError::NotARoute(node))?;
        if route.mount_state == MountState::Unmounted {
            return Ok(());
        }
        route.mount_state = MountState::Unmounted;

        let moved = self.hold_payload(node)?;
        debug!(
            "event=route_unmount module=route status=ok node={} moved={}",
            node,
            moved.len()
        );
        if self.is_connected(node) {
            self.fire_detach_hooks(&moved);
        }
        Ok(())
    }

    /// Nearest ancestor route below the nearest registry, if any.
    fn parent_route_below_registry(&self, node: NodeId) -> RouteResult<Option<NodeId>> {
        let mut current = self.record(node)?.parent;
        while let Some(candidate) = current {
            let record = self.record(candidate)?;
            match record.kind {
                NodeKind::Registry(_) => return Ok(None),
                NodeKind::Route(_) => return Ok(Some(candidate)),
                _ => current = record.parent,
            }
        }
        Err(RouteError::NoOwningRegistry(node))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RouterConfig;
    use crate::location::MemoryLocation;
    use crate::tree::{MountState, RouteError, RouteTree};

    #[test]
    fn root_route_uses_configured_prefix() {
        let config = RouterConfig {
            root_prefix: "#!".to_string(),
        };
        let mut tree = RouteTree::with_config(MemoryLocation::new("#!/home"), config);
        let document = tree.document();
        let registry = tree.create_registry();
        let route = tree.create_route("/home");
        tree.append_child(registry, route).expect("declare route");
        tree.append_child(document, registry).expect("connect registry");

        assert_eq!(tree.full_path(route).expect("full path"), "#!/home");
        assert_eq!(tree.mount_state(route), Some(MountState::Mounted));
    }

    #[test]
    fn plain_elements_between_routes_are_transparent() {
        let mut tree = RouteTree::new(MemoryLocation::new("#/a/b"));
        let document = tree.document();
        let registry = tree.create_registry();
        let outer = tree.create_route("/a");
        let wrapper = tree.create_element("section");
        let inner = tree.create_route("/b");
        tree.append_child(document, registry).expect("connect registry");
        tree.append_child(registry, outer).expect("attach outer");
        tree.append_child(outer, wrapper).expect("append wrapper");
        tree.append_child(wrapper, inner).expect("append inner");

        assert_eq!(tree.full_path(inner).expect("full path"), "#/a/b");
        assert_eq!(tree.mount_state(inner), Some(MountState::Mounted));
    }

    #[test]
    fn empty_fragment_composes_as_noop() {
        let mut tree = RouteTree::new(MemoryLocation::new("#/a"));
        let document = tree.document();
        let registry = tree.create_registry();
        let outer = tree.create_route("/a");
        let inner = tree.create_route("");
        tree.append_child(document, registry).expect("connect registry");
        tree.append_child(registry, outer).expect("attach outer");
        tree.append_child(outer, inner).expect("attach inner");

        assert_eq!(tree.full_path(inner).expect("full path"), "#/a");
    }

    #[test]
    fn reevaluate_on_unattached_route_is_noop() {
        let mut tree = RouteTree::new(MemoryLocation::new("#/home"));
        let route = tree.create_route("/home");
        tree.reevaluate(route).expect("noop evaluation");
        assert_eq!(tree.mount_state(route), Some(MountState::Unmounted));
    }

    #[test]
    fn detach_is_safe_without_attach_and_when_repeated() {
        let mut tree = RouteTree::new(MemoryLocation::default());
        let route = tree.create_route("/home");
        tree.detach(route);
        tree.detach(route);
        assert!(!tree.is_registered(route));
    }

    #[test]
    fn attach_rejects_non_route() {
        let mut tree = RouteTree::new(MemoryLocation::default());
        let element = tree.create_element("div");
        assert_eq!(tree.attach(element), Err(RouteError::NotARoute(element)));
    }

    #[test]
    fn invalid_pattern_aborts_registration() {
        let mut tree = RouteTree::new(MemoryLocation::new("#/home"));
        let document = tree.document();
        let registry = tree.create_registry();
        let route = tree.create_route("/broken(");
        tree.append_child(document, registry).expect("connect registry");

        let err = tree
            .append_child(registry, route)
            .expect_err("bad pattern must fail");
        assert!(matches!(err, RouteError::Pattern(_)));
        assert!(tree.members(registry).is_empty());
    }
}
