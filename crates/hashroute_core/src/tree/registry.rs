//! Registry membership and location-change dispatch.
//!
//! # Responsibility
//! - Track which routes are attached under each registry.
//! - Subscribe connected registries to the location-change signal.
//! - Re-evaluate every member when the signal arrives.
//!
//! # Invariants
//! - Dispatch walks a snapshot of the member set taken when it starts.
//!   A snapshot member that was deregistered before being reached is skipped.
//! - Registries know nothing about paths.

use super::{NodeId, RouteError, RouteResult, RouteTree};
use crate::location::LocationSource;
use log::{debug, info, warn};

impl<L: LocationSource> RouteTree<L> {
    /// Adds `node` to `registry` and evaluates it right away.
    ///
    /// Registering an existing member only re-runs evaluation. A route owned
    /// by another registry is first removed from that registry.
    ///
    /// # Errors
    /// - `NodeNotFound` when either id does not belong to this tree.
    /// - `NotARoute` / `NotARegistry` when an id has the wrong role. Nothing
    ///   changes in that case.
    pub fn register(&mut self, registry: NodeId, node: NodeId) -> RouteResult<()> {
        self.record(node)?;
        if self.route_state(node).is_none() {
            return Err(RouteError::NotARoute(node));
        }
        self.record(registry)?;
        if self.registry_state(registry).is_none() {
            return Err(RouteError::NotARegistry(registry));
        }

        let previous = self.owner(node).filter(|owner| *owner != registry);
        if let Some(previous) = previous {
            self.deregister(previous, node);
        }

        let Some(state) = self.registry_state_mut(registry) else {
            return Err(RouteError::NotARegistry(registry));
        };
        let inserted = state.members.insert(node);
        let member_count = state.members.len();
        if let Some(route) = self.route_state_mut(node) {
            route.owner = Some(registry);
        }
        debug!(
            "event=route_register module=registry status=ok registry={} node={} inserted={} members={}",
            registry, node, inserted, member_count
        );

        self.reevaluate(node)
    }

    /// Removes `node` from `registry`. No-op when it is not a member.
    pub fn deregister(&mut self, registry: NodeId, node: NodeId) {
        let Some(state) = self.registry_state_mut(registry) else {
            return;
        };
        if state.members.remove(&node) {
            debug!(
                "event=route_deregister module=registry status=ok registry={} node={} members={}",
                registry,
                node,
                state.members.len()
            );
        }
    }

    /// Returns whether `node` is currently a member of its owning registry.
    pub fn is_registered(&self, node: NodeId) -> bool {
        self.owner(node)
            .and_then(|owner| self.registry_state(owner))
            .is_some_and(|state| state.members.contains(&node))
    }

    /// Re-evaluates every member of `registry` against the current location.
    ///
    /// Evaluation may unmount subtrees and so deregister other members while
    /// the walk is in progress. Every member is visited; the first error is
    /// returned after the walk completes.
    pub fn on_location_changed(&mut self, registry: NodeId) -> RouteResult<()> {
        let snapshot = self.members(registry);
        let mut evaluated = 0usize;
        let mut skipped = 0usize;
        let mut first_error = None;

        for node in snapshot {
            let still_member = self
                .registry_state(registry)
                .is_some_and(|state| state.members.contains(&node));
            if !still_member {
                skipped += 1;
                continue;
            }
            evaluated += 1;
            if let Err(err) = self.reevaluate(node) {
                warn!(
                    "event=route_evaluate module=registry status=error registry={} node={} error={}",
                    registry, node, err
                );
                first_error.get_or_insert(err);
            }
        }

        debug!(
            "event=location_dispatch module=registry status=ok registry={} evaluated={} skipped={}",
            registry, evaluated, skipped
        );
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Delivers the location-change signal to every subscribed registry.
    pub fn location_changed(&mut self) -> RouteResult<()> {
        let snapshot: Vec<NodeId> = self.listeners.iter().copied().collect();
        let mut first_error = None;
        for registry in snapshot {
            if !self.listeners.contains(&registry) {
                continue;
            }
            if let Err(err) = self.on_location_changed(registry) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Returns whether `registry` is subscribed to location changes.
    pub fn is_listening(&self, registry: NodeId) -> bool {
        self.registry_state(registry)
            .is_some_and(|state| state.listening)
    }

    pub(crate) fn connect_registry(&mut self, registry: NodeId) {
        if !self.is_connected(registry) {
            return;
        }
        let Some(state) = self.registry_state_mut(registry) else {
            return;
        };
        if state.listening {
            return;
        }
        state.listening = true;
        self.listeners.insert(registry);
        info!(
            "event=registry_connect module=registry status=ok registry={}",
            registry
        );
    }

    pub(crate) fn disconnect_registry(&mut self, registry: NodeId) {
        let Some(state) = self.registry_state_mut(registry) else {
            return;
        };
        if !state.listening {
            return;
        }
        state.listening = false;
        self.listeners.remove(&registry);
        info!(
            "event=registry_disconnect module=registry status=ok registry={}",
            registry
        );
    }
}
