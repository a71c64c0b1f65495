use hashroute_core::{
    MemoryLocation, MountState, NodeId, PatternCompiler, RouteError, RouteTree,
};

struct HomeSettings {
    tree: RouteTree,
    registry: NodeId,
    outer: NodeId,
    inner: NodeId,
}

/// Registry with `/home` containing `/settings`, both carrying text payload.
fn home_settings(location: &str) -> HomeSettings {
    let mut tree = RouteTree::new(MemoryLocation::new(location));
    let document = tree.document();
    let registry = tree.create_registry();
    tree.append_child(document, registry).unwrap();

    let outer = tree.create_route("/home");
    let inner = tree.create_route("/settings");
    let home_text = tree.create_text("Home");
    let settings_text = tree.create_text("Settings");
    tree.append_child(inner, settings_text).unwrap();
    tree.append_child(outer, home_text).unwrap();
    tree.append_child(outer, inner).unwrap();
    tree.append_child(registry, outer).unwrap();

    HomeSettings {
        tree,
        registry,
        outer,
        inner,
    }
}

#[test]
fn root_route_full_path_uses_sentinel_prefix() {
    let mut tree = RouteTree::new(MemoryLocation::new("#/home"));
    let document = tree.document();
    let registry = tree.create_registry();
    let route = tree.create_route("/home");
    tree.append_child(document, registry).unwrap();
    tree.append_child(registry, route).unwrap();

    assert_eq!(tree.full_path(route).unwrap(), "#/home");
    let matcher = tree.matcher(route).unwrap();
    assert!(matcher.is_match("#/home"));
    assert!(matcher.is_match("#/homepage"));
    assert!(!matcher.is_match("#/hom"));
    assert_eq!(tree.mount_state(route), Some(MountState::Mounted));
}

#[test]
fn nested_route_composes_with_ancestor_path() {
    let mut fixture = home_settings("#/home");
    let outer_path = fixture.tree.full_path(fixture.outer).unwrap();
    let inner_path = fixture.tree.full_path(fixture.inner).unwrap();

    assert_eq!(outer_path, "#/home");
    assert_eq!(inner_path, format!("{outer_path}/settings"));
    assert_eq!(inner_path, "#/home/settings");
}

#[test]
fn outer_mounts_while_inner_waits_for_narrower_location() {
    let mut fixture = home_settings("#/home");
    let tree = &mut fixture.tree;

    assert_eq!(tree.mount_state(fixture.outer), Some(MountState::Mounted));
    assert_eq!(tree.mount_state(fixture.inner), Some(MountState::Unmounted));
    assert_eq!(tree.children(fixture.outer).unwrap().len(), 2);
    assert!(tree.children(fixture.inner).unwrap().is_empty());
    assert_eq!(tree.payload(fixture.inner).unwrap().len(), 1);

    tree.navigate("#/home/settings").unwrap();
    assert_eq!(tree.mount_state(fixture.outer), Some(MountState::Mounted));
    assert_eq!(tree.mount_state(fixture.inner), Some(MountState::Mounted));
    assert!(tree.payload(fixture.inner).unwrap().is_empty());
    assert_eq!(tree.mounted_routes(), vec![fixture.outer, fixture.inner]);
}

#[test]
fn unmounting_outer_deregisters_inner_until_it_reenters() {
    let mut fixture = home_settings("#/home/settings");
    let tree = &mut fixture.tree;
    assert_eq!(tree.members(fixture.registry), vec![fixture.outer, fixture.inner]);

    tree.navigate("#/other").unwrap();
    assert_eq!(tree.mount_state(fixture.outer), Some(MountState::Unmounted));
    assert_eq!(tree.members(fixture.registry), vec![fixture.outer]);
    assert!(!tree.is_connected(fixture.inner));
    assert_eq!(tree.payload(fixture.outer).unwrap().len(), 2);

    // Reattaching outer while the location still misses keeps inner held.
    tree.remove(fixture.outer).unwrap();
    assert!(tree.members(fixture.registry).is_empty());
    tree.append_child(fixture.registry, fixture.outer).unwrap();
    assert_eq!(tree.members(fixture.registry), vec![fixture.outer]);
    assert!(!tree.is_registered(fixture.inner));

    tree.navigate("#/home").unwrap();
    assert!(tree.is_connected(fixture.inner));
    assert!(tree.is_registered(fixture.inner));
    assert_eq!(tree.mount_state(fixture.inner), Some(MountState::Unmounted));
}

#[test]
fn reevaluate_twice_relocates_payload_once() {
    let mut fixture = home_settings("#/home/settings");
    let tree = &mut fixture.tree;
    let before = tree.children(fixture.outer).unwrap().to_vec();

    tree.reevaluate(fixture.outer).unwrap();
    tree.reevaluate(fixture.outer).unwrap();

    assert_eq!(tree.children(fixture.outer).unwrap(), before.as_slice());
    assert!(tree.payload(fixture.outer).unwrap().is_empty());
    assert_eq!(tree.mount_state(fixture.outer), Some(MountState::Mounted));
    assert_eq!(tree.mount_state(fixture.inner), Some(MountState::Mounted));

    tree.navigate("#/nowhere").unwrap();
    let held = tree.payload(fixture.outer).unwrap().to_vec();
    tree.reevaluate(fixture.outer).unwrap();
    assert_eq!(tree.payload(fixture.outer).unwrap(), held.as_slice());
}

#[test]
fn reattach_under_new_chain_recomputes_full_path() {
    let mut tree = RouteTree::new(MemoryLocation::new("#/b"));
    let document = tree.document();
    let registry = tree.create_registry();
    let other_registry = tree.create_registry();
    let branch = tree.create_route("/b");
    let leaf = tree.create_route("/x");
    tree.append_child(document, registry).unwrap();
    tree.append_child(document, other_registry).unwrap();
    tree.append_child(registry, branch).unwrap();
    tree.append_child(registry, leaf).unwrap();
    assert_eq!(tree.full_path(leaf).unwrap(), "#/x");

    tree.append_child(branch, leaf).unwrap();
    assert_eq!(tree.full_path(leaf).unwrap(), "#/b/x");
    assert_eq!(tree.owner(leaf), Some(registry));

    tree.append_child(other_registry, leaf).unwrap();
    assert_eq!(tree.full_path(leaf).unwrap(), "#/x");
    assert_eq!(tree.owner(leaf), Some(other_registry));
    assert_eq!(tree.members(registry), vec![branch]);
    assert_eq!(tree.members(other_registry), vec![leaf]);
}

#[test]
fn route_without_registry_fails_to_attach() {
    let mut tree = RouteTree::new(MemoryLocation::new("#/home"));
    let document = tree.document();
    let container = tree.create_element("main");
    let route = tree.create_route("/home");
    tree.append_child(document, container).unwrap();

    let err = tree.append_child(container, route).unwrap_err();
    assert_eq!(err, RouteError::NoOwningRegistry(route));
    assert!(!tree.is_registered(route));
    assert_eq!(tree.owner(route), None);
    assert_eq!(tree.mount_state(route), Some(MountState::Unmounted));
}

#[test]
fn detached_subtree_defers_attach_until_connected() {
    let mut tree = RouteTree::new(MemoryLocation::new("#/home"));
    let registry = tree.create_registry();
    let route = tree.create_route("/home");
    tree.append_child(registry, route).unwrap();
    assert!(!tree.is_registered(route));
    assert_eq!(tree.cached_full_path(route), None);

    let document = tree.document();
    tree.append_child(document, registry).unwrap();
    assert!(tree.is_registered(route));
    assert_eq!(tree.cached_full_path(route), Some("#/home"));
}

#[test]
fn matcher_follows_compiler_anchoring() {
    let mut fixture = home_settings("#/home");
    let from_tree = fixture.tree.matcher(fixture.inner).unwrap();
    let direct = PatternCompiler::compile("#/home/settings").unwrap();
    assert_eq!(from_tree.as_str(), direct.as_str());
    assert_eq!(from_tree.as_str(), r"^#\/home\/settings");
}

#[test]
fn double_detach_is_tolerated() {
    let mut fixture = home_settings("#/home");
    let tree = &mut fixture.tree;
    tree.remove(fixture.outer).unwrap();
    tree.detach(fixture.outer);
    tree.detach(fixture.inner);
    assert!(tree.members(fixture.registry).is_empty());
}
