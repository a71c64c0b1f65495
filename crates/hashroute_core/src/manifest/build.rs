//! Instantiation of a manifest into a route tree.

use super::{ManifestError, RouteDecl, RouteManifest};
use crate::location::LocationSource;
use crate::tree::{NodeId, RouteTree};
use log::info;

/// Builds every registry of `manifest` under `parent`.
///
/// Each registry is assembled while detached and then appended to `parent`,
/// so attach hooks run once per route, outermost first.
///
/// # Errors
/// - Validation errors of the manifest.
/// - Route errors raised while attaching, e.g. a pattern that fails to compile.
pub fn build_into<L: LocationSource>(
    manifest: &RouteManifest,
    tree: &mut RouteTree<L>,
    parent: NodeId,
) -> Result<Vec<NodeId>, ManifestError> {
    manifest.validate()?;

    let mut registries = Vec::with_capacity(manifest.registries.len());
    for declaration in &manifest.registries {
        let registry = tree.create_registry();
        for route in &declaration.routes {
            let node = build_route(route, tree)?;
            tree.append_child(registry, node)?;
        }
        tree.append_child(parent, registry)?;
        registries.push(registry);
    }

    info!(
        "event=manifest_build module=manifest status=ok registries={} routes={}",
        registries.len(),
        manifest.route_count()
    );
    Ok(registries)
}

/// Creates a tree configured by `manifest` and builds it under the document.
pub fn build_tree<L: LocationSource>(
    manifest: &RouteManifest,
    location: L,
) -> Result<(RouteTree<L>, Vec<NodeId>), ManifestError> {
    let mut tree = RouteTree::with_config(location, manifest.config.clone());
    let document = tree.document();
    let registries = build_into(manifest, &mut tree, document)?;
    Ok((tree, registries))
}

fn build_route<L: LocationSource>(
    declaration: &RouteDecl,
    tree: &mut RouteTree<L>,
) -> Result<NodeId, ManifestError> {
    let route = tree.create_route(declaration.path.as_str());
    for label in &declaration.content {
        let text = tree.create_text(label.as_str());
        tree.append_child(route, text)?;
    }
    for child in &declaration.children {
        let node = build_route(child, tree)?;
        tree.append_child(route, node)?;
    }
    Ok(route)
}
