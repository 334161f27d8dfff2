use crate::interpolate::resolve_all_refs;
use flowview_core::binding::PathSegment;
use flowview_core::view::{Node, NodeResolveOptions, NodeType};
use flowview_core::{NodeId, ResolvedValue, Resolver, ViewPlugin};
use serde::Deserialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

const DEFAULT_PROPERTIES_TO_SKIP: &[&str] = &["exp"];

type SkipCache = Rc<RefCell<HashMap<String, HashSet<String>>>>;

/// Resolves `{{binding}}` and `@[expression]@` references in the string
/// values of assets, views and value nodes.
///
/// Properties named in `properties_to_skip` (by default `exp`) are left as
/// authored. An asset or view can replace that list with
/// `plugins.stringResolver.propertiesToSkip` in its own value; entries of
/// arrays directly under that asset inherit its list.
#[derive(Debug)]
pub struct StringResolverPlugin {
    default_skip: HashSet<String>,
    skip_by_asset: SkipCache,
}

impl Default for StringResolverPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl StringResolverPlugin {
    /// Plugin skipping `exp` properties
    pub fn new() -> Self {
        Self::with_properties_to_skip(DEFAULT_PROPERTIES_TO_SKIP.iter().copied())
    }

    /// Plugin skipping the given properties unless an asset overrides them
    pub fn with_properties_to_skip<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            default_skip: properties.into_iter().map(Into::into).collect(),
            skip_by_asset: Rc::new(RefCell::new(HashMap::new())),
        }
    }
}

/// `plugins.stringResolver` section of an asset
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetConfig {
    properties_to_skip: Vec<String>,
}

fn asset_properties_to_skip(value: Option<&Value>) -> Option<HashSet<String>> {
    let section = value?.pointer("/plugins/stringResolver")?;
    let config: AssetConfig = serde_json::from_value(section.clone()).ok()?;
    Some(config.properties_to_skip.into_iter().collect())
}

fn properties_to_skip(
    node: &Node,
    options: &NodeResolveOptions,
    default_skip: &HashSet<String>,
    cache: &SkipCache,
) -> HashSet<String> {
    if matches!(node.node_type(), NodeType::Asset | NodeType::View) {
        let skip = asset_properties_to_skip(node.raw_value()).unwrap_or_else(|| default_skip.clone());
        if let Some(id) = node.id() {
            cache.borrow_mut().insert(id.to_string(), skip.clone());
        }
        return skip;
    }

    let arena = options.arena();
    let inherited = options
        .node
        .and_then(|id| arena.parent(id))
        .filter(|parent| {
            arena
                .get(*parent)
                .map_or(false, |p| p.node_type() == NodeType::MultiNode)
        })
        .and_then(|parent| arena.parent(parent))
        .and_then(|owner| arena.get(owner))
        .filter(|owner| matches!(owner.node_type(), NodeType::Asset | NodeType::View))
        .and_then(|owner| owner.id().and_then(|id| cache.borrow().get(id).cloned()));

    inherited.unwrap_or_else(|| default_skip.clone())
}

/// Path of `node` inside the closest ancestor that has children entries
fn find_base_path(options: &NodeResolveOptions, node: NodeId) -> Vec<PathSegment> {
    let arena = options.arena();
    let Some(parent_id) = arena.parent(node) else {
        return Vec::new();
    };
    let Some(parent) = arena.get(parent_id) else {
        return Vec::new();
    };

    if parent.has_children() {
        let original = options.source_node(node).unwrap_or(node);
        return parent
            .children()
            .iter()
            .find(|child| child.value == original)
            .map(|child| child.path.clone())
            .unwrap_or_default();
    }

    if parent.node_type() != NodeType::MultiNode {
        return Vec::new();
    }

    find_base_path(options, parent_id)
}

impl ViewPlugin for StringResolverPlugin {
    fn name(&self) -> &str {
        "string-resolver"
    }

    fn apply_resolver(&self, resolver: &Rc<Resolver>) {
        let default_skip = self.default_skip.clone();
        let cache = Rc::clone(&self.skip_by_asset);

        resolver.hooks.resolve.tap(self.name(), move |value, node, options| {
            match node.node_type() {
                NodeType::Empty | NodeType::Unknown => Ok(None),
                NodeType::Value | NodeType::Asset | NodeType::View => {
                    let Some(raw) = node.raw_value() else {
                        return Ok(value);
                    };
                    let skip = properties_to_skip(node, options, &default_skip, &cache);

                    let in_skipped_property = options.node.map_or(false, |id| {
                        find_base_path(options, id)
                            .iter()
                            .any(|segment| skip.contains(&segment.as_key()))
                    });
                    if in_skipped_property {
                        return Ok(Some(ResolvedValue::from_json(raw)));
                    }

                    let resolved = resolve_all_refs(raw, options, &skip)?;
                    Ok(Some(ResolvedValue::from_json(&resolved)))
                }
                _ => Ok(value),
            }
        });
    }
}
