use flowview_core::hooks::SyncWaterfallHook;
use flowview_core::view::{Node, NodeType, ParseObjectOptions, Parser};
use flowview_core::{Binding, CoreError, DataModel, NodeId, Resolver, ViewPlugin};
use regex::{NoExpand, Regex};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// A replacement applied to the serialized template of each entry
#[derive(Debug, Clone)]
pub struct TemplateSubstitution {
    /// What to replace; every match is replaced
    pub expression: Regex,
    /// Replacement text, inserted literally
    pub value: String,
}

/// The entry a set of substitutions is computed for
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateItemInfo {
    /// Position of the entry in the data array
    pub index: usize,
    /// The entry itself
    pub data: Value,
    /// Nesting depth of the template
    pub depth: usize,
}

/// Tap signature of [`TemplateHooks::resolve_template_substitutions`]
pub type ResolveSubstitutions =
    dyn Fn(Vec<TemplateSubstitution>, &TemplateItemInfo) -> Vec<TemplateSubstitution>;

/// Hooks of the [`TemplatePlugin`]
#[derive(Debug, Default)]
pub struct TemplateHooks {
    /// Adjust the substitutions for one entry; seeded with the `_index_` replacement
    pub resolve_template_substitutions: SyncWaterfallHook<ResolveSubstitutions>,
}

struct TemplateInner {
    model: Rc<dyn DataModel>,
    hooks: TemplateHooks,
}

/// Expands `template` entries into one node per element of a data array.
///
/// Static templates expand while the view is parsed, using the data present
/// at that time. Templates marked `dynamic: true` expand on every resolve and
/// follow changes to their array. `_index_` in the template is replaced with
/// the element's index; nested templates use `_index1_`, `_index2_` and so
/// on.
pub struct TemplatePlugin {
    inner: Rc<TemplateInner>,
}

impl fmt::Debug for TemplatePlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplatePlugin")
            .field("hooks", &self.inner.hooks)
            .finish()
    }
}

impl TemplatePlugin {
    /// Create the plugin; static templates read their arrays from `model`
    pub fn new(model: Rc<dyn DataModel>) -> Self {
        Self {
            inner: Rc::new(TemplateInner {
                model,
                hooks: TemplateHooks::default(),
            }),
        }
    }

    /// Plugin hooks
    pub fn hooks(&self) -> &TemplateHooks {
        &self.inner.hooks
    }
}

impl TemplateInner {
    fn substitutions(
        &self,
        index: usize,
        item: &Value,
        depth: usize,
    ) -> Result<Vec<TemplateSubstitution>, CoreError> {
        let suffix = if depth == 0 { String::new() } else { depth.to_string() };
        let expression = Regex::new(&format!("_index{}_", suffix))
            .map_err(|err| CoreError::TemplateError(err.to_string()))?;

        let base = vec![TemplateSubstitution {
            expression,
            value: index.to_string(),
        }];
        let info = TemplateItemInfo {
            index,
            data: item.clone(),
            depth,
        };

        Ok(self.hooks.resolve_template_substitutions.call(base, &info))
    }

    /// Build the multi-node for `data`, parsing each entry with `parse`
    fn expand(
        &self,
        binding: &Binding,
        data: Value,
        template: &Value,
        depth: usize,
        parse: &dyn Fn(&Value, ParseObjectOptions) -> Result<Option<NodeId>, CoreError>,
    ) -> Result<Option<Node>, CoreError> {
        let items = match data {
            Value::Null | Value::Bool(false) => return Ok(None),
            Value::Array(items) => items,
            _ => {
                return Err(CoreError::TemplateError(format!(
                    "Template using '{}' but is not an array",
                    binding
                )))
            }
        };

        let serialized = serde_json::to_string(template)?;
        let mut values = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let mut expanded = serialized.clone();
            for substitution in self.substitutions(index, item, depth)? {
                expanded = substitution
                    .expression
                    .replace_all(&expanded, NoExpand(&substitution.value))
                    .into_owned();
            }

            let entry: Value = serde_json::from_str(&expanded)?;
            let options = ParseObjectOptions {
                template_depth: depth + 1,
            };
            if let Some(id) = parse(&entry, options)? {
                values.push(id);
            }
        }

        debug!("Expanded template over '{}' into {} entries", binding, values.len());

        Ok(Some(Node::MultiNode {
            values,
            override_existing: false,
        }))
    }
}

impl ViewPlugin for TemplatePlugin {
    fn name(&self) -> &str {
        "template"
    }

    fn apply_parser(&self, parser: &Parser) {
        let inner = Rc::clone(&self.inner);

        parser
            .hooks
            .on_create_ast_node
            .tap(self.name(), move |node, _raw, parser: &Parser| match node {
                Some(Node::Template {
                    data,
                    template,
                    depth,
                    dynamic: false,
                }) => {
                    let items = inner.model.get(&data);
                    let parse = |entry: &Value, options: ParseObjectOptions| {
                        parser.parse_object(entry, NodeType::Value, options)
                    };
                    inner.expand(&data, items, &template, depth, &parse)
                }
                other => Ok(other),
            });
    }

    fn apply_resolver(&self, resolver: &Rc<Resolver>) {
        let inner = Rc::clone(&self.inner);

        resolver
            .hooks
            .before_resolve
            .tap(self.name(), move |node, options| match node {
                Some(Node::Template {
                    data,
                    template,
                    depth,
                    dynamic: true,
                }) => {
                    let items = options.get(&data);
                    let parse = |entry: &Value, parse_options: ParseObjectOptions| {
                        options.parse_node(entry, parse_options)
                    };
                    inner.expand(&data, items, &template, depth, &parse)
                }
                other => Ok(other),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::StringResolverPlugin;
    use crate::BindingExpressionEvaluator;
    use flowview_core::{changed_bindings, LocalModel, ResolverOptions, ViewInstance};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn view(content: Value, model: Rc<LocalModel>) -> ViewInstance {
        ViewInstance::new(
            content,
            ResolverOptions::new(model.clone(), Rc::new(BindingExpressionEvaluator::new())),
        )
        .with_plugin(Rc::new(TemplatePlugin::new(model)))
        .with_plugin(Rc::new(StringResolverPlugin::new()))
    }

    fn set(model: &LocalModel, path: &str, value: Value) -> std::collections::HashSet<Binding> {
        changed_bindings(&model.set(vec![(Binding::parse(path).unwrap(), value)]))
    }

    #[test]
    fn test_static_template_expands_at_parse_time() {
        let model = Rc::new(LocalModel::new(json!({"names": ["Ada", "Grace"]})));
        let view = view(
            json!({
                "id": "view",
                "template": [{
                    "data": "names",
                    "output": "values",
                    "value": {"asset": {"id": "name-_index_", "type": "text", "value": "{{names._index_}}"}}
                }]
            }),
            Rc::clone(&model),
        );

        assert_eq!(
            view.update(None).unwrap().unwrap().to_json(),
            json!({
                "id": "view",
                "values": [
                    {"asset": {"id": "name-0", "type": "text", "value": "Ada"}},
                    {"asset": {"id": "name-1", "type": "text", "value": "Grace"}}
                ]
            })
        );

        // Static templates keep the shape they were parsed with
        let changes = set(&model, "names", json!(["Ada", "Grace", "Katherine"]));
        let values = view.update(Some(changes)).unwrap().unwrap().to_json()["values"].clone();
        assert_eq!(values.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_dynamic_template_follows_data() {
        let model = Rc::new(LocalModel::new(json!({"names": ["Ada"]})));
        let view = view(
            json!({
                "id": "view",
                "template": [{
                    "data": "names",
                    "output": "values",
                    "dynamic": true,
                    "value": "{{names._index_}}"
                }]
            }),
            Rc::clone(&model),
        );

        assert_eq!(
            view.update(None).unwrap().unwrap().to_json(),
            json!({"id": "view", "values": ["Ada"]})
        );

        let changes = set(&model, "names", json!(["Ada", "Grace"]));
        assert_eq!(
            view.update(Some(changes)).unwrap().unwrap().to_json(),
            json!({"id": "view", "values": ["Ada", "Grace"]})
        );

        let changes = set(&model, "names", Value::Null);
        assert_eq!(
            view.update(Some(changes)).unwrap().unwrap().to_json(),
            json!({"id": "view"})
        );
    }

    #[test]
    fn test_templates_append_to_authored_values() {
        let model = Rc::new(LocalModel::new(json!({"extra": ["b"]})));
        let view = view(
            json!({
                "id": "view",
                "values": ["a"],
                "template": [{"data": "extra", "output": "values", "value": "{{extra._index_}}"}]
            }),
            model,
        );

        assert_eq!(
            view.update(None).unwrap().unwrap().to_json(),
            json!({"id": "view", "values": ["a", "b"]})
        );
    }

    #[test]
    fn test_nested_templates_use_depth_placeholders() {
        let model = Rc::new(LocalModel::new(json!({"rows": [{"cells": ["a", "b"]}, {"cells": ["c"]}]})));
        let view = view(
            json!({
                "id": "table",
                "template": [{
                    "data": "rows",
                    "output": "rows",
                    "value": {
                        "id": "row-_index_",
                        "template": [{
                            "data": "rows._index_.cells",
                            "output": "cells",
                            "value": "_index_-_index1_"
                        }]
                    }
                }]
            }),
            model,
        );

        assert_eq!(
            view.update(None).unwrap().unwrap().to_json(),
            json!({
                "id": "table",
                "rows": [
                    {"id": "row-0", "cells": ["0-0", "0-1"]},
                    {"id": "row-1", "cells": ["1-0"]}
                ]
            })
        );
    }

    #[test]
    fn test_custom_substitutions() {
        let model = Rc::new(LocalModel::new(json!({"names": ["Ada"]})));
        let plugin = TemplatePlugin::new(model.clone());
        plugin
            .hooks()
            .resolve_template_substitutions
            .tap("upper", |mut substitutions, info| {
                substitutions.push(TemplateSubstitution {
                    expression: Regex::new("_name_").unwrap(),
                    value: info.data.as_str().unwrap_or_default().to_uppercase(),
                });
                substitutions
            });

        let view = ViewInstance::new(
            json!({
                "id": "view",
                "template": [{"data": "names", "output": "values", "value": "_index_:_name_"}]
            }),
            ResolverOptions::new(model, Rc::new(BindingExpressionEvaluator::new())),
        )
        .with_plugin(Rc::new(plugin))
        .with_plugin(Rc::new(StringResolverPlugin::new()));

        assert_eq!(
            view.update(None).unwrap().unwrap().to_json(),
            json!({"id": "view", "values": ["0:ADA"]})
        );
    }

    #[test]
    fn test_non_array_data_is_a_template_error() {
        let model = Rc::new(LocalModel::new(json!({"names": "Ada"})));
        let view = view(
            json!({
                "id": "view",
                "template": [{"data": "names", "output": "values", "dynamic": true, "value": "x"}]
            }),
            model,
        );

        assert!(matches!(view.update(None), Err(CoreError::TemplateError(_))));
    }
}
